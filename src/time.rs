use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

pub type Timestamp = DateTime<Utc>;

/// Source of the current instant. Services never call [Utc::now] directly so tests can
/// move time by hand.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = first.and_then(|date| date.checked_add_months(Months::new(1)));

    match (first, next) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 0,
    }
}

/// Move `date` by `months`, clamping the day to the last day of the target month.
pub fn add_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let delta = Months::new(months.unsigned_abs());
    if months >= 0 {
        date.checked_add_months(delta)
    } else {
        date.checked_sub_months(delta)
    }
}

pub fn with_year(date: NaiveDate, year: i32) -> Option<NaiveDate> {
    let day = date.day().min(days_in_month(year, date.month()));
    NaiveDate::from_ymd_opt(year, date.month(), day)
}

pub fn with_month(date: NaiveDate, month: u32) -> Option<NaiveDate> {
    let day = date.day().min(days_in_month(date.year(), month));
    NaiveDate::from_ymd_opt(date.year(), month, day)
}

/// The calendar day `timestamp` falls on in `zone`, using the offset in force at that
/// instant.
pub fn local_date<Tz: TimeZone>(timestamp: Timestamp, zone: &Tz) -> NaiveDate {
    timestamp.with_timezone(zone).date_naive()
}

/// The first instant of `date` in `zone`.
pub fn start_of_day<Tz: TimeZone>(date: NaiveDate, zone: &Tz) -> Timestamp {
    let midnight = date.and_time(NaiveTime::MIN);
    match zone.from_local_datetime(&midnight).earliest() {
        Some(start) => start.with_timezone(&Utc),
        // Midnight fell into a forward shift; the day starts where the gap ends.
        None => {
            let offset = zone.offset_from_utc_datetime(&midnight).fix();
            (midnight - Duration::seconds(offset.local_minus_utc() as i64)).and_utc()
        }
    }
}

/// `[start, end)` of `date` in `zone`. Days around a clock change are shorter or longer
/// than 24 hours.
pub fn day_bounds<Tz: TimeZone>(date: NaiveDate, zone: &Tz) -> (Timestamp, Timestamp) {
    let start = start_of_day(date, zone);
    let end = date
        .checked_add_days(Days::new(1))
        .map(|next| start_of_day(next, zone))
        .unwrap_or(start + Duration::days(1));
    (start, end)
}

#[cfg(test)]
pub use manual::ManualClock;


#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use chrono_tz::America::Santiago;
    use chrono_tz::Europe::Berlin;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2023, 12), 31);
        assert_eq!(days_in_month(2023, 4), 30);
    }

    #[test]
    fn month_arithmetic_clamps_to_month_end() {
        assert_eq!(add_months(date(2024, 1, 31), 1), Some(date(2024, 2, 29)));
        assert_eq!(add_months(date(2024, 3, 31), -1), Some(date(2024, 2, 29)));
        assert_eq!(add_months(date(2024, 12, 15), 1), Some(date(2025, 1, 15)));
    }

    #[test]
    fn leap_day_survives_year_change_by_clamping() {
        assert_eq!(with_year(date(2024, 2, 29), 2023), Some(date(2023, 2, 28)));
        assert_eq!(with_month(date(2024, 5, 31), 6), Some(date(2024, 6, 30)));
    }

    fn at(text: &str) -> Timestamp {
        text.parse().unwrap()
    }

    #[test]
    fn local_midnight_respects_offset() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let start = start_of_day(date(2024, 3, 5), &tokyo);
        assert_eq!(start.to_rfc3339(), "2024-03-04T15:00:00+00:00");
        assert_eq!(local_date(start, &tokyo), date(2024, 3, 5));
    }

    #[test]
    fn summer_time_moves_late_evenings_to_the_next_day() {
        let late = at("2024-07-01T22:30:00Z");

        // A winter-time offset would keep this on July 1st.
        let winter = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(local_date(late, &winter), date(2024, 7, 1));
        assert_eq!(local_date(late, &Berlin), date(2024, 7, 2));
        assert_eq!(local_date(at("2024-01-15T22:30:00Z"), &Berlin), date(2024, 1, 15));
    }

    #[test]
    fn clock_change_days_are_not_24_hours() {
        let (start, end) = day_bounds(date(2024, 3, 31), &Berlin);
        assert_eq!(start, at("2024-03-30T23:00:00Z"));
        assert_eq!(end, at("2024-03-31T22:00:00Z"));

        let (start, end) = day_bounds(date(2024, 10, 27), &Berlin);
        assert_eq!(start, at("2024-10-26T22:00:00Z"));
        assert_eq!((end - start).num_hours(), 25);
    }

    #[test]
    fn day_starting_inside_a_gap_begins_after_it() {
        // Santiago skipped from 00:00 to 01:00 on 2024-09-08.
        let start = start_of_day(date(2024, 9, 8), &Santiago);
        assert_eq!(start, at("2024-09-08T04:00:00Z"));
    }
}
