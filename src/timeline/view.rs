//! Render-ready models for each zoom level. Nothing here touches the network; the
//! controller gathers records and liveness first and hands them in.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, TimeZone};
use derive_new::new;
use itertools::Itertools as _;
use serde::Serialize;

use super::state::{ViewState, ZoomLevel, ROLLING_YEARS};
use crate::model::{BroadcastRecord, Login, StreamerIdentity};
use crate::time::{day_bounds, days_in_month, Timestamp};

pub const MARKER_STEP_HOURS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavControls {
    pub title: String,
    /// The title zooms out when clicked.
    pub zoom_out_enabled: bool,
    pub arrows_visible: bool,
}

impl NavControls {
    pub fn for_state(state: &ViewState) -> Self {
        let anchor = state.anchor;
        let title = match state.zoom {
            ZoomLevel::Year => "Timeline".to_string(),
            ZoomLevel::Month => anchor.format("%Y").to_string(),
            ZoomLevel::Day => anchor.format("%Y-%m").to_string(),
            ZoomLevel::Time => anchor.format("%Y-%m-%d").to_string(),
        };
        let nested = state.zoom != ZoomLevel::Year;

        Self {
            title,
            zoom_out_enabled: nested,
            arrows_visible: nested,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum View {
    Year(YearView),
    Month(MonthView),
    Day(DayView),
    Time(TimeView),
    /// Nothing is tracked, so there is nothing to lay out on the intraday view.
    NoChannels,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearView {
    pub years: Vec<i32>,
}

impl YearView {
    /// The current year and the four before it, newest first.
    pub fn rolling(current_year: i32) -> Self {
        Self {
            years: (0..ROLLING_YEARS).map(|back| current_year - back).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthView {
    pub year: i32,
    /// Broadcast count per month, January first.
    pub activity: [usize; 12],
}

impl MonthView {
    pub fn tally<'a, Tz: TimeZone>(
        year: i32,
        records: impl IntoIterator<Item = &'a BroadcastRecord>,
        zone: &Tz,
    ) -> Self {
        let mut activity = [0; 12];
        for record in records {
            let date = record.local_date(zone);
            if date.year() == year {
                activity[date.month0() as usize] += 1;
            }
        }
        Self { year, activity }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayView {
    pub year: i32,
    pub month: u32,
    /// Empty cells before the 1st in a week that starts on Sunday.
    pub leading_blanks: u32,
    /// Broadcast count per day of the month; index 0 is the 1st.
    pub activity: Vec<usize>,
}

impl DayView {
    pub fn tally<'a, Tz: TimeZone>(
        year: i32,
        month: u32,
        records: impl IntoIterator<Item = &'a BroadcastRecord>,
        zone: &Tz,
    ) -> Self {
        let mut activity = vec![0; days_in_month(year, month) as usize];
        for record in records {
            let date = record.local_date(zone);
            if date.year() == year && date.month() == month {
                if let Some(count) = activity.get_mut(date.day0() as usize) {
                    *count += 1;
                }
            }
        }

        let leading_blanks = NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first| first.weekday().num_days_from_sunday())
            .unwrap_or_default();

        Self {
            year,
            month,
            leading_blanks,
            activity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeView {
    pub date: NaiveDate,
    pub markers: Vec<String>,
    pub rows: Vec<TimelineRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, new)]
pub struct TimelineRow {
    pub identity: StreamerIdentity,
    pub live: bool,
    pub blocks: Vec<BroadcastBlock>,
}

impl TimeView {
    /// Lay out `date` for `streamers`. Rows list live channels first and keep the tracked
    /// order within each group; a streamer without a known identity gets no row.
    pub fn build<'a, Tz: TimeZone>(
        date: NaiveDate,
        streamers: &[Login],
        identity_of: impl Fn(&Login) -> Option<&'a StreamerIdentity>,
        records_of: impl Fn(&Login) -> &'a [BroadcastRecord],
        live: &HashSet<Login>,
        zone: &Tz,
    ) -> Self {
        let (day_start, day_end) = day_bounds(date, zone);

        let (online, offline): (Vec<&Login>, Vec<&Login>) =
            streamers.iter().partition(|login| live.contains(*login));

        let rows = online
            .into_iter()
            .chain(offline)
            .filter_map(|login| {
                let identity = identity_of(login)?.clone();
                let blocks = records_of(login)
                    .iter()
                    .filter(|record| record.local_date(zone) == date)
                    .filter_map(|record| BroadcastBlock::place(record, day_start, day_end))
                    .collect();
                Some(TimelineRow::new(identity, live.contains(login), blocks))
            })
            .collect();

        Self {
            date,
            markers: hour_markers(),
            rows,
        }
    }
}

fn hour_markers() -> Vec<String> {
    (0..24)
        .step_by(MARKER_STEP_HOURS as usize)
        .map(|hour| format!("{hour}:00"))
        .collect_vec()
}

/// A broadcast's horizontal span on a day track, in percent of the day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BroadcastBlock {
    pub record: BroadcastRecord,
    pub left: f64,
    pub width: f64,
}

impl BroadcastBlock {
    /// Clip `record` to the day `[day_start, day_end)`. Returns `None` when nothing of
    /// the broadcast falls inside the day.
    pub fn place(record: &BroadcastRecord, day_start: Timestamp, day_end: Timestamp) -> Option<Self> {
        let length = (day_end - day_start).num_seconds();
        let start = (record.started_at - day_start).num_seconds();
        let end = start.saturating_add(record.duration_seconds);

        let visible = end.min(length) - start.max(0);
        if length <= 0 || visible <= 0 {
            return None;
        }

        let day = length as f64;
        Some(Self {
            record: record.clone(),
            left: start.max(0) as f64 / day * 100.0,
            width: visible as f64 / day * 100.0,
        })
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::FixedOffset;
    use chrono_tz::Europe::Berlin;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn login(name: &str) -> Login {
        name.parse().unwrap()
    }

    fn record(owner: &str, started_at: &str, duration_seconds: i64) -> BroadcastRecord {
        BroadcastRecord::new(
            format!("{owner}-{started_at}"),
            login(owner),
            "stream".to_string(),
            started_at.parse::<Timestamp>().unwrap(),
            duration_seconds,
            "https://www.twitch.tv/videos/1".to_string(),
        )
    }

    fn identity(name: &str) -> StreamerIdentity {
        StreamerIdentity::new(format!("id-{name}"), login(name), name.to_uppercase())
    }

    #[test]
    fn titles_and_controls_follow_zoom() {
        let mut state = ViewState::new(date(2024, 3, 5));
        assert_eq!(NavControls::for_state(&state).title, "2024-03-05");

        state.zoom = ZoomLevel::Day;
        assert_eq!(NavControls::for_state(&state).title, "2024-03");

        state.zoom = ZoomLevel::Month;
        assert_eq!(NavControls::for_state(&state).title, "2024");
        assert!(NavControls::for_state(&state).arrows_visible);

        state.zoom = ZoomLevel::Year;
        let controls = NavControls::for_state(&state);
        assert_eq!(controls.title, "Timeline");
        assert!(!controls.zoom_out_enabled);
        assert!(!controls.arrows_visible);
    }

    #[test]
    fn rolling_window_ends_at_current_year() {
        assert_eq!(YearView::rolling(2025).years, vec![2025, 2024, 2023, 2022, 2021]);
    }

    #[test]
    fn month_and_day_activity() {
        let records = [
            record("a", "2024-03-05T10:00:00Z", 3600),
            record("a", "2024-03-05T20:00:00Z", 3600),
            record("b", "2024-03-31T10:00:00Z", 3600),
            record("b", "2024-11-01T10:00:00Z", 3600),
            record("b", "2023-03-05T10:00:00Z", 3600),
        ];

        let months = MonthView::tally(2024, &records, &utc());
        assert_eq!(months.activity[2], 3);
        assert_eq!(months.activity[10], 1);
        assert_eq!(months.activity.iter().sum::<usize>(), 4);

        let days = DayView::tally(2024, 3, &records, &utc());
        assert_eq!(days.activity.len(), 31);
        assert_eq!(days.activity[4], 2);
        assert_eq!(days.activity[30], 1);
        // 2024-03-01 was a Friday.
        assert_eq!(days.leading_blanks, 5);
    }

    #[test]
    fn late_broadcast_is_clipped_at_midnight() {
        let late = record("a", "2024-03-05T23:00:00Z", 3 * 3600);
        let (start, end) = day_bounds(date(2024, 3, 5), &utc());
        let block = BroadcastBlock::place(&late, start, end).unwrap();

        assert!((block.left - 95.833).abs() < 0.01);
        assert!((block.right() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn broadcast_from_previous_day_starts_at_zero() {
        let overnight = record("a", "2024-03-04T22:00:00Z", 4 * 3600);
        let (start, end) = day_bounds(date(2024, 3, 5), &utc());
        let block = BroadcastBlock::place(&overnight, start, end).unwrap();

        assert_eq!(block.left, 0.0);
        assert!((block.width - 2.0 / 24.0 * 100.0).abs() < 1e-9);

        let earlier = record("a", "2024-03-03T10:00:00Z", 3600);
        assert!(BroadcastBlock::place(&earlier, start, end).is_none());
    }

    #[test]
    fn summer_evening_counts_toward_the_next_local_day() {
        let records = [record("a", "2024-07-01T22:30:00Z", 3600)];

        let days = DayView::tally(2024, 7, &records, &Berlin);
        assert_eq!(days.activity[0], 0);
        assert_eq!(days.activity[1], 1);

        let winter_offset = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(DayView::tally(2024, 7, &records, &winter_offset).activity[0], 1);
    }

    #[test]
    fn short_day_spreads_blocks_over_23_hours() {
        // Berlin springs forward on 2024-03-31; the local day runs 23 hours.
        let (start, end) = day_bounds(date(2024, 3, 31), &Berlin);
        let evening = record("a", "2024-03-31T20:00:00Z", 4 * 3600);
        let block = BroadcastBlock::place(&evening, start, end).unwrap();

        assert!((block.left - 21.0 / 23.0 * 100.0).abs() < 1e-9);
        assert!((block.right() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn endless_broadcast_is_clipped_without_overflow() {
        let (start, end) = day_bounds(date(2024, 3, 5), &utc());
        let endless = record("a", "2024-03-05T12:00:00Z", i64::MAX);
        let block = BroadcastBlock::place(&endless, start, end).unwrap();

        assert!((block.left - 50.0).abs() < 1e-9);
        assert!((block.right() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn live_streamers_come_first_in_tracked_order() {
        let streamers = [login("a"), login("b"), login("c"), login("d"), login("e")];
        let identities: HashMap<Login, StreamerIdentity> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|name| (login(name), identity(name)))
            .collect();
        let records: HashMap<Login, Vec<BroadcastRecord>> = HashMap::from([(
            login("c"),
            vec![
                record("c", "2024-03-05T12:00:00Z", 3600),
                record("c", "2024-03-06T12:00:00Z", 3600),
            ],
        )]);
        let live: HashSet<Login> = [login("d"), login("b"), login("e")].into_iter().collect();

        let view = TimeView::build(
            date(2024, 3, 5),
            &streamers,
            |login| identities.get(login),
            |login| records.get(login).map(Vec::as_slice).unwrap_or_default(),
            &live,
            &utc(),
        );

        let order: Vec<&str> = view.rows.iter().map(|row| row.identity.login.as_str()).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
        assert!(view.rows[0].live && !view.rows[2].live);
        assert_eq!(view.rows[3].blocks.len(), 1);
        assert_eq!(view.markers, vec!["0:00", "3:00", "6:00", "9:00", "12:00", "15:00", "18:00", "21:00"]);
    }
}
