use chrono::{Duration, NaiveDate, TimeZone};

use super::*;
use crate::time::local_date;

/// A past broadcast (VOD).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct BroadcastRecord {
    pub id: String,
    pub owner: Login,
    pub title: String,
    pub started_at: Timestamp,
    pub duration_seconds: i64,
    pub url: String,
}

impl BroadcastRecord {
    pub fn from_video(video: HelixVideo) -> Option<Self> {
        let Ok(owner) = video.user_login.parse() else {
            tracing::warn!(video.id = %video.id, login = %video.user_login, "skipping video with an invalid owner login");
            return None;
        };

        let Some(duration_seconds) = parse_duration(&video.duration) else {
            tracing::warn!(video.id = %video.id, duration = %video.duration, "skipping video with an unreadable duration");
            return None;
        };

        let record = Self {
            id: video.id,
            owner,
            title: video.title,
            started_at: video.created_at,
            duration_seconds,
            url: video.url,
        };

        if record.ended_at().is_none() {
            tracing::warn!(video.id = %record.id, duration = %video.duration, "skipping video that ends out of range");
            return None;
        }

        Some(record)
    }

    /// `None` when the end does not fit in a timestamp.
    pub fn ended_at(&self) -> Option<Timestamp> {
        Duration::try_seconds(self.duration_seconds)
            .and_then(|duration| self.started_at.checked_add_signed(duration))
    }

    /// The calendar day the broadcast started on in `zone`.
    pub fn local_date<Tz: TimeZone>(&self, zone: &Tz) -> NaiveDate {
        local_date(self.started_at, zone)
    }
}

/// Parse a compact duration such as `3h2m1s`, `45m` or `12s` into seconds.
pub fn parse_duration(text: &str) -> Option<i64> {
    let mut total = 0i64;
    let mut digits = String::new();

    for c in text.trim().chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        let unit = match c {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return None,
        };

        let value: i64 = digits.parse().ok()?;
        total = value.checked_mul(unit)?.checked_add(total)?;
        digits.clear();
    }

    if !digits.is_empty() {
        return None;
    }

    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_duration() {
        assert_eq!(parse_duration("3h2m1s"), Some(3 * 3600 + 2 * 60 + 1));
    }

    #[test]
    fn parse_partial_durations() {
        assert_eq!(parse_duration("45m"), Some(2700));
        assert_eq!(parse_duration("12s"), Some(12));
        assert_eq!(parse_duration("1h"), Some(3600));
    }

    #[test]
    fn reject_garbage_duration() {
        assert_eq!(parse_duration("12"), None);
        assert_eq!(parse_duration("1d"), None);
        assert_eq!(parse_duration("h"), None);
    }

    #[test]
    fn oversized_duration_is_unreadable() {
        assert_eq!(parse_duration("9999999999999999h"), None);
        assert_eq!(parse_duration("99999999999999999999s"), None);
        assert_eq!(parse_duration("9223372036854775807s1s"), None);
    }

    #[test]
    fn video_ending_out_of_range_is_skipped() {
        let video = HelixVideo::new(
            "v2".into(),
            "streamer".into(),
            "forever".into(),
            "2024-03-05T23:00:00Z".parse().unwrap(),
            "2562047788015215h".into(),
            "https://www.twitch.tv/videos/v2".into(),
        );

        assert!(BroadcastRecord::from_video(video).is_none());
    }

    #[test]
    fn record_from_video() {
        let video = HelixVideo::new(
            "v1".into(),
            "Streamer".into(),
            "late night".into(),
            "2024-03-05T23:00:00Z".parse().unwrap(),
            "3h".into(),
            "https://www.twitch.tv/videos/v1".into(),
        );

        let record = BroadcastRecord::from_video(video).unwrap();
        assert_eq!(record.owner.as_str(), "streamer");
        assert_eq!(record.ended_at().unwrap().to_rfc3339(), "2024-03-06T02:00:00+00:00");
    }
}
