//! Start/stop timing shared by test results and reports

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// A time-boxed record.
///
/// The timer is live until [`Timed::stop`] is called; after that the end time
/// is frozen and later stops are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "TimedRecord")]
pub struct Timed {
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
}

/// Wire form of a [`Timed`]; an end before the start is clamped on load
#[derive(Deserialize)]
struct TimedRecord {
    #[serde(default = "Utc::now")]
    start_time: DateTime<Utc>,
    #[serde(default)]
    end_time: Option<DateTime<Utc>>,
}

impl From<TimedRecord> for Timed {
    fn from(record: TimedRecord) -> Self {
        match record.end_time {
            Some(end_time) => Self::between(record.start_time, end_time),
            None => Self::started_at(record.start_time),
        }
    }
}

impl Timed {
    /// Start a new timer now
    pub fn new() -> Self {
        Self::started_at(Utc::now())
    }

    /// Start a timer at a given instant
    pub fn started_at(start_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            end_time: None,
        }
    }

    /// A finished timer spanning `start_time..end_time`.
    ///
    /// An end before the start is clamped to the start.
    pub fn between(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            end_time: Some(end_time.max(start_time)),
        }
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn is_stopped(&self) -> bool {
        self.end_time.is_some()
    }

    /// Freeze the end time. Only the first call has an effect.
    pub fn stop(&mut self) {
        if self.end_time.is_none() {
            self.end_time = Some(Utc::now().max(self.start_time));
        }
    }

    /// Elapsed time against the end time, or against now while running
    pub fn elapsed(&self) -> chrono::Duration {
        let end = self.end_time.unwrap_or_else(Utc::now);
        (end - self.start_time).max(chrono::Duration::zero())
    }

    /// Human-readable elapsed time, e.g. `45s` or `2m 5s`
    pub fn duration(&self) -> String {
        format_duration(self.elapsed())
    }
}

impl Default for Timed {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for Timed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // duration is ignored on load
        let mut state = serializer.serialize_struct("Timed", 3)?;
        state.serialize_field("start_time", &self.start_time)?;
        state.serialize_field("end_time", &self.end_time)?;
        state.serialize_field("duration", &self.duration())?;
        state.end()
    }
}

/// Format an elapsed time rounded to whole seconds.
///
/// Under a minute this is `"{s}s"`, otherwise `"{m}m {s}s"`.
pub fn format_duration(elapsed: chrono::Duration) -> String {
    let millis = elapsed.num_milliseconds().max(0);
    let total_seconds = (millis + 500) / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;

    if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use test_case::test_case;

    #[test_case(45, "45s")]
    #[test_case(75, "1m 15s")]
    #[test_case(125, "2m 5s")]
    #[test_case(60, "1m 0s")]
    #[test_case(0, "0s")]
    fn test_format_duration(seconds: i64, expected: &str) {
        assert_eq!(format_duration(Duration::seconds(seconds)), expected);
    }

    #[test]
    fn test_format_duration_rounds_to_nearest_second() {
        assert_eq!(format_duration(Duration::milliseconds(1_499)), "1s");
        assert_eq!(format_duration(Duration::milliseconds(1_500)), "2s");
        assert_eq!(format_duration(Duration::milliseconds(59_600)), "1m 0s");
    }

    #[test]
    fn test_live_duration_until_stopped() {
        let timed = Timed::started_at(Utc::now() - Duration::minutes(2));
        assert!(!timed.is_stopped());
        assert_eq!(timed.duration(), "2m 0s");
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut timed = Timed::started_at(Utc::now() - Duration::seconds(10));
        timed.stop();
        let first_end = timed.end_time();
        timed.stop();
        assert_eq!(timed.end_time(), first_end);
        assert!(timed.end_time().unwrap() >= timed.start_time());
    }

    #[test]
    fn test_between_clamps_end_before_start() {
        let start = Utc::now();
        let timed = Timed::between(start, start - Duration::seconds(5));
        assert_eq!(timed.end_time(), Some(start));
        assert_eq!(timed.duration(), "0s");
    }

    #[test]
    fn test_deserialize_clamps_end_before_start() {
        let timed: Timed = serde_json::from_str(
            r#"{"start_time": "2024-01-01T00:01:00Z", "end_time": "2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(timed.end_time(), Some(timed.start_time()));
        assert_eq!(timed.duration(), "0s");
    }

    #[test]
    fn test_serialized_form_carries_duration() {
        let start = Utc::now();
        let timed = Timed::between(start, start + Duration::seconds(75));
        let value = serde_json::to_value(&timed).unwrap();
        assert_eq!(value["duration"], "1m 15s");

        let restored: Timed = serde_json::from_value(value).unwrap();
        assert_eq!(restored, timed);
    }
}
