//! Time and timestamp utilities

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};

use crate::types::Timestamp;

/// Calendar day (UTC) a timestamp falls on
pub fn day_of(ts: Timestamp) -> NaiveDate {
    ts.date_naive()
}

/// Truncate a timestamp to midnight UTC of the same day
pub fn truncate_to_day(ts: Timestamp) -> Timestamp {
    day_of(ts).and_time(NaiveTime::MIN).and_utc()
}

/// Shift a timestamp by `delta`, clamping to the representable range
pub fn saturating_add(ts: Timestamp, delta: TimeDelta) -> Timestamp {
    ts.checked_add_signed(delta).unwrap_or(if delta < TimeDelta::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// Serialize a `TimeDelta` as integer milliseconds
pub mod millis {
    use chrono::TimeDelta;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(duration.num_milliseconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let ms = i64::deserialize(deserializer)?;
        TimeDelta::try_milliseconds(ms)
            .ok_or_else(|| de::Error::custom(format!("duration of {ms} ms is out of range")))
    }
}

/// Build a `TimeDelta` from milliseconds, saturating at the representable range
pub fn delta_from_millis(ms: i64) -> TimeDelta {
    TimeDelta::try_milliseconds(ms).unwrap_or(if ms < 0 { TimeDelta::MIN } else { TimeDelta::MAX })
}
