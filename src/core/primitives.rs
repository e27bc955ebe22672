use chrono::{DateTime, Utc};

use crate::error::{PlotError, PlotResult};

pub const SECONDS_PER_DAY: f64 = 86_400.0;

#[must_use]
pub fn datetime_to_unix_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}

/// Converts Unix seconds to a UTC datetime at millisecond precision.
pub fn unix_seconds_to_datetime(seconds: f64) -> PlotResult<DateTime<Utc>> {
    if !seconds.is_finite() {
        return Err(PlotError::InvalidData("timestamp must be finite".to_owned()));
    }
    let millis = (seconds * 1000.0).round();
    if millis > (i64::MAX as f64) || millis < (i64::MIN as f64) {
        return Err(PlotError::InvalidData(format!(
            "timestamp {seconds} is out of range"
        )));
    }
    DateTime::<Utc>::from_timestamp_millis(millis as i64)
        .ok_or_else(|| PlotError::InvalidData(format!("timestamp {seconds} is out of range")))
}
