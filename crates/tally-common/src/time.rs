use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Milliseconds since the Unix epoch, the resolution exposition formats carry.
pub fn unix_millis(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}
