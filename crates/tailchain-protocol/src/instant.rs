use chrono::{DateTime, Utc};

use crate::error::{ProtocolError, ProtocolResult};

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// Encode as `<unix-seconds>:<nanoseconds>`.
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    format!("{}:{}", instant.timestamp(), instant.timestamp_subsec_nanos())
}

/// Decode `<unix-seconds>:<nanoseconds>`. The nanosecond part must be below
/// one second.
pub fn parse_instant(s: &str) -> ProtocolResult<DateTime<Utc>> {
    let invalid = || ProtocolError::InvalidInstant(s.to_string());
    let (secs, nanos) = s.split_once(':').ok_or_else(invalid)?;
    let secs: i64 = secs.parse().map_err(|_| invalid())?;
    let nanos: u32 = nanos.parse().map_err(|_| invalid())?;
    if nanos >= NANOS_PER_SEC {
        return Err(invalid());
    }
    DateTime::from_timestamp(secs, nanos).ok_or_else(invalid)
}
