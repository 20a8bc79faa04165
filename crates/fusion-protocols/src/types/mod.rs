//! View-model records delivered by REST snapshots and patched by live events.

mod advisor;
mod chat;
mod hint;

pub use advisor::*;
pub use chat::*;
pub use hint::*;

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a backend timestamp.
///
/// Accepts RFC 3339 and naive ISO-8601 (assumed UTC), which is what the
/// backend emits for records stored without an offset.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
