//! Millisecond timestamps
//!
//! Every timestamp in the core is Unix epoch milliseconds held in an `i64`.

use chrono::Utc;

/// Unix epoch milliseconds
pub type TimestampMs = i64;

/// Current wall-clock time in Unix milliseconds
pub fn now_millis() -> TimestampMs {
    Utc::now().timestamp_millis()
}
