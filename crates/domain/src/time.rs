//! Wall-clock timestamps for reports.
//!
//! Effect timing itself runs on the monotonic clock of the async runtime;
//! these are only what gets printed.

use chrono::{DateTime, Utc};

/// UTC timestamp used for `started_at` and `finished_at` on reports.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}
