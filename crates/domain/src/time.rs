//! Time and timestamp helpers.

use chrono::{DateTime, Local, Utc};

/// UTC timestamp attached to emitted events.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Render a timestamp in local time, `en-US` style (`10/18/2026, 3:04:05 PM`).
///
/// Used as the description of events that are emitted without one.
#[must_use]
pub fn local_display(ts: Timestamp) -> String {
    ts.with_timezone(&Local)
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}
