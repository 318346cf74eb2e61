//! Timestamp helpers. All persisted timestamps are ISO-8601 UTC strings.

use chrono::Utc;

/// Returns the current instant formatted as an ISO-8601 UTC timestamp.
#[must_use]
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339()
}
