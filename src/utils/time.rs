use chrono::{DateTime, Utc};

/// Timestamp assigned to records at creation time.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}
