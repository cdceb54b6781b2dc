use chrono::{DateTime, Utc};

/// Record of study activity at a point in time.
///
/// The streak calculator treats any number of logs on one calendar day as a
/// single unit, so the timestamp's time-of-day only matters for day bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityLog {
    pub occurred_at: DateTime<Utc>,
}

impl ActivityLog {
    #[must_use]
    pub fn new(occurred_at: DateTime<Utc>) -> Self {
        Self { occurred_at }
    }
}
