use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    /// In mutez.
    pub amount: i64,
    pub delegator: String,
    pub block: String,
}

/// Read-side page request. `year` narrows results to that calendar year in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelegationQuery {
    pub limit: i64,
    pub offset: i64,
    pub year: Option<i32>,
}

impl DelegationQuery {
    /// Half-open `[start, end)` bounds for the requested year.
    pub fn time_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let year = self.year?;
        let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()?;
        let end = Utc.with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0).single()?;
        Some((start, end))
    }
}
