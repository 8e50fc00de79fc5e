//! Port interfaces for holiday data

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hearth_domain::{Holiday, HolidayUpsert, Result};

/// Holiday as reported by the upstream calendar API, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedHoliday {
    pub name: String,
    /// `date.iso` as sent upstream: a date or a date-time
    pub date_iso: Option<String>,
    pub primary_type: Option<String>,
    pub raw: serde_json::Value,
}

/// Persistence for holidays
#[async_trait]
pub trait HolidayRepository: Send + Sync {
    /// Insert or refresh by `(country_code, date, name)`
    async fn upsert(&self, holiday: HolidayUpsert) -> Result<Holiday>;

    async fn find_by_id(&self, holiday_id: &str) -> Result<Option<Holiday>>;

    /// First holiday of `country_code` with `from <= date < to`
    async fn find_in_range(
        &self,
        country_code: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<Holiday>>;
}

/// National holiday calendar provider
#[async_trait]
pub trait HolidaySource: Send + Sync {
    async fn fetch_holidays(&self, country_code: &str, year: i32) -> Result<Vec<FetchedHoliday>>;
}
