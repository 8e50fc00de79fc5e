//! National holiday records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

/// Holiday keyed by `(country_code, date, name)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct Holiday {
    pub id: String,
    pub country_code: String,
    /// Start of the holiday's calendar day in UTC.
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub date: DateTime<Utc>,
    pub name: String,
    #[serde(rename = "type")]
    #[cfg_attr(feature = "ts-gen", ts(rename = "type"))]
    pub holiday_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts-gen", ts(type = "unknown"))]
    pub raw_payload: Option<serde_json::Value>,
}

impl Holiday {
    /// The subset embedded in meal plan payloads.
    pub fn summary(&self) -> HolidaySummary {
        HolidaySummary { id: self.id.clone(), name: self.name.clone(), date: self.date }
    }
}

/// Values written by the holiday sync upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct HolidayUpsert {
    pub country_code: String,
    pub date: DateTime<Utc>,
    pub name: String,
    pub holiday_type: Option<String>,
    pub raw_payload: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct HolidaySummary {
    pub id: String,
    pub name: String,
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub date: DateTime<Utc>,
}
