//! Calendarific national holiday client

use async_trait::async_trait;
use hearth_core::holiday::ports::{FetchedHoliday, HolidaySource};
use hearth_domain::{CalendarificConfig, HearthError, Result};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::http::HttpClient;

const CALENDARIFIC_URL: &str = "https://calendarific.com/api/v2/holidays";

pub struct CalendarificClient {
    http: HttpClient,
    api_key: Option<String>,
    url: String,
}

impl CalendarificClient {
    pub fn new(http: HttpClient, config: &CalendarificConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            url: CALENDARIFIC_URL.to_string(),
        }
    }

    /// Full URL of the holidays endpoint.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl HolidaySource for CalendarificClient {
    #[instrument(skip(self))]
    async fn fetch_holidays(&self, country_code: &str, year: i32) -> Result<Vec<FetchedHoliday>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| HearthError::ConfigurationMissing("CALENDARIFIC_API_KEY".into()))?;

        let year = year.to_string();
        let request = self.http.request(Method::GET, &self.url).query(&[
            ("api_key", api_key),
            ("country", country_code),
            ("year", year.as_str()),
            ("type", "national"),
        ]);

        let body: HolidaysEnvelope = self.http.json(request, "Calendarific holidays").await?;
        let raw = body
            .response
            .as_ref()
            .and_then(|r| r.get("holidays"))
            .and_then(serde_json::Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut holidays = Vec::with_capacity(raw.len());
        for value in raw {
            match parse_holiday(value) {
                Some(holiday) => holidays.push(holiday),
                None => warn!("Skipping Calendarific holiday without a name"),
            }
        }

        debug!(count = holidays.len(), "Fetched holidays");
        Ok(holidays)
    }
}

fn parse_holiday(raw: serde_json::Value) -> Option<FetchedHoliday> {
    let item = HolidayItem::deserialize(&raw).ok()?;
    let name = item.name.filter(|n| !n.trim().is_empty())?;
    Some(FetchedHoliday {
        name,
        date_iso: item.date.and_then(|d| d.iso),
        primary_type: item.kind.and_then(|t| t.into_iter().next()),
        raw,
    })
}

/// `response` is an empty array rather than an object for some countries.
#[derive(Debug, Deserialize)]
struct HolidaysEnvelope {
    response: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct HolidayItem {
    name: Option<String>,
    date: Option<HolidayDate>,
    #[serde(rename = "type")]
    kind: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct HolidayDate {
    iso: Option<String>,
}
