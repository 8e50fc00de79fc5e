//! Calendar account and event types
//!
//! Accounts hold provider credentials encrypted at rest; events are the
//! normalized occurrences replaced wholesale on every sync.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

use crate::impl_domain_status_conversions;

/// Calendar providers the sync path knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub enum CalendarProvider {
    Google,
    Apple,
}

impl_domain_status_conversions!(CalendarProvider {
    Google => "google",
    Apple => "apple",
});

/// Origin tag stored on every calendar event row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub enum EventSource {
    Google,
    Apple,
    Calendarific,
}

impl_domain_status_conversions!(EventSource {
    Google => "google",
    Apple => "apple",
    Calendarific => "calendarific",
});

impl From<CalendarProvider> for EventSource {
    fn from(provider: CalendarProvider) -> Self {
        match provider {
            CalendarProvider::Google => Self::Google,
            CalendarProvider::Apple => Self::Apple,
        }
    }
}

/// One linked third-party calendar.
///
/// `provider` is kept as stored text so rows written by newer releases (with
/// providers this build does not know) still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct CalendarAccount {
    pub id: String,
    pub user_id: String,
    pub provider: String,
    pub external_id: String,
    pub email: Option<String>,
    pub label: Option<String>,
    #[serde(skip_serializing, default)]
    #[cfg_attr(feature = "ts-gen", ts(skip))]
    pub access_token_enc: String,
    #[serde(skip_serializing, default)]
    #[cfg_attr(feature = "ts-gen", ts(skip))]
    pub refresh_token_enc: Option<String>,
    #[cfg_attr(feature = "ts-gen", ts(type = "string | null"))]
    pub expires_at: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "ts-gen", ts(type = "string | null"))]
    pub last_synced_at: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub updated_at: DateTime<Utc>,
}

impl CalendarAccount {
    /// Parsed provider, `None` for providers this build does not handle.
    pub fn provider_kind(&self) -> Option<CalendarProvider> {
        self.provider.parse().ok()
    }
}

/// Insert-or-update payload keyed by `(provider, external_id)`.
///
/// On update the owner, email, label, access credential and expiry are
/// replaced, `last_synced_at` is cleared, and the refresh credential is only
/// replaced when `refresh_token_enc` is `Some`.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarAccountUpsert {
    pub user_id: String,
    pub provider: CalendarProvider,
    pub external_id: String,
    pub email: Option<String>,
    pub label: Option<String>,
    pub access_token_enc: String,
    pub refresh_token_enc: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Plaintext credentials returned by a provider after a token refresh.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshedCredentials {
    pub access_token: String,
    /// Only present when the provider issued a new refresh token.
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for RefreshedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshedCredentials")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Encrypted credential columns to write back after a refresh.
///
/// `None` fields leave the stored value untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialUpdate {
    pub access_token_enc: String,
    pub refresh_token_enc: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Provider-neutral event produced by a sync adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    pub external_id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub metadata: Option<serde_json::Value>,
}

/// Stored calendar occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export, rename_all = "camelCase"))]
pub struct CalendarEvent {
    pub id: String,
    pub account_id: Option<String>,
    pub user_id: String,
    pub external_id: Option<String>,
    pub holiday_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub starts_at: DateTime<Utc>,
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub ends_at: DateTime<Utc>,
    pub source: String,
    pub is_holiday: bool,
    pub is_meal: bool,
    #[cfg_attr(feature = "ts-gen", ts(type = "unknown"))]
    pub metadata: Option<serde_json::Value>,
}
