//! Configuration management
//!
//! Third-party keys are optional here; services report
//! [`HearthError::ConfigurationMissing`](crate::HearthError::ConfigurationMissing)
//! when an operation needs one that is absent.

use serde::{Deserialize, Serialize};

use crate::constants::ICLOUD_CALDAV_ENDPOINT;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub google: GoogleConfig,
    pub apple: AppleConfig,
    pub spoonacular: SpoonacularConfig,
    pub calendarific: CalendarificConfig,
    pub http: HttpConfig,
    pub scheduler: SchedulerConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "hearth.db".to_string(), pool_size: 8 }
    }
}

/// Secret used to derive the credential encryption key.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub token_encryption_key: Option<String>,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("token_encryption_key", &self.token_encryption_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Google OAuth client registration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_id: Option<String>,
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
}

impl GoogleConfig {
    /// Client id and secret, when both are configured and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let id = self.client_id.as_deref().filter(|v| !v.is_empty())?;
        let secret = self.client_secret.as_deref().filter(|v| !v.is_empty())?;
        Some((id, secret))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppleConfig {
    pub caldav_endpoint: String,
}

impl Default for AppleConfig {
    fn default() -> Self {
        Self { caldav_endpoint: ICLOUD_CALDAV_ENDPOINT.to_string() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpoonacularConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarificConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

/// Outbound HTTP settings shared by every integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30, user_agent: format!("hearth/{}", env!("CARGO_PKG_VERSION")) }
    }
}

/// Cron expressions use six fields, seconds first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub calendar_sweep_cron: String,
    pub holiday_sync_cron: String,
    pub meal_prefetch_cron: String,
    pub reminder_scan_cron: String,
    pub job_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            calendar_sweep_cron: "0 0 * * * *".to_string(),
            holiday_sync_cron: "0 15 2 * * *".to_string(),
            meal_prefetch_cron: "0 0 5 * * *".to_string(),
            reminder_scan_cron: "0 * * * * *".to_string(),
            job_timeout_secs: 300,
        }
    }
}
