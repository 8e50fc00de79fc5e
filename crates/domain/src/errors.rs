//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Hearth
///
/// Callers receive the kind and the message; nothing in the core retries on
/// any of these.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum HearthError {
    /// A required external credential or API key is not configured.
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Configuration is present but malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// An encrypted secret could not be decoded.
    #[error("Invalid encrypted payload: {0}")]
    InvalidPayload(String),

    /// An encrypted secret failed tag verification.
    #[error("Authentication failure: {0}")]
    AuthenticationFailure(String),

    /// A third-party API or CalDAV call failed, including non-2xx responses.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// Caller-supplied identifiers or payload fields are missing.
    #[error("Validation failure: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HearthError {
    /// Stable, lower-case label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing(_) => "configuration_missing",
            Self::Config(_) => "config",
            Self::NotFound(_) => "not_found",
            Self::InvalidPayload(_) => "invalid_payload",
            Self::AuthenticationFailure(_) => "authentication_failure",
            Self::Upstream(_) => "upstream",
            Self::Validation(_) => "validation",
            Self::Database(_) => "database",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for Hearth operations
pub type Result<T> = std::result::Result<T, HearthError>;
