//! Port interfaces for calendar sync
//!
//! These traits define the boundaries between the sync orchestrator and the
//! storage, provider and credential implementations in the infra layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hearth_domain::{
    CalendarAccount, CalendarAccountUpsert, CalendarEvent, CalendarProvider, CredentialUpdate,
    EventSource, Holiday, NormalizedEvent, RefreshedCredentials, Result,
};

/// Persistence for linked calendar accounts
#[async_trait]
pub trait CalendarAccountRepository: Send + Sync {
    async fn find_by_id(&self, account_id: &str) -> Result<Option<CalendarAccount>>;

    /// Accounts owned by `user_id`, oldest first
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<CalendarAccount>>;

    /// Distinct ids of users owning at least one account
    async fn list_owner_ids(&self) -> Result<Vec<String>>;

    /// Insert or update by `(provider, external_id)`
    async fn upsert(&self, account: CalendarAccountUpsert) -> Result<CalendarAccount>;

    async fn update_credentials(&self, account_id: &str, update: CredentialUpdate) -> Result<()>;
}

/// Persistence for calendar events
#[async_trait]
pub trait CalendarEventRepository: Send + Sync {
    /// Replace every non-meal event of the account and stamp
    /// `last_synced_at`, all in one transaction. Returns the inserted count.
    async fn replace_account_events(
        &self,
        account_id: &str,
        user_id: &str,
        source: EventSource,
        events: Vec<NormalizedEvent>,
        synced_at: DateTime<Utc>,
    ) -> Result<usize>;

    /// Replace the user's holiday events starting in `[from, to)` with one
    /// all-day event per holiday, in one transaction.
    async fn replace_holiday_events(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        holidays: Vec<Holiday>,
    ) -> Result<usize>;

    async fn list_for_account(&self, account_id: &str) -> Result<Vec<CalendarEvent>>;

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<CalendarEvent>>;
}

/// Result of one provider fetch.
///
/// `refreshed` is populated whenever the adapter obtained new credentials,
/// even if fetching events afterwards failed.
#[derive(Debug)]
pub struct ProviderFetch {
    pub events: Result<Vec<NormalizedEvent>>,
    pub refreshed: Option<RefreshedCredentials>,
}

impl ProviderFetch {
    pub fn ok(events: Vec<NormalizedEvent>) -> Self {
        Self { events: Ok(events), refreshed: None }
    }

    pub fn failed(error: hearth_domain::HearthError) -> Self {
        Self { events: Err(error), refreshed: None }
    }

    pub fn with_refreshed(mut self, refreshed: Option<RefreshedCredentials>) -> Self {
        self.refreshed = refreshed;
        self
    }
}

/// Fetches and normalizes one provider's events for an account
#[async_trait]
pub trait CalendarProviderAdapter: Send + Sync {
    fn provider(&self) -> CalendarProvider;

    async fn fetch_events(&self, account: &CalendarAccount) -> ProviderFetch;
}

/// Tokens returned by the Google authorization-code exchange
#[derive(Clone, Default, PartialEq, Eq)]
pub struct GoogleTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for GoogleTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTokens")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoogleProfile {
    pub id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Google OAuth token endpoint and userinfo access
#[async_trait]
pub trait GoogleOAuthPort: Send + Sync {
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<GoogleTokens>;

    async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile>;
}

/// Discovers the CalDAV principal URL for a set of credentials
#[async_trait]
pub trait CalDavPrincipalResolver: Send + Sync {
    async fn resolve_principal(&self, username: &str, password: &str) -> Result<Option<String>>;
}

/// Encryption of credentials stored at rest
pub trait SecretCipher: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String>;

    fn decrypt(&self, token: &str) -> Result<String>;
}
