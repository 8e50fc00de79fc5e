//! Calendar sync orchestration and account linking

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use hearth_common::privacy::redact_email;
use hearth_domain::constants::{APPLE_ACCOUNT_LABEL, GOOGLE_OAUTH_SCOPES};
use hearth_domain::{
    CalendarAccount, CalendarAccountUpsert, CalendarProvider, CredentialUpdate, GoogleConfig,
    HearthError, RefreshedCredentials, Result,
};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::oauth_state::OAuthState;
use super::ports::{
    CalDavPrincipalResolver, CalendarAccountRepository, CalendarEventRepository,
    CalendarProviderAdapter, GoogleOAuthPort, SecretCipher,
};
use crate::sweep::SweepSummary;

const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// What a single account sync did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced { events: usize },
    /// Provider unknown to this build, or no adapter registered for it.
    Skipped,
}

/// Drives provider adapters and commits their results.
///
/// Syncs of one account are serialized through a per-account async mutex;
/// different accounts never contend.
pub struct CalendarSyncService {
    accounts: Arc<dyn CalendarAccountRepository>,
    events: Arc<dyn CalendarEventRepository>,
    cipher: Arc<dyn SecretCipher>,
    adapters: HashMap<CalendarProvider, Arc<dyn CalendarProviderAdapter>>,
    google_oauth: Option<Arc<dyn GoogleOAuthPort>>,
    principal_resolver: Option<Arc<dyn CalDavPrincipalResolver>>,
    google: GoogleConfig,
    account_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl CalendarSyncService {
    pub fn new(
        accounts: Arc<dyn CalendarAccountRepository>,
        events: Arc<dyn CalendarEventRepository>,
        cipher: Arc<dyn SecretCipher>,
    ) -> Self {
        Self {
            accounts,
            events,
            cipher,
            adapters: HashMap::new(),
            google_oauth: None,
            principal_resolver: None,
            google: GoogleConfig::default(),
            account_locks: DashMap::new(),
        }
    }

    /// Register the adapter for its provider, replacing any earlier one.
    pub fn with_adapter(mut self, adapter: Arc<dyn CalendarProviderAdapter>) -> Self {
        self.adapters.insert(adapter.provider(), adapter);
        self
    }

    pub fn with_google(mut self, oauth: Arc<dyn GoogleOAuthPort>, config: GoogleConfig) -> Self {
        self.google_oauth = Some(oauth);
        self.google = config;
        self
    }

    pub fn with_principal_resolver(mut self, resolver: Arc<dyn CalDavPrincipalResolver>) -> Self {
        self.principal_resolver = Some(resolver);
        self
    }

    /// Fetch one account's events and replace the stored set.
    ///
    /// Refreshed credentials reported by the adapter are written before the
    /// event result is inspected, so a failed fetch still keeps them.
    #[instrument(skip(self))]
    pub async fn sync_account(&self, account_id: &str) -> Result<SyncOutcome> {
        let lock = self.account_lock(account_id);
        let _guard = lock.lock().await;

        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| HearthError::NotFound(format!("calendar account {account_id}")))?;

        let Some(provider) = account.provider_kind() else {
            debug!(provider = %account.provider, "Skipping account with unsupported provider");
            return Ok(SyncOutcome::Skipped);
        };
        let Some(adapter) = self.adapters.get(&provider) else {
            debug!(%provider, "No adapter registered, skipping account");
            return Ok(SyncOutcome::Skipped);
        };

        let fetch = adapter.fetch_events(&account).await;

        if let Some(refreshed) = fetch.refreshed {
            self.persist_refreshed(&account, refreshed).await?;
        }

        let events = match fetch.events {
            Ok(events) => events,
            Err(err) => {
                warn!(%provider, error = %err, "Provider fetch failed, stored events untouched");
                return Err(err);
            }
        };

        let stored = self
            .events
            .replace_account_events(
                &account.id,
                &account.user_id,
                provider.into(),
                events,
                Utc::now(),
            )
            .await?;

        info!(%provider, events = stored, "Calendar account synced");
        Ok(SyncOutcome::Synced { events: stored })
    }

    /// Sync every account of one user in order; the first failure aborts.
    #[instrument(skip(self))]
    pub async fn sync_for_user(&self, user_id: &str) -> Result<usize> {
        let accounts = self.accounts.list_for_user(user_id).await?;
        for account in &accounts {
            self.sync_account(&account.id).await?;
        }
        Ok(accounts.len())
    }

    /// Periodic sweep over every account of every owning user.
    ///
    /// Each account is synced on its own; a failure is logged and the sweep
    /// moves on to the next account.
    pub async fn sync_all_users(&self) -> Result<SweepSummary> {
        let user_ids = self.accounts.list_owner_ids().await?;
        let mut summary = SweepSummary::default();

        for user_id in &user_ids {
            let accounts = match self.accounts.list_for_user(user_id).await {
                Ok(accounts) => accounts,
                Err(err) => {
                    warn!(user_id = %user_id, error = %err, "Failed to list calendar accounts");
                    summary.record(false);
                    continue;
                }
            };

            for account in &accounts {
                match self.sync_account(&account.id).await {
                    Ok(_) => summary.record(true),
                    Err(err) => {
                        warn!(
                            user_id = %user_id,
                            account_id = %account.id,
                            error = %err,
                            "Calendar sync failed for account"
                        );
                        summary.record(false);
                    }
                }
            }
        }

        info!(
            users = user_ids.len(),
            accounts = summary.targets,
            failures = summary.failures,
            "Calendar sweep finished"
        );
        Ok(summary)
    }

    /// Google consent URL for `user_id`.
    pub fn google_auth_url(&self, user_id: &str, redirect_uri: &str) -> Result<String> {
        let (client_id, _) = self.google_credentials()?;
        let state = OAuthState::new(user_id, redirect_uri).encode()?;
        let scope = GOOGLE_OAUTH_SCOPES.join(" ");

        let url = Url::parse_with_params(
            GOOGLE_AUTH_ENDPOINT,
            &[
                ("client_id", client_id),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("include_granted_scopes", "true"),
                ("scope", scope.as_str()),
                ("state", state.as_str()),
            ],
        )
        .map_err(|e| HearthError::Internal(format!("failed to build Google auth URL: {e}")))?;

        Ok(url.into())
    }

    pub fn decode_oauth_state(&self, state: &str) -> Result<OAuthState> {
        OAuthState::decode(state)
    }

    /// Complete the Google OAuth flow, store the account and sync it.
    #[instrument(skip(self, code))]
    pub async fn exchange_google_code(
        &self,
        user_id: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<CalendarAccount> {
        self.google_credentials()?;
        let oauth = self.google_oauth.as_ref().ok_or_else(|| {
            HearthError::ConfigurationMissing("Google OAuth client is not configured".into())
        })?;

        let tokens = oauth.exchange_code(code, redirect_uri).await?;
        let access_token = tokens
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| HearthError::Upstream("Google did not return an access token".into()))?;

        let profile = oauth.fetch_profile(&access_token).await?;
        let external_id = profile
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| HearthError::Upstream("unable to resolve Google account id".into()))?;

        let refresh_token_enc =
            tokens.refresh_token.as_deref().map(|t| self.cipher.encrypt(t)).transpose()?;

        let stored = self
            .accounts
            .upsert(CalendarAccountUpsert {
                user_id: user_id.to_string(),
                provider: CalendarProvider::Google,
                external_id,
                label: profile.name.clone().or_else(|| profile.email.clone()),
                email: profile.email,
                access_token_enc: self.cipher.encrypt(&access_token)?,
                refresh_token_enc,
                expires_at: tokens.expires_at,
            })
            .await?;

        info!(account_id = %stored.id, "Google calendar account linked");
        self.sync_account(&stored.id).await?;
        self.reload(stored).await
    }

    /// Link an iCloud calendar with an app-specific password and sync it.
    #[instrument(skip(self, email, app_password))]
    pub async fn connect_apple(
        &self,
        user_id: &str,
        email: &str,
        app_password: &str,
        principal_url: Option<&str>,
    ) -> Result<CalendarAccount> {
        if email.trim().is_empty() || app_password.is_empty() {
            return Err(HearthError::Validation(
                "email and app-specific password are required".into(),
            ));
        }

        let principal = match principal_url.filter(|p| !p.is_empty()) {
            Some(url) => url.to_string(),
            None => {
                let resolver = self.principal_resolver.as_ref().ok_or_else(|| {
                    HearthError::ConfigurationMissing("CalDAV principal resolver".into())
                })?;
                resolver.resolve_principal(email, app_password).await?.ok_or_else(|| {
                    HearthError::Upstream("unable to resolve CalDAV principal URL".into())
                })?
            }
        };

        let stored = self
            .accounts
            .upsert(CalendarAccountUpsert {
                user_id: user_id.to_string(),
                provider: CalendarProvider::Apple,
                external_id: principal,
                email: Some(email.to_string()),
                label: Some(APPLE_ACCOUNT_LABEL.to_string()),
                access_token_enc: self.cipher.encrypt(&format!("{email}:{app_password}"))?,
                refresh_token_enc: None,
                expires_at: None,
            })
            .await?;

        info!(account_id = %stored.id, email = %redact_email(email), "Apple calendar account linked");
        self.sync_account(&stored.id).await?;
        self.reload(stored).await
    }

    pub async fn list_accounts(&self, user_id: &str) -> Result<Vec<CalendarAccount>> {
        self.accounts.list_for_user(user_id).await
    }

    async fn persist_refreshed(
        &self,
        account: &CalendarAccount,
        refreshed: RefreshedCredentials,
    ) -> Result<()> {
        let update = CredentialUpdate {
            access_token_enc: self.cipher.encrypt(&refreshed.access_token)?,
            refresh_token_enc: refreshed
                .refresh_token
                .as_deref()
                .map(|t| self.cipher.encrypt(t))
                .transpose()?,
            expires_at: refreshed.expires_at,
        };
        self.accounts.update_credentials(&account.id, update).await?;
        debug!(account_id = %account.id, "Persisted refreshed credentials");
        Ok(())
    }

    async fn reload(&self, fallback: CalendarAccount) -> Result<CalendarAccount> {
        Ok(self.accounts.find_by_id(&fallback.id).await?.unwrap_or(fallback))
    }

    fn google_credentials(&self) -> Result<(&str, &str)> {
        self.google.credentials().ok_or_else(|| {
            HearthError::ConfigurationMissing("Google OAuth credentials are not configured".into())
        })
    }

    fn account_lock(&self, account_id: &str) -> Arc<Mutex<()>> {
        self.account_locks.entry(account_id.to_string()).or_default().clone()
    }
}
