//! Calendar integration commands

use hearth_common::redact_email;
use hearth_core::SyncOutcome;
use hearth_domain::{CalendarAccount, CalendarEvent, HearthError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::required;
use crate::utils::command_helpers::execute_command;
use crate::AppContext;

/// Credentials for linking an iCloud calendar.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectAppleRequest {
    pub email: String,
    pub app_password: String,
    /// Skips CalDAV discovery when already known.
    #[serde(default)]
    pub principal_url: Option<String>,
}

/// Outcome of a single account sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSyncResult {
    /// `false` when no adapter handles the account's provider.
    pub synced: bool,
    pub events: usize,
}

impl From<SyncOutcome> for AccountSyncResult {
    fn from(outcome: SyncOutcome) -> Self {
        match outcome {
            SyncOutcome::Synced { events } => Self { synced: true, events },
            SyncOutcome::Skipped => Self { synced: false, events: 0 },
        }
    }
}

/// Google consent URL; `redirect_uri` falls back to the configured one.
pub async fn google_auth_url(
    ctx: &AppContext,
    user_id: &str,
    redirect_uri: Option<&str>,
) -> Result<String> {
    execute_command("calendar::google_auth_url", || async {
        let user_id = required("userId", user_id)?;
        let redirect_uri = redirect_uri
            .filter(|uri| !uri.trim().is_empty())
            .or(ctx.config.google.redirect_uri.as_deref())
            .ok_or_else(|| HearthError::Validation("redirectUri is required".into()))?;

        ctx.calendar.google_auth_url(user_id, redirect_uri)
    })
    .await
}

/// Finish the Google OAuth redirect: the `state` carries the user and the
/// redirect URI the consent screen was opened with.
pub async fn complete_google_oauth(
    ctx: &AppContext,
    state: &str,
    code: &str,
) -> Result<CalendarAccount> {
    execute_command("calendar::complete_google_oauth", || async {
        let code = required("code", code)?;
        let state = ctx.calendar.decode_oauth_state(required("state", state)?)?;

        ctx.calendar.exchange_google_code(&state.user_id, code, &state.redirect_uri).await
    })
    .await
}

pub async fn connect_apple_calendar(
    ctx: &AppContext,
    user_id: &str,
    request: ConnectAppleRequest,
) -> Result<CalendarAccount> {
    execute_command("calendar::connect_apple_calendar", || async {
        let user_id = required("userId", user_id)?;
        info!(user_id, email = %redact_email(&request.email), "Connecting Apple calendar");

        ctx.calendar
            .connect_apple(
                user_id,
                &request.email,
                &request.app_password,
                request.principal_url.as_deref(),
            )
            .await
    })
    .await
}

pub async fn list_calendar_accounts(
    ctx: &AppContext,
    user_id: &str,
) -> Result<Vec<CalendarAccount>> {
    execute_command("calendar::list_calendar_accounts", || async {
        ctx.calendar.list_accounts(required("userId", user_id)?).await
    })
    .await
}

pub async fn sync_calendar_account(
    ctx: &AppContext,
    account_id: &str,
) -> Result<AccountSyncResult> {
    execute_command("calendar::sync_calendar_account", || async {
        let outcome = ctx.calendar.sync_account(required("accountId", account_id)?).await?;
        Ok(outcome.into())
    })
    .await
}

/// Sync every account of the user; returns how many were attempted.
pub async fn sync_user_calendars(ctx: &AppContext, user_id: &str) -> Result<usize> {
    execute_command("calendar::sync_user_calendars", || async {
        ctx.calendar.sync_for_user(required("userId", user_id)?).await
    })
    .await
}

pub async fn list_calendar_events(ctx: &AppContext, user_id: &str) -> Result<Vec<CalendarEvent>> {
    use hearth_core::CalendarEventRepository;

    execute_command("calendar::list_calendar_events", || async {
        ctx.calendar_events.list_for_user(required("userId", user_id)?).await
    })
    .await
}
