use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use hearth_core::{
    CalDavPrincipalResolver, CalendarAccountRepository, CalendarEventRepository,
    CalendarProviderAdapter, GoogleOAuthPort, GoogleProfile, GoogleTokens, ProviderFetch,
    SecretCipher,
};
use hearth_domain::{
    CalendarAccount, CalendarAccountUpsert, CalendarEvent, CalendarProvider, CredentialUpdate,
    EventSource, HearthError, Holiday, NormalizedEvent, Result as DomainResult,
};

/// In-memory `CalendarAccountRepository` with the `(provider, external_id)`
/// uniqueness rule.
#[derive(Default, Clone)]
pub struct MockAccountRepository {
    accounts: Arc<Mutex<Vec<CalendarAccount>>>,
}

impl MockAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, account: CalendarAccount) -> Self {
        self.accounts.lock().unwrap().push(account);
        self
    }

    pub fn all(&self) -> Vec<CalendarAccount> {
        self.accounts.lock().unwrap().clone()
    }

    pub fn get(&self, account_id: &str) -> Option<CalendarAccount> {
        self.accounts.lock().unwrap().iter().find(|a| a.id == account_id).cloned()
    }

    pub fn mark_synced(&self, account_id: &str, at: DateTime<Utc>) {
        if let Some(account) =
            self.accounts.lock().unwrap().iter_mut().find(|a| a.id == account_id)
        {
            account.last_synced_at = Some(at);
        }
    }
}

#[async_trait]
impl CalendarAccountRepository for MockAccountRepository {
    async fn find_by_id(&self, account_id: &str) -> DomainResult<Option<CalendarAccount>> {
        Ok(self.get(account_id))
    }

    async fn list_for_user(&self, user_id: &str) -> DomainResult<Vec<CalendarAccount>> {
        Ok(self.accounts.lock().unwrap().iter().filter(|a| a.user_id == user_id).cloned().collect())
    }

    async fn list_owner_ids(&self) -> DomainResult<Vec<String>> {
        let mut ids: Vec<String> =
            self.accounts.lock().unwrap().iter().map(|a| a.user_id.clone()).collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn upsert(&self, data: CalendarAccountUpsert) -> DomainResult<CalendarAccount> {
        let mut accounts = self.accounts.lock().unwrap();
        let provider = data.provider.to_string();
        let now = Utc::now();

        if let Some(existing) = accounts
            .iter_mut()
            .find(|a| a.provider == provider && a.external_id == data.external_id)
        {
            existing.user_id = data.user_id;
            existing.email = data.email;
            existing.label = data.label;
            existing.access_token_enc = data.access_token_enc;
            if data.refresh_token_enc.is_some() {
                existing.refresh_token_enc = data.refresh_token_enc;
            }
            existing.expires_at = data.expires_at;
            existing.last_synced_at = None;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let account = CalendarAccount {
            id: format!("acc-{}", accounts.len() + 1),
            user_id: data.user_id,
            provider,
            external_id: data.external_id,
            email: data.email,
            label: data.label,
            access_token_enc: data.access_token_enc,
            refresh_token_enc: data.refresh_token_enc,
            expires_at: data.expires_at,
            last_synced_at: None,
            created_at: now,
            updated_at: now,
        };
        accounts.push(account.clone());
        Ok(account)
    }

    async fn update_credentials(
        &self,
        account_id: &str,
        update: CredentialUpdate,
    ) -> DomainResult<()> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or_else(|| HearthError::NotFound(account_id.to_string()))?;
        account.access_token_enc = update.access_token_enc;
        if update.refresh_token_enc.is_some() {
            account.refresh_token_enc = update.refresh_token_enc;
        }
        if update.expires_at.is_some() {
            account.expires_at = update.expires_at;
        }
        Ok(())
    }
}

/// In-memory `CalendarEventRepository`.
///
/// Stamps `last_synced_at` through the linked account mock.
#[derive(Clone)]
pub struct MockEventRepository {
    events: Arc<Mutex<Vec<CalendarEvent>>>,
    accounts: MockAccountRepository,
}

impl MockEventRepository {
    pub fn new(accounts: MockAccountRepository) -> Self {
        Self { events: Arc::new(Mutex::new(Vec::new())), accounts }
    }

    pub fn with_event(self, event: CalendarEvent) -> Self {
        self.events.lock().unwrap().push(event);
        self
    }

    pub fn all(&self) -> Vec<CalendarEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarEventRepository for MockEventRepository {
    async fn replace_account_events(
        &self,
        account_id: &str,
        user_id: &str,
        source: EventSource,
        events: Vec<NormalizedEvent>,
        synced_at: DateTime<Utc>,
    ) -> DomainResult<usize> {
        let mut stored = self.events.lock().unwrap();
        stored.retain(|e| e.account_id.as_deref() != Some(account_id) || e.is_meal);

        let count = events.len();
        for (index, event) in events.into_iter().enumerate() {
            stored.push(CalendarEvent {
                id: format!("{account_id}-evt-{index}"),
                account_id: Some(account_id.to_string()),
                user_id: user_id.to_string(),
                external_id: Some(event.external_id),
                holiday_id: None,
                summary: event.summary,
                description: event.description,
                location: event.location,
                starts_at: event.starts_at,
                ends_at: event.ends_at,
                source: source.to_string(),
                is_holiday: false,
                is_meal: false,
                metadata: event.metadata,
            });
        }
        drop(stored);

        self.accounts.mark_synced(account_id, synced_at);
        Ok(count)
    }

    async fn replace_holiday_events(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        holidays: Vec<Holiday>,
    ) -> DomainResult<usize> {
        let mut stored = self.events.lock().unwrap();
        stored.retain(|e| {
            !(e.user_id == user_id && e.is_holiday && e.starts_at >= from && e.starts_at < to)
        });

        let count = holidays.len();
        for holiday in holidays {
            stored.push(CalendarEvent {
                id: format!("{user_id}-{}", holiday.id),
                account_id: None,
                user_id: user_id.to_string(),
                external_id: None,
                holiday_id: Some(holiday.id),
                summary: Some(holiday.name),
                description: Some("Holiday from Calendarific".to_string()),
                location: None,
                starts_at: holiday.date,
                ends_at: holiday.date + Duration::days(1),
                source: EventSource::Calendarific.to_string(),
                is_holiday: true,
                is_meal: false,
                metadata: None,
            });
        }
        Ok(count)
    }

    async fn list_for_account(&self, account_id: &str) -> DomainResult<Vec<CalendarEvent>> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.account_id.as_deref() == Some(account_id))
            .cloned()
            .collect())
    }

    async fn list_for_user(&self, user_id: &str) -> DomainResult<Vec<CalendarEvent>> {
        Ok(self.events.lock().unwrap().iter().filter(|e| e.user_id == user_id).cloned().collect())
    }
}

/// Adapter replaying scripted fetch results, one per call.
pub struct ScriptedAdapter {
    provider: CalendarProvider,
    responses: Mutex<VecDeque<ProviderFetch>>,
    calls: Mutex<usize>,
}

impl ScriptedAdapter {
    pub fn new(provider: CalendarProvider) -> Self {
        Self { provider, responses: Mutex::new(VecDeque::new()), calls: Mutex::new(0) }
    }

    pub fn then(self, fetch: ProviderFetch) -> Self {
        self.responses.lock().unwrap().push_back(fetch);
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl CalendarProviderAdapter for ScriptedAdapter {
    fn provider(&self) -> CalendarProvider {
        self.provider
    }

    async fn fetch_events(&self, _account: &CalendarAccount) -> ProviderFetch {
        *self.calls.lock().unwrap() += 1;
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ProviderFetch::ok(Vec::new()))
    }
}

/// Reversible stand-in for the AES codec.
pub struct PrefixCipher;

impl SecretCipher for PrefixCipher {
    fn encrypt(&self, plaintext: &str) -> DomainResult<String> {
        Ok(format!("enc:{plaintext}"))
    }

    fn decrypt(&self, token: &str) -> DomainResult<String> {
        token
            .strip_prefix("enc:")
            .map(str::to_string)
            .ok_or_else(|| HearthError::InvalidPayload(token.to_string()))
    }
}

pub struct MockGoogleOAuth {
    pub tokens: GoogleTokens,
    pub profile: GoogleProfile,
}

impl MockGoogleOAuth {
    pub fn new(external_id: &str, refresh_token: Option<&str>) -> Self {
        Self {
            tokens: GoogleTokens {
                access_token: Some("ya29.access".to_string()),
                refresh_token: refresh_token.map(str::to_string),
                expires_at: Some(Utc::now() + Duration::hours(1)),
            },
            profile: GoogleProfile {
                id: Some(external_id.to_string()),
                email: Some("cook@example.com".to_string()),
                name: None,
            },
        }
    }
}

#[async_trait]
impl GoogleOAuthPort for MockGoogleOAuth {
    async fn exchange_code(&self, _code: &str, _redirect_uri: &str) -> DomainResult<GoogleTokens> {
        Ok(self.tokens.clone())
    }

    async fn fetch_profile(&self, _access_token: &str) -> DomainResult<GoogleProfile> {
        Ok(self.profile.clone())
    }
}

pub struct FixedPrincipalResolver(pub Option<String>);

#[async_trait]
impl CalDavPrincipalResolver for FixedPrincipalResolver {
    async fn resolve_principal(
        &self,
        _username: &str,
        _password: &str,
    ) -> DomainResult<Option<String>> {
        Ok(self.0.clone())
    }
}

pub fn account(id: &str, user_id: &str, provider: &str) -> CalendarAccount {
    CalendarAccount {
        id: id.to_string(),
        user_id: user_id.to_string(),
        provider: provider.to_string(),
        external_id: format!("ext-{id}"),
        email: None,
        label: None,
        access_token_enc: "enc:access".to_string(),
        refresh_token_enc: Some("enc:refresh".to_string()),
        expires_at: None,
        last_synced_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn event(external_id: &str, day: u32) -> NormalizedEvent {
    let starts_at = Utc.with_ymd_and_hms(2024, 6, day, 9, 0, 0).unwrap();
    NormalizedEvent {
        external_id: external_id.to_string(),
        summary: Some(format!("Event {external_id}")),
        description: None,
        location: None,
        starts_at,
        ends_at: starts_at + Duration::hours(1),
        metadata: None,
    }
}
