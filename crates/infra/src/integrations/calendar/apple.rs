//! iCloud calendar adapter over CalDAV

use std::sync::Arc;

use async_trait::async_trait;
use hearth_core::calendar::ics::parse_ics;
use hearth_core::calendar::ports::{CalendarProviderAdapter, ProviderFetch, SecretCipher};
use hearth_domain::{CalendarAccount, CalendarProvider, HearthError, NormalizedEvent, Result};
use tracing::{debug, instrument};

use super::caldav::{CalDavClient, DavCredentials};

/// Syncs an Apple account from the principal URL stored as its external id.
///
/// The stored credential is the encrypted `email:app-password` pair.
pub struct AppleCalendarAdapter {
    caldav: CalDavClient,
    cipher: Arc<dyn SecretCipher>,
}

impl AppleCalendarAdapter {
    pub fn new(caldav: CalDavClient, cipher: Arc<dyn SecretCipher>) -> Self {
        Self { caldav, cipher }
    }

    fn credentials(&self, account: &CalendarAccount) -> Result<DavCredentials> {
        let secret = self.cipher.decrypt(&account.access_token_enc)?;
        match secret.split_once(':') {
            Some((username, password)) if !username.is_empty() && !password.is_empty() => {
                Ok(DavCredentials { username: username.to_string(), password: password.to_string() })
            }
            _ => Err(HearthError::InvalidPayload("stored Apple credentials are invalid".into())),
        }
    }

    async fn collect_events(&self, account: &CalendarAccount) -> Result<Vec<NormalizedEvent>> {
        let creds = self.credentials(account)?;
        let calendars = self.caldav.list_calendars(&creds, &account.external_id).await?;

        let mut events = Vec::new();
        let mut discarded = 0usize;
        for calendar in &calendars {
            for object in self.caldav.fetch_objects(&creds, &calendar.url).await? {
                match parse_ics(&object.data).and_then(|parsed| parsed.into_normalized()) {
                    Some(event) => events.push(event),
                    None => discarded += 1,
                }
            }
        }

        debug!(calendars = calendars.len(), events = events.len(), discarded, "Fetched CalDAV events");
        Ok(events)
    }
}

#[async_trait]
impl CalendarProviderAdapter for AppleCalendarAdapter {
    fn provider(&self) -> CalendarProvider {
        CalendarProvider::Apple
    }

    #[instrument(skip_all, fields(account_id = %account.id))]
    async fn fetch_events(&self, account: &CalendarAccount) -> ProviderFetch {
        match self.collect_events(account).await {
            Ok(events) => ProviderFetch::ok(events),
            Err(err) => ProviderFetch::failed(err),
        }
    }
}
