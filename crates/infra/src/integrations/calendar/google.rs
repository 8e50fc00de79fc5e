//! Google OAuth and Calendar v3 client

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use hearth_core::calendar::ports::{
    CalendarProviderAdapter, GoogleOAuthPort, GoogleProfile, GoogleTokens, ProviderFetch,
    SecretCipher,
};
use hearth_domain::constants::{
    CALENDAR_SYNC_LOOKAHEAD_DAYS, CALENDAR_SYNC_LOOKBACK_DAYS, GOOGLE_EVENTS_PAGE_SIZE,
    GOOGLE_TOKEN_REFRESH_LEEWAY_SECS,
};
use hearth_domain::{
    CalendarAccount, CalendarProvider, GoogleConfig, HearthError, NormalizedEvent,
    RefreshedCredentials, Result,
};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::http::{ensure_success, status_error, HttpClient};

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Endpoint roots, overridable for tests.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub token_url: String,
    pub userinfo_url: String,
    pub calendar_api_base: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
            calendar_api_base: GOOGLE_CALENDAR_API_BASE.to_string(),
        }
    }
}

impl GoogleEndpoints {
    /// All three endpoints under one mock server root.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            token_url: format!("{base}/token"),
            userinfo_url: format!("{base}/oauth2/v2/userinfo"),
            calendar_api_base: format!("{base}/calendar/v3"),
        }
    }
}

/// Google account linking and primary-calendar fetches.
pub struct GoogleCalendarClient {
    http: HttpClient,
    config: GoogleConfig,
    cipher: Arc<dyn SecretCipher>,
    endpoints: GoogleEndpoints,
}

impl GoogleCalendarClient {
    pub fn new(http: HttpClient, config: GoogleConfig, cipher: Arc<dyn SecretCipher>) -> Self {
        Self { http, config, cipher, endpoints: GoogleEndpoints::default() }
    }

    pub fn with_endpoints(mut self, endpoints: GoogleEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        self.config.credentials().ok_or_else(|| {
            HearthError::ConfigurationMissing("Google OAuth credentials are not configured".into())
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedCredentials> {
        let (client_id, client_secret) = self.credentials()?;
        let request = self.http.request(Method::POST, &self.endpoints.token_url).form(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ]);

        let token: TokenResponse = self.http.json(request, "Google token refresh").await?;
        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| HearthError::Upstream("Google refresh returned no access token".into()))?;

        debug!("Refreshed Google access token");
        Ok(RefreshedCredentials {
            access_token,
            refresh_token: token.refresh_token.filter(|t| !t.is_empty()),
            expires_at: token.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }

    /// Every page of the primary calendar within the sync window.
    async fn list_events(&self, access_token: &str) -> FetchResult<Vec<NormalizedEvent>> {
        let (time_min, time_max) = sync_window(Utc::now());
        let url = format!("{}/calendars/primary/events", self.endpoints.calendar_api_base);
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut query = vec![
                ("timeMin", time_min.clone()),
                ("timeMax", time_max.clone()),
                ("maxResults", GOOGLE_EVENTS_PAGE_SIZE.to_string()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let request =
                self.http.request(Method::GET, &url).bearer_auth(access_token).query(&query);
            let response = self.http.send(request).await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                return Err(FetchError::Unauthorized);
            }
            let response = ensure_success(response, "Google events").await?;
            let page: EventsPage = response.json().await.map_err(|e| {
                HearthError::Upstream(format!("Google events: malformed response body: {e}"))
            })?;

            pages += 1;
            events.extend(page.items.unwrap_or_default().into_iter().filter_map(normalize_item));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!(pages, events = events.len(), "Fetched Google events");
        Ok(events)
    }
}

#[async_trait]
impl GoogleOAuthPort for GoogleCalendarClient {
    #[instrument(skip_all)]
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<GoogleTokens> {
        let (client_id, client_secret) = self.credentials()?;
        let request = self.http.request(Method::POST, &self.endpoints.token_url).form(&[
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ]);

        let token: TokenResponse = self.http.json(request, "Google code exchange").await?;
        Ok(GoogleTokens {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: token.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile> {
        let request =
            self.http.request(Method::GET, &self.endpoints.userinfo_url).bearer_auth(access_token);
        let profile: UserInfo = self.http.json(request, "Google userinfo").await?;
        Ok(GoogleProfile { id: profile.id, email: profile.email, name: profile.name })
    }
}

#[async_trait]
impl CalendarProviderAdapter for GoogleCalendarClient {
    fn provider(&self) -> CalendarProvider {
        CalendarProvider::Google
    }

    #[instrument(skip_all, fields(account_id = %account.id))]
    async fn fetch_events(&self, account: &CalendarAccount) -> ProviderFetch {
        let mut access_token = match self.cipher.decrypt(&account.access_token_enc) {
            Ok(token) => token,
            Err(err) => return ProviderFetch::failed(err),
        };
        let refresh_token = match account.refresh_token_enc.as_deref() {
            Some(enc) => match self.cipher.decrypt(enc) {
                Ok(token) => Some(token),
                Err(err) => return ProviderFetch::failed(err),
            },
            None => None,
        };

        let mut refreshed: Option<RefreshedCredentials> = None;

        if let Some(refresh) = refresh_token.as_deref() {
            if expires_soon(account.expires_at, Utc::now()) {
                match self.refresh(refresh).await {
                    Ok(creds) => {
                        access_token = creds.access_token.clone();
                        refreshed = Some(creds);
                    }
                    Err(err) => return ProviderFetch::failed(err),
                }
            }
        }

        let events = match self.list_events(&access_token).await {
            Ok(events) => Ok(events),
            Err(FetchError::Unauthorized) => match refresh_token.as_deref() {
                Some(refresh) => {
                    warn!("Google rejected access token, refreshing once");
                    match self.refresh(refresh).await {
                        Ok(creds) => {
                            let retried = self.list_events(&creds.access_token).await;
                            refreshed = Some(creds);
                            retried.map_err(FetchError::into_hearth)
                        }
                        Err(err) => Err(err),
                    }
                }
                None => Err(FetchError::Unauthorized.into_hearth()),
            },
            Err(other) => Err(other.into_hearth()),
        };

        ProviderFetch { events, refreshed }
    }
}

type FetchResult<T> = std::result::Result<T, FetchError>;

/// 401 is kept apart so the adapter can refresh and retry once.
enum FetchError {
    Unauthorized,
    Other(HearthError),
}

impl FetchError {
    fn into_hearth(self) -> HearthError {
        match self {
            Self::Unauthorized => {
                status_error("Google events", StatusCode::UNAUTHORIZED, "access token rejected")
            }
            Self::Other(err) => err,
        }
    }
}

impl From<HearthError> for FetchError {
    fn from(err: HearthError) -> Self {
        Self::Other(err)
    }
}

/// True when the stored expiry is inside the refresh leeway (or past).
fn expires_soon(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    expires_at.is_some_and(|at| at <= now + Duration::seconds(GOOGLE_TOKEN_REFRESH_LEEWAY_SECS))
}

/// `timeMin`/`timeMax` around the UTC start of today.
fn sync_window(now: DateTime<Utc>) -> (String, String) {
    let today = now.date_naive().and_time(chrono::NaiveTime::MIN).and_utc();
    let min = today - Duration::days(CALENDAR_SYNC_LOOKBACK_DAYS);
    let max = today + Duration::days(CALENDAR_SYNC_LOOKAHEAD_DAYS);
    (min.to_rfc3339_opts(SecondsFormat::Secs, true), max.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn normalize_item(raw: serde_json::Value) -> Option<NormalizedEvent> {
    let item = EventItem::deserialize(&raw).ok()?;
    let external_id = item.id.filter(|id| !id.is_empty())?;
    let starts_at = item.start.as_ref().and_then(EventTime::resolve)?;
    let ends_at = item.end.as_ref().and_then(EventTime::resolve)?;

    Some(NormalizedEvent {
        external_id,
        summary: item.summary,
        description: item.description,
        location: item.location,
        starts_at,
        ends_at,
        metadata: Some(raw),
    })
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    id: Option<String>,
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsPage {
    items: Option<Vec<serde_json::Value>>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventItem {
    id: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    start: Option<EventTime>,
    end: Option<EventTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    date_time: Option<String>,
    date: Option<String>,
    time_zone: Option<String>,
}

impl EventTime {
    /// `dateTime` wins over `date`; explicit offsets win over `timeZone`.
    fn resolve(&self) -> Option<DateTime<Utc>> {
        let zone: Tz = self.time_zone.as_deref().and_then(|tz| tz.parse().ok()).unwrap_or(Tz::UTC);

        if let Some(value) = self.date_time.as_deref().filter(|v| !v.is_empty()) {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
                return Some(parsed.with_timezone(&Utc));
            }
            let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").ok()?;
            return zone.from_local_datetime(&naive).earliest().map(|dt| dt.with_timezone(&Utc));
        }

        let date = self.date.as_deref().filter(|v| !v.is_empty())?;
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
        zone.from_local_datetime(&day.and_time(chrono::NaiveTime::MIN))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    struct PlainCipher;

    impl SecretCipher for PlainCipher {
        fn encrypt(&self, plaintext: &str) -> Result<String> {
            Ok(format!("enc:{plaintext}"))
        }

        fn decrypt(&self, token: &str) -> Result<String> {
            token
                .strip_prefix("enc:")
                .map(str::to_string)
                .ok_or_else(|| HearthError::InvalidPayload(token.to_string()))
        }
    }

    fn client(server: &MockServer) -> GoogleCalendarClient {
        let config = GoogleConfig {
            client_id: Some("client-id".into()),
            client_secret: Some("client-secret".into()),
            redirect_uri: None,
        };
        GoogleCalendarClient::new(HttpClient::new().unwrap(), config, Arc::new(PlainCipher))
            .with_endpoints(GoogleEndpoints::with_base(&server.uri()))
    }

    fn account(expires_at: Option<DateTime<Utc>>, refresh: Option<&str>) -> CalendarAccount {
        CalendarAccount {
            id: "acc-1".into(),
            user_id: "user-1".into(),
            provider: "google".into(),
            external_id: "g-123".into(),
            email: None,
            label: None,
            access_token_enc: "enc:old-access".into(),
            refresh_token_enc: refresh.map(|r| format!("enc:{r}")),
            expires_at,
            last_synced_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn event(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "summary": format!("Event {id}"),
            "start": {"dateTime": "2026-03-01T09:00:00-05:00"},
            "end": {"dateTime": "2026-03-01T10:00:00-05:00"}
        })
    }

    #[tokio::test]
    async fn pages_until_no_next_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendar/v3/calendars/primary/events"))
            .and(query_param("pageToken", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [event("b")]})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/calendar/v3/calendars/primary/events"))
            .and(query_param("maxResults", "2500"))
            .and(query_param("singleEvents", "true"))
            .and(query_param("orderBy", "startTime"))
            .and(header("authorization", "Bearer old-access"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"items": [event("a"), {"id": "no-times"}], "nextPageToken": "p2"})),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;

        let fetch = client(&server).fetch_events(&account(None, None)).await;
        let events = fetch.events.unwrap();
        assert!(fetch.refreshed.is_none());
        assert_eq!(events.iter().map(|e| e.external_id.as_str()).collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(events[0].starts_at.to_rfc3339(), "2026-03-01T14:00:00+00:00");
        assert_eq!(events[0].metadata.as_ref().unwrap()["summary"], "Event a");
    }

    #[tokio::test]
    async fn refreshes_before_fetch_when_expiring() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "new-access", "expires_in": 3600})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer new-access"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;

        let expiring = account(Some(Utc::now() + Duration::seconds(30)), Some("refresh-1"));
        let fetch = client(&server).fetch_events(&expiring).await;

        assert!(fetch.events.unwrap().is_empty());
        let refreshed = fetch.refreshed.expect("refreshed credentials");
        assert_eq!(refreshed.access_token, "new-access");
        assert!(refreshed.refresh_token.is_none());
        assert!(refreshed.expires_at.is_some());
    }

    #[tokio::test]
    async fn unauthorized_triggers_single_refresh_and_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer old-access"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"access_token": "new-access", "refresh_token": "rotated", "expires_in": 60}),
            ))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer new-access"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [event("x")]})))
            .mount(&server)
            .await;

        let fetch = client(&server).fetch_events(&account(None, Some("refresh-1"))).await;
        assert_eq!(fetch.events.unwrap().len(), 1);
        assert_eq!(fetch.refreshed.unwrap().refresh_token.as_deref(), Some("rotated"));
    }

    #[tokio::test]
    async fn refreshed_credentials_survive_failed_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "new-access", "expires_in": 3600})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
            .mount(&server)
            .await;

        let expired = account(Some(Utc::now() - Duration::hours(1)), Some("refresh-1"));
        let fetch = client(&server).fetch_events(&expired).await;

        assert!(matches!(fetch.events, Err(HearthError::Upstream(ref m)) if m.contains("503")));
        assert_eq!(fetch.refreshed.unwrap().access_token, "new-access");
    }

    #[tokio::test]
    async fn unauthorized_without_refresh_token_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(401)).mount(&server).await;

        let fetch = client(&server).fetch_events(&account(None, None)).await;
        assert!(matches!(fetch.events, Err(HearthError::Upstream(ref m)) if m.contains("401")));
    }

    #[tokio::test]
    async fn exchange_and_profile() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=auth-code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"access_token": "a", "refresh_token": "r", "expires_in": 3599}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/oauth2/v2/userinfo"))
            .and(header("authorization", "Bearer a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"id": "g-123", "email": "cook@example.com", "name": "Cook"}),
            ))
            .mount(&server)
            .await;

        let google = client(&server);
        let tokens = google.exchange_code("auth-code", "https://app/cb").await.unwrap();
        assert_eq!(tokens.access_token.as_deref(), Some("a"));
        assert_eq!(tokens.refresh_token.as_deref(), Some("r"));

        let profile = google.fetch_profile("a").await.unwrap();
        assert_eq!(profile.id.as_deref(), Some("g-123"));
        assert_eq!(profile.name.as_deref(), Some("Cook"));
    }

    #[test]
    fn event_time_resolution() {
        let all_day = EventTime { date_time: None, date: Some("2026-12-25".into()), time_zone: None };
        assert_eq!(all_day.resolve().unwrap().to_rfc3339(), "2026-12-25T00:00:00+00:00");

        let zoned = EventTime {
            date_time: Some("2026-07-01T09:00:00".into()),
            date: None,
            time_zone: Some("Europe/Berlin".into()),
        };
        assert_eq!(zoned.resolve().unwrap().to_rfc3339(), "2026-07-01T07:00:00+00:00");

        let offset_wins = EventTime {
            date_time: Some("2026-07-01T09:00:00+00:00".into()),
            date: None,
            time_zone: Some("Europe/Berlin".into()),
        };
        assert_eq!(offset_wins.resolve().unwrap().to_rfc3339(), "2026-07-01T09:00:00+00:00");

        let empty = EventTime { date_time: None, date: None, time_zone: None };
        assert!(empty.resolve().is_none());
    }

    #[test]
    fn leeway_and_window() {
        let now = Utc.with_ymd_and_hms(2026, 5, 10, 15, 30, 0).unwrap();
        assert!(expires_soon(Some(now + Duration::seconds(59)), now));
        assert!(!expires_soon(Some(now + Duration::seconds(120)), now));
        assert!(!expires_soon(None, now));

        let (min, max) = sync_window(now);
        assert_eq!(min, "2026-05-03T00:00:00Z");
        assert_eq!(max, "2026-07-09T00:00:00Z");
    }
}
