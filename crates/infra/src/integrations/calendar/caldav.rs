//! CalDAV client built on `libdav`: principal discovery, calendar listing
//! and calendar-object fetches over Basic auth.
//!
//! Each call builds a short-lived `libdav` session for the account's
//! credentials. Redirects are followed, so iCloud's hop to a per-user
//! partition host is transparent.

use async_trait::async_trait;
use hearth_core::calendar::ports::CalDavPrincipalResolver;
use hearth_domain::{HearthError, Result};
use http::Uri;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use libdav::caldav::{FindCalendarHomeSet, FindCalendars, GetCalendarResources};
use libdav::dav::WebDavClient;
use tower_http::auth::AddAuthorization;
use tower_http::follow_redirect::policy::{clone_body_fn, And, CloneBodyFn, PolicyExt, Standard};
use tower_http::follow_redirect::FollowRedirect;
use tracing::{debug, instrument};
use url::Url;

/// Request bodies are replayed on 307/308 so PROPFIND and REPORT survive
/// a redirect.
type RedirectPolicy = And<Standard, CloneBodyFn<fn(&String) -> Option<String>>>;
type DavTransport = FollowRedirect<
    AddAuthorization<Client<HttpsConnector<HttpConnector>, String>>,
    RedirectPolicy,
>;
type DavSession = libdav::CalDavClient<DavTransport>;

/// Username and app-specific password for Basic auth.
#[derive(Clone)]
pub struct DavCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for DavCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DavCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavCalendar {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarObject {
    pub url: String,
    pub etag: String,
    pub data: String,
}

/// CalDAV server client. Relative hrefs are resolved against `endpoint`.
#[derive(Clone)]
pub struct CalDavClient {
    connector: HttpsConnector<HttpConnector>,
    endpoint: Url,
}

impl CalDavClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| HearthError::Config(format!("invalid CalDAV endpoint {endpoint:?}: {e}")))?;
        let connector = HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| HearthError::Config(format!("failed to load native TLS roots: {e}")))?
            .https_or_http()
            .enable_http1()
            .build();
        Ok(Self { connector, endpoint })
    }

    /// `current-user-principal` of the authenticated user, as an absolute URL.
    #[instrument(skip_all)]
    pub async fn resolve_principal(&self, creds: &DavCredentials) -> Result<Option<String>> {
        let session = self.session(creds, self.endpoint.as_str())?;
        let principal = session
            .find_current_user_principal()
            .await
            .map_err(|e| dav_err("principal discovery", e))?;

        principal.map(|p| join(&self.endpoint, p.path())).transpose()
    }

    /// Calendar collections under every home set of the principal.
    #[instrument(skip_all)]
    pub async fn list_calendars(
        &self,
        creds: &DavCredentials,
        principal_url: &str,
    ) -> Result<Vec<DavCalendar>> {
        let principal = join(&self.endpoint, principal_url).and_then(|u| parse_url(&u))?;
        let session = self.session(creds, &origin(&principal))?;

        let principal_path = path_uri(&principal)?;
        let home_sets = session
            .request(FindCalendarHomeSet::new(principal_path.path()))
            .await
            .map_err(|e| dav_err("calendar-home-set lookup", e))?
            .home_sets;
        if home_sets.is_empty() {
            debug!("Principal has no calendar-home-set");
            return Ok(Vec::new());
        }

        let mut calendars = Vec::new();
        for home_set in &home_sets {
            let found = session
                .request(FindCalendars::new(home_set.path()))
                .await
                .map_err(|e| dav_err("calendar listing", e))?
                .calendars;
            for collection in found {
                calendars.push(DavCalendar { url: join(&principal, &collection.href)? });
            }
        }

        debug!(calendars = calendars.len(), "Listed CalDAV calendars");
        Ok(calendars)
    }

    /// Every calendar object of one collection that came back with data.
    #[instrument(skip_all)]
    pub async fn fetch_objects(
        &self,
        creds: &DavCredentials,
        calendar_url: &str,
    ) -> Result<Vec<CalendarObject>> {
        let calendar = join(&self.endpoint, calendar_url).and_then(|u| parse_url(&u))?;
        let session = self.session(creds, &origin(&calendar))?;

        let response = session
            .request(GetCalendarResources::new(calendar.path()))
            .await
            .map_err(|e| dav_err("calendar-query", e))?;

        let mut objects = Vec::new();
        for resource in response.resources {
            match resource.content {
                Ok(content) => objects.push(CalendarObject {
                    url: join(&calendar, &resource.href)?,
                    etag: content.etag,
                    data: content.data,
                }),
                Err(status) => debug!(href = %resource.href, %status, "Calendar object without data"),
            }
        }

        Ok(objects)
    }

    fn session(&self, creds: &DavCredentials, base: &str) -> Result<DavSession> {
        let base: Uri = base
            .parse()
            .map_err(|e| HearthError::Config(format!("invalid CalDAV URL {base:?}: {e}")))?;
        let http: Client<_, String> =
            Client::builder(TokioExecutor::new()).build(self.connector.clone());
        let transport = FollowRedirect::with_policy(
            AddAuthorization::basic(http, &creds.username, &creds.password),
            redirect_policy(),
        );
        Ok(libdav::CalDavClient::new(WebDavClient::new(base, transport)))
    }
}

#[async_trait]
impl CalDavPrincipalResolver for CalDavClient {
    async fn resolve_principal(&self, username: &str, password: &str) -> Result<Option<String>> {
        let creds = DavCredentials { username: username.to_string(), password: password.to_string() };
        CalDavClient::resolve_principal(self, &creds).await
    }
}

fn redirect_policy() -> RedirectPolicy {
    let replay: fn(&String) -> Option<String> = |body| Some(body.clone());
    Standard::default().and::<_, String, ()>(clone_body_fn(replay))
}

fn dav_err(context: &str, err: impl std::fmt::Display) -> HearthError {
    HearthError::Upstream(format!("CalDAV {context} failed: {err}"))
}

fn parse_url(value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| HearthError::Upstream(format!("invalid CalDAV URL {value:?}: {e}")))
}

/// `href` resolved against `base`, as an absolute URL string.
fn join(base: &Url, href: &str) -> Result<String> {
    base.join(href.trim())
        .map(String::from)
        .map_err(|e| HearthError::Upstream(format!("invalid CalDAV href {href:?}: {e}")))
}

fn origin(url: &Url) -> String {
    url.origin().ascii_serialization()
}

fn path_uri(url: &Url) -> Result<Uri> {
    url.path()
        .parse()
        .map_err(|e| HearthError::Upstream(format!("invalid CalDAV path {:?}: {e}", url.path())))
}
