use std::time::Duration;

use hearth_domain::{HearthError, HttpConfig, Result};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::InfraError;

/// Longest slice of an error body carried into the error message.
const ERROR_BODY_SNIPPET: usize = 200;

/// Shared outbound HTTP client.
///
/// Requests are sent once. Transport failures and non-2xx responses both
/// become [`HearthError::Upstream`]; callers that need to react to a
/// specific status use [`HttpClient::send`] and inspect the response.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        Self::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(config.user_agent.clone())
            .build()
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the request; only transport failures are errors.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder.build().map_err(|err| HearthError::from(InfraError::from(err)))?;
        let method = request.method().clone();
        let url = redact_query(request.url());
        debug!(%method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                debug!(%method, %url, status = %response.status(), "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                Err(InfraError::from(err).into())
            }
        }
    }

    /// Execute the request and require a 2xx status.
    pub async fn send_checked(&self, builder: RequestBuilder, context: &str) -> Result<Response> {
        let response = self.send(builder).await?;
        ensure_success(response, context).await
    }

    /// Execute, require 2xx and decode a JSON body.
    pub async fn json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        context: &str,
    ) -> Result<T> {
        let response = self.send_checked(builder, context).await?;
        response.json::<T>().await.map_err(|err| {
            HearthError::Upstream(format!("{context}: malformed response body: {err}"))
        })
    }
}

/// Turn a non-2xx response into `Upstream` carrying the status and the start
/// of the body.
pub async fn ensure_success(response: Response, context: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(context, status, &body))
}

pub fn status_error(context: &str, status: StatusCode, body: &str) -> HearthError {
    let snippet: String = body.trim().chars().take(ERROR_BODY_SNIPPET).collect();
    if snippet.is_empty() {
        HearthError::Upstream(format!("{context}: HTTP {}", status.as_u16()))
    } else {
        HearthError::Upstream(format!("{context}: HTTP {}: {snippet}", status.as_u16()))
    }
}

/// API keys travel in query strings for some providers.
fn redact_query(url: &reqwest::Url) -> String {
    let mut shown = url.clone();
    shown.set_query(url.query().map(|_| "[REDACTED]"));
    shown.to_string()
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30), user_agent: None, default_headers: None }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| HearthError::from(InfraError::from(err)))?;
        Ok(HttpClient { client })
    }
}
