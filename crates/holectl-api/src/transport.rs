// HTTP transport
//
// One request in, one `(status, body)` out. Both API generations go
// through the `Transport` trait so the whole negotiation stack can run
// against a fake in tests. `HttpTransport` is the reqwest-backed
// implementation; every request it sends carries the same bounded timeout.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{HeaderName, HeaderValue};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::redact;

/// Fixed per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

// ── Request / response ──────────────────────────────────────────────

/// A single HTTP request, fully described.
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(HeaderName, HeaderValue)>,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: Url, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            url,
            headers: Vec::new(),
            body: Some(body),
        }
    }

    /// Attach a header whose value must never be printed.
    pub fn with_sensitive_header(mut self, name: HeaderName, mut value: HeaderValue) -> Self {
        value.set_sensitive(true);
        self.headers.push((name, value));
        self
    }

    /// `host[:port]` of the target, for error messages.
    pub fn host(&self) -> String {
        self.url.authority().to_owned()
    }
}

// Bodies can hold passwords and URLs can hold API keys; neither is printed.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &redact::log_url(&self.url))
            .field("headers", &self.headers.len())
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// What came back: the status code and the raw body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

// ── Transport trait ─────────────────────────────────────────────────

/// Issues one HTTP request and resolves to the response or a transport error.
///
/// Transport errors are always one of [`Error::NetworkUnreachable`],
/// [`Error::Timeout`], or [`Error::Transport`]; any HTTP status, including
/// error statuses, comes back as `Ok(HttpResponse)`.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest)
    -> impl Future<Output = Result<HttpResponse, Error>> + Send;
}

// ── Configuration ───────────────────────────────────────────────────

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("holectl/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl TransportConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {e}")))
    }
}

// ── reqwest implementation ──────────────────────────────────────────

/// [`Transport`] backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: config.build_client()?,
            timeout: config.timeout,
        })
    }

    fn map_error(&self, err: reqwest::Error, host: &str) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                host: host.to_owned(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else if err.is_connect() {
            Error::NetworkUnreachable {
                host: host.to_owned(),
            }
        } else {
            // The URL may carry the legacy API key in its query string.
            Error::Transport(err.without_url().to_string())
        }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let host = request.host();
        debug!(method = %request.method, url = %redact::log_url(&request.url), "sending request");

        let mut builder = self.http.request(request.method, request.url);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| self.map_error(e, &host))?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| self.map_error(e, &host))?;

        trace!(status, bytes = body.len(), "response received");
        Ok(HttpResponse { status, body })
    }
}
