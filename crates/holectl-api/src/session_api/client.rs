// Session-based (v6) API client
//
// Every operation first makes sure a session id is cached (see `auth`),
// then calls `/api/dns/blocking` with the id in the `sid` header.

use std::sync::Arc;

use reqwest::header::{HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::{debug, trace};

use crate::adapter::BlockingApi;
use crate::endpoint::{self, BLOCKING_PATH};
use crate::error::Error;
use crate::generation::Generation;
use crate::model::{Acknowledgement, CanonicalStatus};
use crate::redact;
use crate::session::SessionStore;
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Header carrying the session id on v6 requests.
pub const SID_HEADER: &str = "sid";

/// Client for the v6 REST API.
///
/// Owns a handle to the [`SessionStore`] so consecutive calls reuse one
/// session until it expires or is rejected.
pub struct SessionClient<T> {
    transport: Arc<T>,
    store: Arc<SessionStore>,
}

impl<T: Transport> SessionClient<T> {
    pub fn new(transport: Arc<T>, store: Arc<SessionStore>) -> Self {
        Self { transport, store }
    }

    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    /// The session cache backing this client.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Body for `POST /api/dns/blocking`.
    ///
    /// `timer` is only sent for a positive duration; leaving it out
    /// disables blocking until it is turned back on.
    pub fn blocking_body(enabled: bool, timer_secs: Option<u64>) -> Value {
        match timer_secs {
            Some(secs) if !enabled && secs > 0 => json!({ "blocking": false, "timer": secs }),
            _ => json!({ "blocking": enabled }),
        }
    }

    /// Authenticate if needed, then send one request to the blocking endpoint.
    async fn blocking_request(
        &self,
        host: &str,
        password: &SecretString,
        body: Option<Value>,
    ) -> Result<Value, Error> {
        let token = self.ensure_session(host, password).await?;

        let url = endpoint::host_url(host, BLOCKING_PATH)?;
        let sid = HeaderValue::from_str(token.expose_secret()).map_err(|_| {
            self.store.invalidate();
            Error::Malformed {
                generation: Generation::SessionBased,
                message: "session id is not a valid header value".into(),
            }
        })?;

        let request = match body {
            Some(body) => {
                trace!(payload = %body, "v6 blocking payload");
                HttpRequest::post(url, body)
            }
            None => HttpRequest::get(url),
        }
        .with_sensitive_header(HeaderName::from_static(SID_HEADER), sid);

        let method = request.method.clone();
        let resp = self.transport.send(request).await?;
        debug!(%method, status = resp.status, "v6 blocking response");

        self.read_body(host, &resp, &[password.expose_secret(), token.expose_secret()])
    }

    /// Map a blocking-endpoint response to its JSON body or an error.
    fn read_body(&self, host: &str, resp: &HttpResponse, secrets: &[&str]) -> Result<Value, Error> {
        match resp.status {
            200 => serde_json::from_str(&resp.body).map_err(|e| Error::Malformed {
                generation: Generation::SessionBased,
                message: e.to_string(),
            }),
            0 => Err(Error::NetworkUnreachable {
                host: host.trim().to_owned(),
            }),
            401 => {
                // The server no longer accepts this sid; force a fresh login next time.
                self.store.invalidate();
                Err(Error::AuthenticationFailed {
                    generation: Generation::SessionBased,
                })
            }
            status => Err(Error::Http {
                generation: Generation::SessionBased,
                status,
                excerpt: redact::excerpt(&resp.body, secrets),
            }),
        }
    }
}

impl<T: Transport> BlockingApi for SessionClient<T> {
    fn generation(&self) -> Generation {
        Generation::SessionBased
    }

    async fn get_status(
        &self,
        host: &str,
        credential: &SecretString,
    ) -> Result<CanonicalStatus, Error> {
        let body = self.blocking_request(host, credential, None).await?;
        let status = CanonicalStatus::from_session_body(&body);
        debug!(
            blocking = status.blocking_enabled,
            timer = status.remaining_disable_seconds,
            "v6 status"
        );
        Ok(status)
    }

    async fn enable(&self, host: &str, credential: &SecretString) -> Result<Acknowledgement, Error> {
        let raw = self
            .blocking_request(host, credential, Some(Self::blocking_body(true, None)))
            .await?;
        Ok(Acknowledgement {
            generation: Generation::SessionBased,
            raw,
        })
    }

    async fn disable(
        &self,
        host: &str,
        credential: &SecretString,
        seconds: u64,
    ) -> Result<Acknowledgement, Error> {
        let body = Self::blocking_body(false, Some(seconds));
        let raw = self.blocking_request(host, credential, Some(body)).await?;
        Ok(Acknowledgement {
            generation: Generation::SessionBased,
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::transport::HttpTransport;

    type Client = SessionClient<HttpTransport>;

    #[test]
    fn enable_body() {
        assert_eq!(Client::blocking_body(true, None), json!({"blocking": true}));
    }

    #[test]
    fn disable_body_with_and_without_timer() {
        assert_eq!(
            Client::blocking_body(false, Some(300)),
            json!({"blocking": false, "timer": 300})
        );
        assert_eq!(Client::blocking_body(false, Some(0)), json!({"blocking": false}));
        assert_eq!(Client::blocking_body(false, None), json!({"blocking": false}));
    }
}
