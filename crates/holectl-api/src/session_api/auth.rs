// Session API authentication
//
// `POST /api/auth` with `{"password": ...}` exchanges the app password
// for a session id. The id is cached in the client's `SessionStore` and
// reused until it expires, so a status poll does not log in every time.

use std::time::Instant;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::endpoint::{self, AUTH_PATH};
use crate::error::Error;
use crate::generation::Generation;
use crate::session::validity_from_secs;
use crate::session_api::client::SessionClient;
use crate::transport::{HttpRequest, Transport};

#[derive(Deserialize)]
struct AuthResponse {
    session: Option<AuthSession>,
}

#[derive(Deserialize)]
struct AuthSession {
    sid: Option<String>,
    validity: Option<f64>,
}

impl<T: Transport> SessionClient<T> {
    /// Return a usable session id, logging in only if the cached one is
    /// missing or expired.
    ///
    /// - 200 with `session.sid`: cached with the stated validity (300 s if absent)
    /// - 200 without a sid: cache cleared, [`Error::NoSessionInResponse`]
    /// - 401: cache cleared, [`Error::InvalidCredential`]
    /// - anything else: the error is returned and the cache is left alone
    pub async fn ensure_session(
        &self,
        host: &str,
        password: &SecretString,
    ) -> Result<SecretString, Error> {
        let now = Instant::now();
        if let Some(token) = self.store().valid_token(now) {
            debug!("using cached v6 session");
            return Ok(token);
        }

        debug!("authenticating with v6 API");
        let url = endpoint::host_url(host, AUTH_PATH)?;
        let body = json!({ "password": password.expose_secret() });

        let resp = self.transport().send(HttpRequest::post(url, body)).await?;
        debug!(status = resp.status, "v6 auth response");

        match resp.status {
            200 => {
                let parsed: AuthResponse =
                    serde_json::from_str(&resp.body).map_err(|e| Error::Malformed {
                        generation: Generation::SessionBased,
                        // serde echoes offending values, which may be a sid.
                        message: format!(
                            "auth response: {:?} error at line {} column {}",
                            e.classify(),
                            e.line(),
                            e.column()
                        ),
                    })?;

                let session = parsed.session;
                let sid = session
                    .as_ref()
                    .and_then(|s| s.sid.as_deref())
                    .filter(|sid| !sid.is_empty());

                let Some(sid) = sid else {
                    self.store().invalidate();
                    warn!("v6 auth response carried no session id");
                    return Err(Error::NoSessionInResponse);
                };

                let token = SecretString::from(sid.to_owned());
                let validity = validity_from_secs(session.as_ref().and_then(|s| s.validity));
                self.store().set(token.clone(), validity, now);
                debug!("v6 session established");
                Ok(token)
            }
            0 => Err(Error::NetworkUnreachable {
                host: host.trim().to_owned(),
            }),
            401 => {
                self.store().invalidate();
                Err(Error::InvalidCredential)
            }
            status => Err(Error::Http {
                generation: Generation::SessionBased,
                status,
                excerpt: None,
            }),
        }
    }
}
