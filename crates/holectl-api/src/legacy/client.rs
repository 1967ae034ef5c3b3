// Legacy (v5) API client
//
// Every call is a single `GET /admin/api.php?<action>&auth=<key>`.
// There is no session: the API key rides along on each request.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::adapter::BlockingApi;
use crate::endpoint::{self, LEGACY_API_PATH};
use crate::error::Error;
use crate::generation::Generation;
use crate::model::{Acknowledgement, CanonicalStatus};
use crate::redact;
use crate::transport::{HttpRequest, Transport};

/// What the request asks `api.php` to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyAction {
    Status,
    Enable,
    Disable { seconds: u64 },
}

/// Client for the v5 `api.php` endpoint.
pub struct LegacyClient<T> {
    transport: Arc<T>,
}

impl<T: Transport> LegacyClient<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Build `http://{host}/admin/api.php?<action>&auth=<key>`.
    ///
    /// The key is form-encoded into the query string.
    pub fn request_url(
        host: &str,
        action: LegacyAction,
        credential: &SecretString,
    ) -> Result<Url, Error> {
        let mut url = endpoint::host_url(host, LEGACY_API_PATH)?;
        {
            let mut query = url.query_pairs_mut();
            match action {
                LegacyAction::Status => {
                    query.append_key_only("status");
                }
                LegacyAction::Enable => {
                    query.append_key_only("enable");
                }
                LegacyAction::Disable { seconds } => {
                    query.append_pair("disable", &seconds.to_string());
                }
            }
            query.append_pair("auth", credential.expose_secret());
        }
        Ok(url)
    }

    /// Send one action and return the parsed JSON body.
    async fn call(
        &self,
        host: &str,
        credential: &SecretString,
        action: LegacyAction,
    ) -> Result<Value, Error> {
        let url = Self::request_url(host, action, credential)?;
        debug!(?action, url = %redact::log_url(&url), "v5 request");

        let resp = self.transport.send(HttpRequest::get(url)).await?;
        debug!(?action, status = resp.status, "v5 response");

        match resp.status {
            200 => serde_json::from_str(&resp.body).map_err(|e| {
                trace!(error = %e, "v5 body is not JSON");
                Error::Malformed {
                    generation: Generation::Legacy,
                    message: e.to_string(),
                }
            }),
            0 => Err(Error::NetworkUnreachable {
                host: host.trim().to_owned(),
            }),
            401 => Err(Error::AuthenticationFailed {
                generation: Generation::Legacy,
            }),
            status => Err(Error::Http {
                generation: Generation::Legacy,
                status,
                excerpt: None,
            }),
        }
    }
}

impl<T: Transport> BlockingApi for LegacyClient<T> {
    fn generation(&self) -> Generation {
        Generation::Legacy
    }

    async fn get_status(
        &self,
        host: &str,
        credential: &SecretString,
    ) -> Result<CanonicalStatus, Error> {
        let body = self.call(host, credential, LegacyAction::Status).await?;
        // A 200 without `status` is usually a v6 server answering on the old path.
        CanonicalStatus::from_legacy_body(&body).ok_or(Error::MissingStatusField)
    }

    async fn enable(&self, host: &str, credential: &SecretString) -> Result<Acknowledgement, Error> {
        let raw = self.call(host, credential, LegacyAction::Enable).await?;
        Ok(Acknowledgement {
            generation: Generation::Legacy,
            raw,
        })
    }

    async fn disable(
        &self,
        host: &str,
        credential: &SecretString,
        seconds: u64,
    ) -> Result<Acknowledgement, Error> {
        let raw = self
            .call(host, credential, LegacyAction::Disable { seconds })
            .await?;
        Ok(Acknowledgement {
            generation: Generation::Legacy,
            raw,
        })
    }
}
