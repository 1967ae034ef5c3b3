// ── Negotiator ──
//
// Runs every logical operation against the preferred API generation
// first and falls back to the other one on failure. The generation that
// last succeeded is remembered, so a host that moved from v5 to v6 costs
// one wasted request and then self-corrects.

use std::future::Future;
use std::sync::Arc;

use holectl_api::{
    Acknowledgement, BlockingApi, CanonicalStatus, Generation, HttpTransport, LegacyClient,
    SessionClient, SessionStore, Transport,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{Attempt, CoreError};
use crate::model::{Operation, PreferredGeneration};

// ── Operations ───────────────────────────────────────────────────────

/// One operation, callable against either generation.
trait Call: Copy + Send + Sync {
    type Output: Send;

    fn operation(self) -> Operation;

    fn call<A: BlockingApi>(
        self,
        api: &A,
        host: &str,
        credential: &SecretString,
    ) -> impl Future<Output = Result<Self::Output, holectl_api::Error>> + Send;
}

#[derive(Clone, Copy)]
struct GetStatus;

#[derive(Clone, Copy)]
struct Enable;

#[derive(Clone, Copy)]
struct Disable {
    seconds: u64,
}

impl Call for GetStatus {
    type Output = CanonicalStatus;

    fn operation(self) -> Operation {
        Operation::Status
    }

    async fn call<A: BlockingApi>(
        self,
        api: &A,
        host: &str,
        credential: &SecretString,
    ) -> Result<CanonicalStatus, holectl_api::Error> {
        api.get_status(host, credential).await
    }
}

impl Call for Enable {
    type Output = Acknowledgement;

    fn operation(self) -> Operation {
        Operation::Enable
    }

    async fn call<A: BlockingApi>(
        self,
        api: &A,
        host: &str,
        credential: &SecretString,
    ) -> Result<Acknowledgement, holectl_api::Error> {
        api.enable(host, credential).await
    }
}

impl Call for Disable {
    type Output = Acknowledgement;

    fn operation(self) -> Operation {
        Operation::Disable
    }

    async fn call<A: BlockingApi>(
        self,
        api: &A,
        host: &str,
        credential: &SecretString,
    ) -> Result<Acknowledgement, holectl_api::Error> {
        api.disable(host, credential, self.seconds).await
    }
}

// ── Negotiator ───────────────────────────────────────────────────────

/// Client for one Pi-hole that speaks whichever API generation answers.
///
/// Cheaply cloneable via `Arc<NegotiatorInner>`. All clones share one
/// session cache and one generation preference, and their operations
/// run one at a time.
pub struct Negotiator<T: Transport = HttpTransport> {
    inner: Arc<NegotiatorInner<T>>,
}

struct NegotiatorInner<T> {
    legacy: LegacyClient<T>,
    session: SessionClient<T>,
    preferred: watch::Sender<PreferredGeneration>,
    /// Held for the whole of each top-level operation.
    gate: Mutex<()>,
}

impl<T: Transport> Clone for Negotiator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Negotiator<HttpTransport> {
    /// Negotiator with the default 5 s request timeout.
    pub fn new() -> Result<Self, CoreError> {
        Self::from_config(&ClientConfig::default())
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, CoreError> {
        let transport = HttpTransport::new(&config.transport_config())?;
        Ok(Self::with_transport(transport))
    }
}

impl<T: Transport> Negotiator<T> {
    /// Build on an existing transport. Used to inject fakes in tests.
    pub fn with_transport(transport: T) -> Self {
        let transport = Arc::new(transport);
        let store = Arc::new(SessionStore::new());
        let (preferred, _) = watch::channel(PreferredGeneration::Unknown);

        Self {
            inner: Arc::new(NegotiatorInner {
                legacy: LegacyClient::new(Arc::clone(&transport)),
                session: SessionClient::new(transport, store),
                preferred,
                gate: Mutex::new(()),
            }),
        }
    }

    /// The generation the next operation will try first.
    pub fn preferred_generation(&self) -> PreferredGeneration {
        *self.inner.preferred.borrow()
    }

    /// Watch the preference change as operations succeed.
    pub fn subscribe_generation(&self) -> watch::Receiver<PreferredGeneration> {
        self.inner.preferred.subscribe()
    }

    /// The v6 session cache.
    pub fn session_store(&self) -> &Arc<SessionStore> {
        self.inner.session.store()
    }

    // ── Operations ───────────────────────────────────────────────

    /// Current blocking state.
    pub async fn get_status(
        &self,
        host: &str,
        credential: &SecretString,
    ) -> Result<CanonicalStatus, CoreError> {
        self.negotiate(host, credential, GetStatus).await
    }

    /// Turn blocking on.
    pub async fn enable(
        &self,
        host: &str,
        credential: &SecretString,
    ) -> Result<Acknowledgement, CoreError> {
        self.negotiate(host, credential, Enable).await
    }

    /// Turn blocking off for `seconds`, or until re-enabled when `0`.
    pub async fn disable(
        &self,
        host: &str,
        credential: &SecretString,
        seconds: u64,
    ) -> Result<Acknowledgement, CoreError> {
        self.negotiate(host, credential, Disable { seconds }).await
    }

    async fn negotiate<C: Call>(
        &self,
        host: &str,
        credential: &SecretString,
        call: C,
    ) -> Result<C::Output, CoreError> {
        let host = validate(host, credential)?;
        let operation = call.operation();

        let _gate = self.inner.gate.lock().await;
        let preferred = self.preferred_generation();
        debug!(%operation, %preferred, "starting operation");

        let mut attempts = Vec::with_capacity(2);
        for generation in preferred.try_order() {
            let result = match generation {
                Generation::Legacy => call.call(&self.inner.legacy, host, credential).await,
                Generation::SessionBased => call.call(&self.inner.session, host, credential).await,
            };

            match result {
                Ok(output) => {
                    self.prefer(generation);
                    debug!(%operation, %generation, "operation succeeded");
                    return Ok(output);
                }
                Err(error) => {
                    debug!(%operation, %generation, %error, "attempt failed");
                    attempts.push(Attempt { generation, error });
                }
            }
        }

        let err = CoreError::CompositeFailure {
            operation,
            attempts,
        };
        warn!(
            %operation,
            kind = ?err.kind(),
            unreachable = err.is_unreachable(),
            "all API generations failed"
        );
        Err(err)
    }

    fn prefer(&self, generation: Generation) {
        let next = PreferredGeneration::from(generation);
        let changed = self.inner.preferred.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        if changed {
            info!(%generation, "preferring {generation} API from now on");
        }
    }
}

/// Reject empty input before any network activity. Returns the trimmed host.
fn validate<'a>(host: &'a str, credential: &SecretString) -> Result<&'a str, CoreError> {
    let host = host.trim();
    if host.is_empty() {
        return Err(CoreError::InvalidHost);
    }
    if credential.expose_secret().trim().is_empty() {
        return Err(CoreError::InvalidCredential);
    }
    Ok(host)
}

// ── Completion-callback entry points ─────────────────────────────────
//
// For callers that want `on_result(success, payload)` instead of a
// future. Each call runs as its own task; earlier calls are never
// cancelled.

impl<T: Transport + 'static> Negotiator<T> {
    /// Spawn [`get_status`](Self::get_status); the success payload is the
    /// `CanonicalStatus` as JSON.
    pub fn spawn_get_status<F>(
        &self,
        host: impl Into<String>,
        credential: SecretString,
        on_result: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(bool, Value) + Send + 'static,
    {
        let this = self.clone();
        let host = host.into();
        tokio::spawn(async move {
            let result = this.get_status(&host, &credential).await;
            deliver(result.map(|status| to_payload(&status)), on_result);
        })
    }

    /// Spawn [`enable`](Self::enable); the success payload is the raw
    /// acknowledgement body.
    pub fn spawn_enable<F>(
        &self,
        host: impl Into<String>,
        credential: SecretString,
        on_result: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(bool, Value) + Send + 'static,
    {
        let this = self.clone();
        let host = host.into();
        tokio::spawn(async move {
            let result = this.enable(&host, &credential).await;
            deliver(result.map(|ack| ack.raw), on_result);
        })
    }

    /// Spawn [`disable`](Self::disable); the success payload is the raw
    /// acknowledgement body.
    pub fn spawn_disable<F>(
        &self,
        host: impl Into<String>,
        credential: SecretString,
        seconds: u64,
        on_result: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(bool, Value) + Send + 'static,
    {
        let this = self.clone();
        let host = host.into();
        tokio::spawn(async move {
            let result = this.disable(&host, &credential, seconds).await;
            deliver(result.map(|ack| ack.raw), on_result);
        })
    }
}

fn to_payload<S: Serialize>(value: &S) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| json!({ "error": e.to_string() }))
}

fn deliver<F>(result: Result<Value, CoreError>, on_result: F)
where
    F: FnOnce(bool, Value),
{
    match result {
        Ok(payload) => on_result(true, payload),
        Err(err) => on_result(false, json!({ "error": err.to_string() })),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex as StdMutex;

    use holectl_api::{HttpRequest, HttpResponse};
    use pretty_assertions::assert_eq;

    use super::*;

    type Queue = VecDeque<Result<HttpResponse, holectl_api::Error>>;

    /// Scripted transport: canned responses per path, every request recorded.
    #[derive(Clone, Default)]
    struct FakeTransport {
        responses: Arc<StdMutex<HashMap<String, Queue>>>,
        calls: Arc<StdMutex<Vec<String>>>,
    }

    impl FakeTransport {
        fn push(self, path: &str, response: Result<HttpResponse, holectl_api::Error>) -> Self {
            self.responses
                .lock()
                .unwrap()
                .entry(path.to_owned())
                .or_default()
                .push_back(response);
            self
        }

        fn respond(self, path: &str, status: u16, body: &str) -> Self {
            self.push(
                path,
                Ok(HttpResponse {
                    status,
                    body: body.to_owned(),
                }),
            )
        }

        fn unreachable(self, path: &str) -> Self {
            self.push(
                path,
                Err(holectl_api::Error::NetworkUnreachable {
                    host: "10.0.0.5".into(),
                }),
            )
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Transport for FakeTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, holectl_api::Error> {
            let path = request.url.path().to_owned();
            self.calls
                .lock()
                .unwrap()
                .push(format!("{} {path}", request.method));
            self.responses
                .lock()
                .unwrap()
                .get_mut(&path)
                .and_then(VecDeque::pop_front)
                .unwrap_or(Ok(HttpResponse {
                    status: 404,
                    body: String::new(),
                }))
        }
    }

    fn negotiator(fake: FakeTransport) -> (Negotiator<FakeTransport>, FakeTransport) {
        (Negotiator::with_transport(fake.clone()), fake)
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    #[tokio::test]
    async fn empty_inputs_make_no_requests() {
        let (neg, fake) = negotiator(FakeTransport::default());

        assert_eq!(
            neg.get_status("  ", &secret("pw")).await,
            Err(CoreError::InvalidHost)
        );
        assert_eq!(
            neg.enable("10.0.0.5", &secret(" \t")).await.unwrap_err(),
            CoreError::InvalidCredential
        );
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn legacy_success_keeps_legacy_first() {
        let fake = FakeTransport::default()
            .respond("/admin/api.php", 200, r#"{"status":"enabled"}"#)
            .respond("/admin/api.php", 200, r#"{"status":"disabled"}"#);
        let (neg, fake) = negotiator(fake);

        assert!(neg.get_status("10.0.0.5", &secret("key")).await.unwrap().blocking_enabled);
        assert_eq!(neg.preferred_generation(), PreferredGeneration::Legacy);
        assert!(!neg.get_status("10.0.0.5", &secret("key")).await.unwrap().blocking_enabled);

        assert_eq!(fake.calls(), vec!["GET /admin/api.php", "GET /admin/api.php"]);
    }

    #[tokio::test]
    async fn fallback_then_self_correction() {
        let fake = FakeTransport::default()
            // First call: legacy answers with the wrong shape, v6 works.
            .respond("/admin/api.php", 200, "[]")
            .respond("/api/auth", 200, r#"{"session":{"sid":"abc","validity":300}}"#)
            .respond("/api/dns/blocking", 200, r#"{"blocking":"enabled","timer":null}"#)
            // Second call: v6 now fails, legacy works again.
            .unreachable("/api/dns/blocking")
            .respond("/admin/api.php", 200, r#"{"status":"enabled"}"#);
        let (neg, fake) = negotiator(fake);
        let mut watcher = neg.subscribe_generation();

        neg.get_status("10.0.0.5", &secret("pw")).await.unwrap();
        assert_eq!(neg.preferred_generation(), PreferredGeneration::SessionBased);
        assert!(watcher.has_changed().unwrap());
        let _ = watcher.borrow_and_update();

        neg.get_status("10.0.0.5", &secret("pw")).await.unwrap();
        assert_eq!(neg.preferred_generation(), PreferredGeneration::Legacy);
        assert!(watcher.has_changed().unwrap());

        assert_eq!(
            fake.calls(),
            vec![
                "GET /admin/api.php",
                "POST /api/auth",
                "GET /api/dns/blocking",
                // Cached session reused; blocking call fails, legacy recovers.
                "GET /api/dns/blocking",
                "GET /admin/api.php",
            ]
        );
    }

    #[tokio::test]
    async fn failure_leaves_preference_unchanged() {
        let fake = FakeTransport::default()
            .unreachable("/admin/api.php")
            .unreachable("/api/auth");
        let (neg, _fake) = negotiator(fake);

        let err = neg.disable("10.0.0.5", &secret("pw"), 30).await.unwrap_err();
        assert_eq!(neg.preferred_generation(), PreferredGeneration::Unknown);
        match err {
            CoreError::CompositeFailure {
                operation,
                attempts,
            } => {
                assert_eq!(operation, Operation::Disable);
                let order: Vec<_> = attempts.iter().map(|a| a.generation).collect();
                assert_eq!(order, vec![Generation::Legacy, Generation::SessionBased]);
            }
            other => panic!("expected CompositeFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn callback_reports_error_payload() {
        let (neg, _fake) = negotiator(FakeTransport::default());
        let (tx, rx) = tokio::sync::oneshot::channel();

        neg.spawn_get_status("", secret("pw"), move |ok, payload| {
            let _ = tx.send((ok, payload));
        })
        .await
        .unwrap();

        let (ok, payload) = rx.await.unwrap();
        assert!(!ok);
        assert_eq!(payload, json!({ "error": "Pi-hole IP address is empty" }));
    }

    #[tokio::test]
    async fn callback_reports_status_payload() {
        let fake = FakeTransport::default().respond("/admin/api.php", 200, r#"{"status":"enabled"}"#);
        let (neg, _fake) = negotiator(fake);
        let (tx, rx) = tokio::sync::oneshot::channel();

        neg.spawn_get_status("10.0.0.5", secret("key"), move |ok, payload| {
            let _ = tx.send((ok, payload));
        })
        .await
        .unwrap();

        let (ok, payload) = rx.await.unwrap();
        assert!(ok);
        assert_eq!(
            payload,
            json!({ "blockingEnabled": true, "remainingDisableSeconds": 0 })
        );
    }
}
