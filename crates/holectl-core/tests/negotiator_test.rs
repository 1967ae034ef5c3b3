#![allow(clippy::unwrap_used)]
// End-to-end negotiation tests against a wiremock Pi-hole.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use holectl_core::{
    ClientConfig, CoreError, ErrorKind, Generation, Negotiator, PreferredGeneration,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Negotiator, String) {
    let server = MockServer::start().await;
    let negotiator = Negotiator::new().unwrap();
    let host = server.address().to_string();
    (server, negotiator, host)
}

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_owned())
}

/// A v6-only Pi-hole: the legacy path is gone, auth and blocking work.
async fn mount_v6(server: &MockServer, validity: u64, auth_calls: u64) {
    Mock::given(path("/admin/api.php"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .and(body_json(json!({ "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session": { "valid": true, "sid": "abc", "validity": validity }
        })))
        .expect(auth_calls)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/dns/blocking"))
        .and(header("sid", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "blocking": "disabled", "timer": 120
        })))
        .mount(server)
        .await;
}

// ── Negotiation ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_enable_falls_back_to_session_api() {
    let (server, negotiator, host) = setup().await;

    Mock::given(method("GET"))
        .and(path("/admin/api.php"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session": { "sid": "abc", "validity": 300 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/dns/blocking"))
        .and(header("sid", "abc"))
        .and(body_json(json!({ "blocking": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "blocking": true })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = negotiator.enable(&host, &secret("secret")).await.unwrap();
    assert_eq!(ack.generation, Generation::SessionBased);
    assert_eq!(
        negotiator.preferred_generation(),
        PreferredGeneration::SessionBased
    );
}

#[tokio::test]
async fn test_status_reuses_cached_session() {
    let (server, negotiator, host) = setup().await;
    mount_v6(&server, 300, 1).await;

    let first = negotiator.get_status(&host, &secret("secret")).await.unwrap();
    let second = negotiator.get_status(&host, &secret("secret")).await.unwrap();

    assert_eq!(first, second);
    assert!(!first.blocking_enabled);
    assert_eq!(first.remaining_disable_seconds, 120);

    // Legacy was only tried on the first call.
    let legacy_hits = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/admin/api.php")
        .count();
    assert_eq!(legacy_hits, 1);
}

#[tokio::test]
async fn test_expired_session_reauthenticates() {
    let (server, negotiator, host) = setup().await;
    mount_v6(&server, 1, 2).await;

    negotiator.get_status(&host, &secret("secret")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1100)).await;
    negotiator.get_status(&host, &secret("secret")).await.unwrap();
}

#[tokio::test]
async fn test_flips_back_to_legacy() {
    let (server, negotiator, host) = setup().await;
    mount_v6(&server, 300, 1).await;

    negotiator.get_status(&host, &secret("secret")).await.unwrap();
    assert_eq!(
        negotiator.preferred_generation(),
        PreferredGeneration::SessionBased
    );

    // The host is downgraded: v6 endpoints vanish, the legacy API answers.
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/admin/api.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "enabled" })))
        .mount(&server)
        .await;

    let status = negotiator.get_status(&host, &secret("secret")).await.unwrap();
    assert!(status.blocking_enabled);
    assert_eq!(negotiator.preferred_generation(), PreferredGeneration::Legacy);
}

#[tokio::test]
async fn test_disable_with_timer_uses_preferred_generation() {
    let (server, negotiator, host) = setup().await;
    mount_v6(&server, 300, 1).await;

    Mock::given(method("POST"))
        .and(path("/api/dns/blocking"))
        .and(body_json(json!({ "blocking": false, "timer": 300 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "blocking": "disabled", "timer": 300
        })))
        .expect(1)
        .mount(&server)
        .await;

    negotiator.get_status(&host, &secret("secret")).await.unwrap();
    let ack = negotiator.disable(&host, &secret("secret"), 300).await.unwrap();

    assert_eq!(ack.generation, Generation::SessionBased);
    assert_eq!(ack.reported_status().map(|s| s.remaining_disable_seconds), Some(300));
}

// ── Failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_both_unreachable() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let negotiator = Negotiator::new().unwrap();

    let err = negotiator
        .get_status(&format!("127.0.0.1:{port}"), &secret("secret"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::NetworkUnreachable));
    let message = err.to_string();
    assert!(message.starts_with("Cannot connect to Pi-hole.\n"), "{message}");
    assert!(message.contains("cannot reach Pi-hole"), "{message}");
    assert_eq!(negotiator.preferred_generation(), PreferredGeneration::Unknown);
}

#[tokio::test]
async fn test_empty_input_makes_no_requests() {
    let (server, negotiator, host) = setup().await;

    assert_eq!(
        negotiator.get_status("   ", &secret("secret")).await,
        Err(CoreError::InvalidHost)
    );
    assert_eq!(
        negotiator.disable(&host, &secret(""), 60).await.unwrap_err(),
        CoreError::InvalidCredential
    );

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_wrong_password_is_reported_over_legacy_failure() {
    let (server, negotiator, host) = setup().await;

    Mock::given(path("/admin/api.php"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(path("/api/auth"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = negotiator.enable(&host, &secret("secret")).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::AuthenticationFailed));
    assert_eq!(err.cause().map(|a| a.generation), Some(Generation::SessionBased));
    assert!(err.to_string().starts_with("Failed to enable blocking.\n"));
}

#[tokio::test]
async fn test_timeout_is_its_own_kind() {
    let server = MockServer::start().await;
    let config = ClientConfig::default().with_timeout(Duration::from_millis(200));
    let negotiator = Negotiator::from_config(&config).unwrap();
    let host = server.address().to_string();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let err = negotiator.get_status(&host, &secret("secret")).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Timeout));
}

#[tokio::test]
async fn test_secrets_never_surface() {
    let (server, negotiator, host) = setup().await;

    // Both generations echo what they were sent back into the error body.
    Mock::given(path("/admin/api.php"))
        .respond_with(ResponseTemplate::new(500).set_body_string("bad auth s3cret-pw"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session": { "sid": "tok-123", "validity": 300 }
        })))
        .mount(&server)
        .await;

    Mock::given(path("/api/dns/blocking"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string("session tok-123 password s3cret-pw rejected"),
        )
        .mount(&server)
        .await;

    let err = negotiator.get_status(&host, &secret("s3cret-pw")).await.unwrap_err();

    for shown in [err.to_string(), format!("{err:?}")] {
        assert!(!shown.contains("s3cret-pw"), "credential leaked: {shown}");
        assert!(!shown.contains("tok-123"), "session token leaked: {shown}");
    }
    // Equal rank, so the first-tried (legacy) failure is the one shown.
    assert!(err.to_string().ends_with("v5 HTTP 500"), "{err}");
    assert!(format!("{err:?}").contains("session *** password ***"));
}

#[tokio::test]
async fn test_callback_delivers_status() {
    let (server, negotiator, host) = setup().await;
    mount_v6(&server, 300, 1).await;

    let (tx, rx) = tokio::sync::oneshot::channel();
    negotiator
        .spawn_get_status(host, secret("secret"), move |ok, payload| {
            let _ = tx.send((ok, payload));
        })
        .await
        .unwrap();

    let (ok, payload) = rx.await.unwrap();
    assert!(ok);
    assert_eq!(
        payload,
        json!({ "blockingEnabled": false, "remainingDisableSeconds": 120 })
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callbacks_share_one_login() {
    let (server, negotiator, host) = setup().await;

    // Only the first operation may probe the legacy path; the rest queue
    // behind it and start on the session API.
    Mock::given(path("/admin/api.php"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_v6(&server, 300, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/dns/blocking"))
        .and(header("sid", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "blocking": "enabled", "timer": null
        })))
        .expect(2)
        .mount(&server)
        .await;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let handles = [
        negotiator.spawn_get_status(host.clone(), secret("secret"), {
            let tx = tx.clone();
            move |ok, payload| tx.send(("status", ok, payload)).unwrap()
        }),
        negotiator.spawn_enable(host.clone(), secret("secret"), {
            let tx = tx.clone();
            move |ok, payload| tx.send(("enable", ok, payload)).unwrap()
        }),
        negotiator.spawn_disable(host, secret("secret"), 60, {
            let tx = tx.clone();
            move |ok, payload| tx.send(("disable", ok, payload)).unwrap()
        }),
    ];
    drop(tx);
    for handle in handles {
        handle.await.unwrap();
    }

    let mut seen = Vec::new();
    while let Some((name, ok, payload)) = rx.recv().await {
        assert!(ok, "{name} failed: {payload}");
        seen.push(name);
    }
    seen.sort_unstable();
    assert_eq!(seen, ["disable", "enable", "status"]);
    assert_eq!(
        negotiator.preferred_generation(),
        PreferredGeneration::SessionBased
    );
}
