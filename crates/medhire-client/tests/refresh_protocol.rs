//! Refresh protocol integration tests
//!
//! Exercises the 401 recovery path against a mock backend: single-flight
//! refresh under contention, replay with the rotated token, forced logout
//! on refresh failure, the single-retry guard, and unauthenticated
//! dispatch.

use std::sync::Arc;
use std::time::Duration;

use medhire_auth::{MemoryStore, SecureStore, TokenPair};
use medhire_client::{ApiClient, ApiError, ClientConfig};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

fn client_for(server: &MockServer) -> ApiClient {
    init_tracing();
    let config = ClientConfig {
        base_url: server.uri(),
        timeout_ms: 2_000,
        ..ClientConfig::default()
    };
    ApiClient::new(&config, Arc::new(MemoryStore::new()))
}

async fn seed_session(client: &ApiClient, access: &str, refresh: &str) {
    client
        .session()
        .store(&TokenPair {
            access_token: access.into(),
            refresh_token: refresh.into(),
        })
        .await
        .unwrap();
}

/// Scenario A: valid token, 200 response, no refresh triggered.
#[tokio::test]
async fn valid_token_passes_through_untouched() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/company-profile"))
        .and(header("authorization", "Bearer at_live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cp_1",
            "name": "St. Helena Clinic"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    seed_session(&client, "at_live", "rt_live").await;

    let profile: Value = client.get("/company-profile").await.unwrap();
    assert_eq!(profile["id"], "cp_1");
    assert_eq!(
        client.session().access_token().await.unwrap().expose(),
        "at_live"
    );
}

/// Scenario B: expired token, one refresh, replay with the new bearer.
#[tokio::test]
async fn expired_token_refreshes_and_replays() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/job-postings"))
        .and(header("authorization", "Bearer at_stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .and(body_json(json!({"refresh_token": "rt_stale"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new_at",
            "refresh_token": "new_rt"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/job-postings"))
        .and(header("authorization", "Bearer new_at"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "jp_9"}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    seed_session(&client, "at_stale", "rt_stale").await;

    let jobs: Value = client.get("/job-postings").await.unwrap();
    assert_eq!(jobs[0]["id"], "jp_9");

    // Both tokens rotated in the store
    assert_eq!(
        client.session().access_token().await.unwrap().expose(),
        "new_at"
    );
    assert_eq!(
        client.session().refresh_token().await.unwrap().expose(),
        "new_rt"
    );
}

/// Scenario C / P3: invalid refresh token forces a logout.
#[tokio::test]
async fn refresh_rejection_clears_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/job-postings"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid refresh token"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    seed_session(&client, "at_stale", "rt_revoked").await;

    let result: Result<Value, ApiError> = client.get("/job-postings").await;
    match result {
        Err(ApiError::Refresh(medhire_auth::Error::Rejected { status, .. })) => {
            assert_eq!(status, 401);
        }
        other => panic!("expected refresh rejection, got {other:?}"),
    }

    // Both credential entries deleted
    assert!(!client.session().is_authenticated().await);
    assert!(client.session().refresh_token().await.is_none());
}

/// P1 + P2 + Scenario D: a wave of concurrent 401s triggers exactly one
/// refresh; every request is replayed exactly once with the new token.
#[tokio::test]
async fn concurrent_401s_share_one_refresh() {
    let server = MockServer::start().await;

    for p in ["/company-profile", "/job-postings", "/applications"] {
        // First attempt carries the stale token. The delay keeps the wave
        // overlapping: all three dispatch before any enters recovery.
        Mock::given(method("GET"))
            .and(path(p))
            .and(header("authorization", "Bearer at_stale"))
            .respond_with(
                ResponseTemplate::new(401).set_delay(Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;
        // Replay carries the rotated token.
        Mock::given(method("GET"))
            .and(path(p))
            .and(header("authorization", "Bearer new_at"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"path": p})))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .and(body_json(json!({"refresh_token": "rt_stale"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(100))
                .set_body_json(json!({
                    "access_token": "new_at",
                    "refresh_token": "new_rt"
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    seed_session(&client, "at_stale", "rt_stale").await;

    let (profile, jobs, apps): (
        Result<Value, ApiError>,
        Result<Value, ApiError>,
        Result<Value, ApiError>,
    ) = tokio::join!(
        client.get("/company-profile"),
        client.get("/job-postings"),
        client.get("/applications"),
    );

    assert_eq!(profile.unwrap()["path"], "/company-profile");
    assert_eq!(jobs.unwrap()["path"], "/job-postings");
    assert_eq!(apps.unwrap()["path"], "/applications");

    // Mock expectations verify on drop: one refresh, one stale attempt
    // and one replay per path.
}

/// P3 under contention: one refresh failure rejects every queued caller.
#[tokio::test]
async fn refresh_failure_rejects_all_waiters() {
    let server = MockServer::start().await;

    for p in ["/company-profile", "/job-postings", "/applications"] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(
                ResponseTemplate::new(401).set_delay(Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_delay(Duration::from_millis(100))
                .set_body_string("revoked"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    seed_session(&client, "at_stale", "rt_revoked").await;

    let (a, b, c): (
        Result<Value, ApiError>,
        Result<Value, ApiError>,
        Result<Value, ApiError>,
    ) = tokio::join!(
        client.get("/company-profile"),
        client.get("/job-postings"),
        client.get("/applications"),
    );

    for result in [a, b, c] {
        assert!(
            matches!(result, Err(ApiError::Refresh(_))),
            "every waiter must observe the dead session"
        );
    }
    assert!(!client.session().is_authenticated().await);
}

/// P4: a 401 on the replayed request propagates; no second refresh, no
/// second replay.
#[tokio::test]
async fn replayed_401_is_not_retried_again() {
    let server = MockServer::start().await;

    // Rejects both the stale and the rotated token.
    Mock::given(method("GET"))
        .and(path("/job-postings"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new_at",
            "refresh_token": "new_rt"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    seed_session(&client, "at_stale", "rt_stale").await;

    let result: Result<Value, ApiError> = client.get("/job-postings").await;
    match result {
        Err(ApiError::Http { status, .. }) => assert_eq!(status, 401),
        other => panic!("expected plain 401, got {other:?}"),
    }

    // The refresh did succeed, so the session survives; only this
    // request failed.
    assert_eq!(
        client.session().access_token().await.unwrap().expose(),
        "new_at"
    );
}

/// P5: no stored token means no Authorization header, not a local error.
#[tokio::test]
async fn missing_token_dispatches_unauthenticated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/job-postings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let jobs: Value = client.get("/job-postings").await.unwrap();
    assert_eq!(jobs, json!([]));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(
        requests[0].headers.get("authorization").is_none(),
        "request must not carry an Authorization header"
    );
}

/// Non-401 errors propagate immediately with status and body preserved.
#[tokio::test]
async fn non_401_errors_skip_recovery() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/company-profile"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "database unavailable"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    seed_session(&client, "at_live", "rt_live").await;

    let result: Result<Value, ApiError> = client.get("/company-profile").await;
    match result {
        Err(ApiError::Http {
            status,
            message,
            body,
        }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "database unavailable");
            assert!(body.is_some(), "raw body must be preserved");
        }
        other => panic!("expected http error, got {other:?}"),
    }
    // Session untouched by a non-401 failure
    assert!(client.session().is_authenticated().await);
}

/// A missing refresh token fails the recovery path locally and still
/// clears the access token.
#[tokio::test]
async fn recovery_without_refresh_token_ends_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/job-postings"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    // Orphaned state: only the access key exists in the secure store.
    let store = Arc::new(MemoryStore::new());
    store
        .set("medhire.access_token", "at_orphan".into())
        .await
        .unwrap();
    let config = ClientConfig {
        base_url: server.uri(),
        timeout_ms: 2_000,
        ..ClientConfig::default()
    };
    let client = ApiClient::new(&config, store);

    let result: Result<Value, ApiError> = client.get("/job-postings").await;
    assert!(matches!(
        result,
        Err(ApiError::Refresh(medhire_auth::Error::NoRefreshToken))
    ));
    // The stray access token is cleared too.
    assert!(!client.session().is_authenticated().await);
}

/// Per-call timeout surfaces as `ApiError::Timeout`.
#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/job-postings"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(5))
                .set_body_json(json!([])),
        )
        .mount(&server)
        .await;

    let config = ClientConfig {
        base_url: server.uri(),
        timeout_ms: 200,
        ..ClientConfig::default()
    };
    let client = ApiClient::new(&config, Arc::new(MemoryStore::new()));

    let result: Result<Value, ApiError> = client.get("/job-postings").await;
    match result {
        Err(ApiError::Timeout { elapsed_ms }) => assert_eq!(elapsed_ms, 200),
        other => panic!("expected timeout, got {other:?}"),
    }
}
