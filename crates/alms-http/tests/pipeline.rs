//! Request pipeline behavior against a scripted transport.

use std::sync::Arc;
use std::time::Duration;

use alms_http::mock::{MemoryCredentials, MockReply, MockTransport};
use alms_http::{
    BaseAddress, CacheMode, CredentialStore, ErrorKind, MediaRewriter, Method, RequestOptions,
    RequestPipeline,
};
use pretty_assertions::assert_eq;
use serde_json::json;

struct Harness {
    transport: Arc<MockTransport>,
    credentials: Arc<MemoryCredentials>,
    pipeline: RequestPipeline,
}

fn harness(base: &str, token: Option<&str>) -> Harness {
    let transport = Arc::new(MockTransport::new());
    let credentials = Arc::new(token.map_or_else(MemoryCredentials::default, MemoryCredentials::with_token));
    let pipeline = RequestPipeline::new(transport.clone(), BaseAddress::new(base), credentials.clone());
    Harness {
        transport,
        credentials,
        pipeline,
    }
}

fn local(token: Option<&str>) -> Harness {
    harness("http://localhost:5000/api", token)
}

#[tokio::test]
async fn repeat_get_within_ttl_is_served_from_cache() {
    let h = local(None);
    h.transport.on(
        Method::Get,
        "/campaigns",
        MockReply::ok(json!({"status": "success", "data": [{"_id": "c1"}]})),
    );
    let options = || RequestOptions::new().param("page", "1").param("category", "water");

    let first = h.pipeline.get_with("/campaigns", options()).await.unwrap();
    let second = h.pipeline.get_with("/campaigns", options()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(h.transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn get_after_ttl_goes_to_network() {
    let h = local(None);
    h.transport
        .on(Method::Get, "/partners", MockReply::ok(json!({"data": [], "v": 1})))
        .on(Method::Get, "/partners", MockReply::ok(json!({"data": [], "v": 2})));

    let first = h.pipeline.get("/partners").await.unwrap();
    tokio::time::advance(Duration::from_secs(31)).await;
    let second = h.pipeline.get("/partners").await.unwrap();

    assert_eq!(first["v"], 1);
    assert_eq!(second["v"], 2);
    assert_eq!(h.transport.call_count(), 2);
}

#[tokio::test]
async fn different_params_are_different_entries() {
    let h = local(None);
    h.transport.on(Method::Get, "/coupons", MockReply::ok(json!({"data": []})));

    h.pipeline
        .get_with("/coupons", RequestOptions::new().param("status", "active"))
        .await
        .unwrap();
    h.pipeline
        .get_with("/coupons", RequestOptions::new().param("status", "redeemed"))
        .await
        .unwrap();

    assert_eq!(h.transport.call_count(), 2);
    assert_eq!(h.pipeline.cache().len(), 2);
}

#[tokio::test]
async fn refresh_skips_lookup_but_stores() {
    let h = local(None);
    h.transport
        .on(Method::Get, "/campaigns", MockReply::ok(json!({"data": [], "v": 1})))
        .on(Method::Get, "/campaigns", MockReply::ok(json!({"data": [], "v": 2})));

    h.pipeline.get("/campaigns").await.unwrap();
    let refreshed = h
        .pipeline
        .get_with("/campaigns", RequestOptions::fresh())
        .await
        .unwrap();
    let cached = h.pipeline.get("/campaigns").await.unwrap();

    assert_eq!(refreshed["v"], 2);
    assert_eq!(cached["v"], 2);
    assert_eq!(h.transport.call_count(), 2);
}

#[tokio::test]
async fn bypass_never_touches_cache() {
    let h = local(None);
    h.transport.on(Method::Get, "/auth/me", MockReply::ok(json!({"data": {"_id": "u1"}})));

    h.pipeline
        .get_with("/auth/me", RequestOptions::new().cache(CacheMode::Bypass))
        .await
        .unwrap();

    assert!(h.pipeline.cache().is_empty());
}

#[tokio::test]
async fn writes_are_not_cached() {
    let h = local(Some("tok"));
    h.transport.on(Method::Post, "/donations", MockReply::json(201, json!({"status": "success", "data": {"_id": "d1"}})));

    h.pipeline.post("/donations", &json!({"amount": 5})).await.unwrap();
    h.pipeline.post("/donations", &json!({"amount": 5})).await.unwrap();

    assert_eq!(h.transport.call_count(), 2);
    assert!(h.pipeline.cache().is_empty());
    assert_eq!(h.transport.last_call().unwrap().body, Some(json!({"amount": 5})));
}

#[tokio::test]
async fn bearer_header_follows_current_token() {
    let h = local(Some("abc123"));
    h.transport.on(Method::Delete, "/campaigns/c1", MockReply::ok(json!({"status": "success"})));

    h.pipeline.delete("/campaigns/c1").await.unwrap();
    h.credentials.set(None);
    h.pipeline.delete("/campaigns/c1").await.unwrap();

    let calls = h.transport.calls();
    assert_eq!(calls[0].header("Authorization"), Some("Bearer abc123"));
    assert_eq!(calls[1].header("Authorization"), None);
}

#[tokio::test]
async fn unauthorized_clears_credentials() {
    let h = local(Some("stale"));
    h.transport.on(Method::Get, "/donations/my", MockReply::error(401, "Token expired"));

    let err = h.pipeline.get("/donations/my").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(err.message(), "Token expired");
    assert_eq!(h.credentials.token(), None);
}

#[tokio::test]
async fn failures_never_populate_cache() {
    let h = local(None);
    h.transport
        .on(Method::Get, "/campaigns/featured", MockReply::error(500, "Database unavailable"))
        .on(Method::Get, "/campaigns/featured", MockReply::ok(json!({"data": []})));

    let err = h.pipeline.get("/campaigns/featured").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Server);
    assert_eq!(err.message(), "Database unavailable");
    assert!(h.pipeline.cache().is_empty());

    h.pipeline.get("/campaigns/featured").await.unwrap();
    assert_eq!(h.transport.call_count(), 2);
}

#[tokio::test]
async fn success_status_with_error_envelope_is_a_failure() {
    let h = local(None);
    h.transport.on(
        Method::Get,
        "/partners",
        MockReply::ok(json!({"status": "error", "message": "Directory offline"})),
    );

    let err = h.pipeline.get("/partners").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Server);
    assert_eq!(err.message(), "Directory offline");
    assert!(h.pipeline.cache().is_empty());
}

#[tokio::test]
async fn timeout_is_network_error() {
    let h = local(None);
    h.transport.on(Method::Get, "/coupons", MockReply::timeout());

    let err = h
        .pipeline
        .get_with("/coupons", RequestOptions::new().param("status", "active"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(err.message().contains("connect"));
    assert_eq!(h.transport.last_call().unwrap().query, vec![("status".to_string(), "active".to_string())]);
}

#[tokio::test]
async fn media_urls_rewritten_for_hosted_backend() {
    let h = harness("https://api.example.org/api", None);
    let pipeline = h.pipeline.with_rewriter(Some(MediaRewriter::new(
        &["http://localhost:5000".to_string()],
        "https://api.example.org",
    )));
    h.transport.on(
        Method::Get,
        "/campaigns/c1",
        MockReply::ok(json!({"data": {"_id": "c1", "image": "http://localhost:5000/uploads/c1.png"}})),
    );

    let payload = pipeline.get("/campaigns/c1").await.unwrap();
    let cached = pipeline.get("/campaigns/c1").await.unwrap();

    assert_eq!(payload["data"]["image"], "https://api.example.org/uploads/c1.png");
    assert_eq!(cached, payload);
    assert_eq!(
        h.transport.last_call().unwrap().url,
        "https://api.example.org/api/campaigns/c1"
    );
}
