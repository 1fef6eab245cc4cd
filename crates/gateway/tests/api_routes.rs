//! Router-level tests.  State is built with a manual clock and explicit
//! secrets; no test reaches an upstream provider.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use fg_domain::config::Config;
use fg_gateway::api;
use fg_gateway::api::auth::{issue_token, TokenClaims};
use fg_gateway::state::{AppState, Secrets};
use fg_metering::cache::scope_key;
use fg_metering::{ManualClock, Metering};

const JWT_SECRET: &str = "route-test-secret";
const ADMIN_TOKEN: &str = "route-test-admin";

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap()
}

fn secrets() -> Secrets {
    Secrets {
        jwt_secret: Some(JWT_SECRET.into()),
        admin_token: Some(ADMIN_TOKEN.into()),
        gemini_api_key: None,
        plantnet_api_key: None,
    }
}

fn build(config: Config, secrets: Secrets) -> (Router, AppState) {
    let clock = Arc::new(ManualClock::new(start()));
    let metering = Arc::new(Metering::new(&config, clock.clone()));
    let state = AppState::new(Arc::new(config), metering, clock, secrets).unwrap();
    (api::router(&state).with_state(state.clone()), state)
}

fn app() -> (Router, AppState) {
    build(Config::default(), secrets())
}

fn token(user: &str, is_pro: bool) -> String {
    let claims = TokenClaims {
        user_id: user.into(),
        is_pro,
        iat: start().timestamp(),
        exp: start().timestamp() + 3600,
    };
    issue_token(&claims, JWT_SECRET.as_bytes()).unwrap()
}

fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut req = Request::builder().method("GET").uri(uri);
    if let Some(t) = bearer {
        req = req.header("authorization", format!("Bearer {t}"));
    }
    req.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, bearer: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {bearer}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_multipart(uri: &str, bearer: &str, fields: &[(&str, &str)]) -> Request<Body> {
    const BOUNDARY: &str = "furrowtestboundary";
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {bearer}"))
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, json)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public & auth
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn health_is_public() {
    let (app, _) = app();
    let (status, _, body) = send(&app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "furrow-gate");
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let (app, _) = app();
    let (status, _, body) = send(&app, get("/api/v1/nope", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn missing_token_is_401() {
    let (app, _) = app();
    let (status, _, body) = send(&app, get("/api/v1/usage", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing or invalid Authorization header");
}

#[tokio::test]
async fn garbage_token_is_401() {
    let (app, _) = app();
    let (status, _, body) = send(&app, get("/api/v1/usage", Some("not.a.jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn unset_jwt_secret_fails_closed() {
    let (app, _) = build(
        Config::default(),
        Secrets {
            jwt_secret: None,
            ..secrets()
        },
    );
    let (status, _, _) = send(&app, get("/api/v1/usage", Some(&token("u1", true)))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn free_user_is_refused_pro_routes() {
    let (app, state) = app();
    let req = post_json("/api/v1/chat", &token("free", false), serde_json::json!({ "message": "hi" }));
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Pro subscription required");
    assert_eq!(body["upgrade"], true);
    assert_eq!(state.metering.quota().len(), 0);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Usage & admin
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn usage_reports_every_category() {
    let (app, state) = app();
    state.metering.admit("u1", fg_domain::Category::Chat);

    // Usage is available to free users too.
    let (status, _, body) = send(&app, get("/api/v1/usage", Some(&token("u1", false)))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], "u1");
    assert_eq!(body["usage"]["chat"]["used"], 1);
    assert_eq!(body["usage"]["chat"]["limit"], 20);
    assert_eq!(body["usage"]["photo"]["limit"], 10);
    assert_eq!(body["usage"]["recommend"]["limit"], 3);
}

#[tokio::test]
async fn admin_costs_requires_key() {
    let (app, state) = app();
    state.metering.record_spend(1.25, "chat").unwrap();

    let (status, _, _) = send(&app, get("/admin/costs", None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let wrong = Request::builder()
        .uri("/admin/costs")
        .header("x-admin-key", "nope")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app, wrong).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let ok = Request::builder()
        .uri("/admin/costs")
        .header("x-admin-key", ADMIN_TOKEN)
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, ok).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["month"], "2026-03");
    assert_eq!(body["totalCostUsd"], 1.25);
    assert_eq!(body["budgetLimitUsd"], 100.0);
    assert_eq!(body["byCategory"]["chat"], 1.25);
    assert_eq!(body["overBudget"], false);

    // Bearer form works too.
    let (status, _, _) = send(&app, get("/admin/costs", Some(ADMIN_TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_disabled_without_token() {
    let (app, _) = build(
        Config::default(),
        Secrets {
            admin_token: None,
            ..secrets()
        },
    );
    let (status, _, body) = send(&app, get("/admin/costs", Some(""))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Admission
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn invalid_chat_body_does_not_consume_quota() {
    let (app, state) = app();
    let pro = token("u1", true);

    let (status, _, body) = send(&app, post_json("/api/v1/chat", &pro, serde_json::json!({ "message": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Message is required");

    let long = "x".repeat(2001);
    let (status, _, _) = send(&app, post_json("/api/v1/chat", &pro, serde_json::json!({ "message": long }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(state.metering.usage_snapshot("u1")[&fg_domain::Category::Chat].used, 0);
}

#[tokio::test]
async fn exhausted_quota_is_429() {
    let mut config = Config::default();
    config.quota.chat = 0;
    let (app, _) = build(config, secrets());

    let req = post_json("/api/v1/chat", &token("u1", true), serde_json::json!({ "message": "when to sow peas?" }));
    let (status, headers, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Daily limit reached");
    assert_eq!(body["category"], "chat");
    assert_eq!(body["limit"], 0);
    assert_eq!(body["remaining"], 0);
    assert_eq!(body["resetsAt"], "2026-03-15T00:00:00Z");
    assert_eq!(headers["x-ratelimit-remaining"], "0");
}

#[tokio::test]
async fn exhausted_budget_is_503_for_everyone() {
    let mut config = Config::default();
    config.budget.monthly_limit_usd = 2.0;
    let (app, state) = build(config, secrets());
    state.metering.record_spend(2.0, "diagnose").unwrap();

    for user in ["u1", "u2"] {
        let req = post_json(
            "/api/v1/recommend",
            &token(user, true),
            serde_json::json!({ "zone": "7b", "month": 3 }),
        );
        let (status, _, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "AI features temporarily unavailable due to high demand");
    }
    assert_eq!(state.metering.quota().len(), 0);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Recommendations
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn recommend_serves_personalized_cache_hit() {
    let (app, state) = app();
    state
        .metering
        .cache_store(scope_key("7b", 2026, 3), "Sow peas and spinach.");

    let req = post_json(
        "/api/v1/recommend",
        &token("u1", true),
        serde_json::json!({ "zone": "7b", "month": 3, "existingPlants": ["garlic", "kale"] }),
    );
    let (status, headers, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cached"], true);
    assert_eq!(body["zone"], "7b");
    assert_eq!(body["month"], 3);
    let text = body["recommendation"].as_str().unwrap();
    assert!(text.starts_with("Sow peas and spinach."));
    assert!(text.contains("garlic, kale"));
    assert_eq!(headers["x-ratelimit-limit"], "3");
    assert_eq!(headers["x-ratelimit-remaining"], "2");

    // The shared entry is untouched by personalization.
    assert_eq!(
        state.metering.cache_lookup(&scope_key("7b", 2026, 3)).as_deref(),
        Some("Sow peas and spinach.")
    );
    // A cache hit costs nothing.
    assert_eq!(state.metering.budget_status().total_usd, 0.0);
}

#[tokio::test]
async fn recommend_requires_zone_and_month() {
    let (app, state) = app();
    let req = post_json("/api/v1/recommend", &token("u1", true), serde_json::json!({ "zone": "7b" }));
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Zone and month are required");
    assert_eq!(state.metering.quota().len(), 0);
}

#[tokio::test]
async fn recommend_without_gemini_key_is_500_after_admission() {
    let (app, state) = app();
    let req = post_json("/api/v1/recommend", &token("u1", true), serde_json::json!({ "zone": "5a", "month": 4 }));
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Recommendation service unavailable");
    assert_eq!(state.metering.usage_snapshot("u1")[&fg_domain::Category::Recommend].used, 1);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Photo routes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn photo_routes_require_an_image() {
    let (app, state) = app();
    let pro = token("u1", true);

    for uri in ["/api/v1/diagnose", "/api/v1/identify"] {
        let (status, _, body) = send(&app, post_multipart(uri, &pro, &[("plantName", "tomato")])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "Image file is required");
    }
    assert_eq!(state.metering.usage_snapshot("u1")[&fg_domain::Category::Photo].used, 0);
}
