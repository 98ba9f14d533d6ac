use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower::util::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use coinboard::app::build_app;
use coinboard::config::{AppConfig, FeedConfig, JwtConfig};
use coinboard::feedback::repo::FeedbackEntry;
use coinboard::state::AppState;

// Connection-refused endpoint: upstream calls fail fast and fall back.
const DEAD_UPSTREAM: &str = "http://127.0.0.1:1";

fn test_config(
    coingecko: &str,
    cryptopanic: &str,
    reddit: &str,
    openai: &str,
    openai_api_key: Option<String>,
) -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        jwt: JwtConfig {
            secret: "integration-test-secret".into(),
            issuer: "coinboard".into(),
            audience: "coinboard-users".into(),
            ttl_days: 7,
        },
        feeds: FeedConfig {
            coingecko_base_url: coingecko.into(),
            coingecko_api_key: None,
            cryptopanic_base_url: cryptopanic.into(),
            cryptopanic_api_key: None,
            reddit_base_url: reddit.into(),
            openai_base_url: openai.into(),
            openai_api_key,
            upstream_timeout_secs: 5,
            prices_ttl_secs: 60,
            news_ttl_secs: 90,
            meme_ttl_secs: 60,
            insight_ttl_secs: 300,
        },
        allowed_origins: vec![],
    }
}

async fn build_test_app(config: AppConfig) -> (Router, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    let state = AppState::from_parts(pool.clone(), Arc::new(config)).expect("state");
    (build_app(state), pool)
}

async fn app_with_dead_upstreams() -> (Router, SqlitePool) {
    build_test_app(test_config(
        DEAD_UPSTREAM,
        DEAD_UPSTREAM,
        DEAD_UPSTREAM,
        DEAD_UPSTREAM,
        None,
    ))
    .await
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn register(app: &Router, email: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": email, "name": name, "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body["token"].as_str().expect("token").to_string()
}

#[tokio::test]
async fn health_check() {
    let (app, _pool) = app_with_dead_upstreams().await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
}

#[tokio::test]
async fn register_returns_token_and_public_user() {
    let (app, _pool) = app_with_dead_upstreams().await;
    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": "A@X.com", "name": "Alice", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(!body["token"].as_str().unwrap().is_empty());
    // Email is normalized to lowercase.
    assert_eq!(body["user"]["email"], "a@x.com");
    assert_eq!(body["user"]["name"], "Alice");
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let (app, _pool) = app_with_dead_upstreams().await;
    register(&app, "a@x.com", "Alice").await;
    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "email": "a@x.com", "name": "Alice 2", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already"));
}

#[tokio::test]
async fn register_validates_input() {
    let (app, _pool) = app_with_dead_upstreams().await;
    for payload in [
        json!({ "email": "not-an-email", "name": "A", "password": "password123" }),
        json!({ "email": "a@x.com", "name": "  ", "password": "password123" }),
        json!({ "email": "a@x.com", "name": "A", "password": "short" }),
    ] {
        let (status, _) = send(&app, "POST", "/auth/register", None, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn login_rejects_wrong_password_and_accepts_correct_one() {
    let (app, _pool) = app_with_dead_upstreams().await;
    register(&app, "a@x.com", "Alice").await;

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["email"], "a@x.com");
}

#[tokio::test]
async fn dashboard_routes_require_a_token() {
    let (app, _pool) = app_with_dead_upstreams().await;
    for uri in [
        "/dashboard",
        "/dashboard/preferences",
        "/dashboard/prices",
        "/dashboard/news",
        "/dashboard/insight",
        "/dashboard/meme",
    ] {
        let (status, _) = send(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri} should require auth");
    }
}

#[tokio::test]
async fn preferences_round_trip() {
    let (app, _pool) = app_with_dead_upstreams().await;
    let token = register(&app, "a@x.com", "Alice").await;

    // Nothing saved yet: explicit null, not an error.
    let (status, body) = send(&app, "GET", "/dashboard/preferences", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);

    let (status, saved) = send(
        &app,
        "POST",
        "/dashboard/preferences",
        Some(&token),
        Some(json!({
            "interested_assets": ["bitcoin", "ethereum"],
            "investor_type": "HODLer",
            "content_types": ["Market News"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!saved["id"].as_str().unwrap().is_empty());

    let (status, body) = send(&app, "GET", "/dashboard/preferences", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["interested_assets"], json!(["bitcoin", "ethereum"]));
    assert_eq!(body["investor_type"], "HODLer");
    assert_eq!(body["content_types"], json!(["Market News"]));
    assert_eq!(body["id"], saved["id"]);
}

#[tokio::test]
async fn empty_preference_lists_are_rejected() {
    let (app, _pool) = app_with_dead_upstreams().await;
    let token = register(&app, "a@x.com", "Alice").await;

    for payload in [
        json!({ "interested_assets": [], "investor_type": "HODLer", "content_types": ["Memes"] }),
        json!({ "interested_assets": ["bitcoin"], "investor_type": "HODLer", "content_types": [] }),
        json!({ "interested_assets": ["bitcoin"], "content_types": ["Memes"] }),
    ] {
        let (status, _) = send(
            &app,
            "POST",
            "/dashboard/preferences",
            Some(&token),
            Some(payload),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn prices_serve_live_data_and_cache_within_ttl() {
    let market = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/coins/markets"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[
                {"id":"bitcoin","name":"Bitcoin","current_price":64000.0,"price_change_percentage_24h":1.5},
                {"id":"ethereum","name":"Ethereum","current_price":3100.0,"price_change_percentage_24h":-0.4}
            ]"#,
        ))
        .expect(1)
        .mount(&market)
        .await;

    let (app, _pool) = build_test_app(test_config(
        &market.uri(),
        DEAD_UPSTREAM,
        DEAD_UPSTREAM,
        DEAD_UPSTREAM,
        None,
    ))
    .await;
    let token = register(&app, "a@x.com", "Alice").await;
    send(
        &app,
        "POST",
        "/dashboard/preferences",
        Some(&token),
        Some(json!({
            "interested_assets": ["bitcoin", "ethereum"],
            "investor_type": "HODLer",
            "content_types": ["Market News"]
        })),
    )
    .await;

    let (status, first) = send(&app, "GET", "/dashboard/prices", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["prices"][0]["id"], "bitcoin");
    assert_eq!(first["prices"][1]["id"], "ethereum");
    assert!(first.get("note").is_none());

    // Second read within the TTL is byte-identical and does not hit the
    // upstream again (the mock expects exactly one call).
    let (_, second) = send(&app, "GET", "/dashboard/prices", Some(&token), None).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn refresh_flag_bypasses_the_price_cache() {
    let market = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/coins/markets"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"id":"bitcoin","name":"Bitcoin","current_price":64000.0,"price_change_percentage_24h":1.5}]"#,
        ))
        .expect(2)
        .mount(&market)
        .await;

    let (app, _pool) = build_test_app(test_config(
        &market.uri(),
        DEAD_UPSTREAM,
        DEAD_UPSTREAM,
        DEAD_UPSTREAM,
        None,
    ))
    .await;
    let token = register(&app, "a@x.com", "Alice").await;

    send(&app, "GET", "/dashboard/prices", Some(&token), None).await;
    let (status, _) = send(
        &app,
        "GET",
        "/dashboard/prices?refresh=1",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn feeds_fall_back_instead_of_failing() {
    let (app, _pool) = app_with_dead_upstreams().await;
    let token = register(&app, "a@x.com", "Alice").await;

    let (status, body) = send(&app, "GET", "/dashboard/prices", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prices"].as_array().unwrap().len(), 3);
    assert!(body["note"].is_string());

    let (status, body) = send(&app, "GET", "/dashboard/news", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["news"].as_array().unwrap().len(), 2);
    assert!(body["note"].is_string());

    let (status, body) = send(&app, "GET", "/dashboard/meme", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "Static");

    let (status, body) = send(&app, "GET", "/dashboard/insight", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["insight"].as_str().unwrap().contains("Diversification"));
}

#[tokio::test]
async fn insight_uses_the_archetype_static_text_without_a_provider() {
    let (app, _pool) = app_with_dead_upstreams().await;
    let token = register(&app, "a@x.com", "Alice").await;
    send(
        &app,
        "POST",
        "/dashboard/preferences",
        Some(&token),
        Some(json!({
            "interested_assets": ["bitcoin", "ethereum"],
            "investor_type": "HODLer",
            "content_types": ["Market News"]
        })),
    )
    .await;

    let (status, body) = send(&app, "GET", "/dashboard/insight", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["insight"].as_str().unwrap().contains("HODLers"));
}

#[tokio::test]
async fn saving_preferences_invalidates_cached_feeds() {
    let market = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/coins/markets"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"id":"bitcoin","name":"Bitcoin","current_price":64000.0,"price_change_percentage_24h":1.5}]"#,
        ))
        .expect(2)
        .mount(&market)
        .await;

    let (app, _pool) = build_test_app(test_config(
        &market.uri(),
        DEAD_UPSTREAM,
        DEAD_UPSTREAM,
        DEAD_UPSTREAM,
        None,
    ))
    .await;
    let token = register(&app, "a@x.com", "Alice").await;

    // Prime the per-user cache, then save preferences; the next read must
    // re-invoke the upstream.
    send(&app, "GET", "/dashboard/prices", Some(&token), None).await;
    send(
        &app,
        "POST",
        "/dashboard/preferences",
        Some(&token),
        Some(json!({
            "interested_assets": ["bitcoin"],
            "investor_type": "Day Trader",
            "content_types": ["Memes"]
        })),
    )
    .await;
    let (status, _) = send(&app, "GET", "/dashboard/prices", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn dashboard_aggregates_all_four_feeds() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/coins/markets"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"id":"bitcoin","name":"Bitcoin","current_price":64000.0,"price_change_percentage_24h":1.5}]"#,
        ))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/cryptomemes/hot.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"data":{"children":[{"data":{"title":"gm","url":"https://i.redd.it/gm.jpg","post_hint":"image"}}]}}"#,
        ))
        .mount(&upstream)
        .await;
    // News provider is down: that section degrades, the rest stay live.

    let (app, _pool) = build_test_app(test_config(
        &upstream.uri(),
        DEAD_UPSTREAM,
        &upstream.uri(),
        DEAD_UPSTREAM,
        None,
    ))
    .await;
    let token = register(&app, "a@x.com", "Alice").await;

    let (status, body) = send(&app, "GET", "/dashboard", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prices"]["prices"][0]["id"], "bitcoin");
    assert!(body["prices"].get("note").is_none());
    assert_eq!(body["meme"]["title"], "gm");
    assert!(body["news"]["note"].is_string());
    assert!(body["insight"]["insight"].is_string());
}

#[tokio::test]
async fn feedback_is_validated_and_persisted() {
    let (app, pool) = app_with_dead_upstreams().await;
    let token = register(&app, "a@x.com", "Alice").await;

    for payload in [
        json!({ "content_type": "news", "content_id": "n1", "vote": 2 }),
        json!({ "content_type": "news", "content_id": "n1", "vote": 0 }),
        json!({ "content_type": "news", "vote": 1 }),
        json!({ "content_id": "n1", "vote": 1 }),
    ] {
        let (status, _) = send(
            &app,
            "POST",
            "/dashboard/feedback",
            Some(&token),
            Some(payload),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, body) = send(
        &app,
        "POST",
        "/dashboard/feedback",
        Some(&token),
        Some(json!({ "content_type": "news", "content_id": "n1", "vote": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["id"].as_str().unwrap().is_empty());

    // No read API exists; verify through the store directly.
    let user: (uuid::Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = 'a@x.com'")
        .fetch_one(&pool)
        .await
        .unwrap();
    let entries = FeedbackEntry::list_for_user(&pool, user.0).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].vote, -1);
    assert_eq!(entries[0].content_id, "n1");
}
