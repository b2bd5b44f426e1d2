/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup via DATABASE_URL
/// - Seeded users with real password hashes and tokens
/// - A request helper that drives the router without a listener
///
/// Tests share one database; all seeded identities carry UUID suffixes so
/// runs never collide.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use sqlx::PgPool;
use tower::Service as _;
use uuid::Uuid;

use taskdeck_api::app::{build_router, AppState};
use taskdeck_api::config::Config;
use taskdeck_shared::auth::password::hash_password;
use taskdeck_shared::models::token::AuthToken;
use taskdeck_shared::models::user::{CreateUser, User};

/// Password used for every seeded user
pub const TEST_PASSWORD: &str = "correct-horse-battery-staple";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
}

impl TestContext {
    /// Creates a new test context against the configured database
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../migrations").run(&db).await?;

        let state = AppState::new(db.clone(), config);
        let app = build_router(state);

        Ok(TestContext { db, app })
    }
}

/// Returns a username no other test run has used
pub fn unique_username() -> String {
    format!("user_{}", Uuid::new_v4().simple())
}

/// Creates a user directly in the database with a real password hash
pub async fn seed_user(db: &PgPool) -> anyhow::Result<User> {
    let suffix = Uuid::new_v4().simple().to_string();

    let user = User::create(
        db,
        CreateUser {
            username: format!("user_{}", suffix),
            email: format!("{}@example.com", suffix),
            password_hash: hash_password(TEST_PASSWORD)?,
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
        },
    )
    .await?;

    Ok(user)
}

/// Creates a user and issues a token, as register would
pub async fn seed_user_with_token(db: &PgPool) -> anyhow::Result<(User, String)> {
    let user = seed_user(db).await?;
    let token = AuthToken::get_or_create(db, user.id).await?;

    Ok((user, token.key))
}

/// Sends one request through the router and decodes the JSON body
///
/// `token` adds an `Authorization: Token <key>` header. Responses without
/// a body decode to `Value::Null`.
pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(key) = token {
        builder = builder.header("authorization", format!("Token {}", key));
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("request should build"),
        None => builder.body(Body::empty()).expect("request should build"),
    };

    let response = app.clone().call(request).await.expect("request should not fail");
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should collect");

    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be JSON")
    };

    (status, json)
}

/// Extracts `(field, message)` pairs from a validation error body
pub fn details_of(body: &serde_json::Value) -> Vec<(String, String)> {
    body["details"]
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .map(|d| {
                    (
                        d["field"].as_str().unwrap_or_default().to_string(),
                        d["message"].as_str().unwrap_or_default().to_string(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}
