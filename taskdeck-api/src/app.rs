/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskdeck_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskdeck_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use taskdeck_shared::auth::middleware::{create_token_auth_middleware, require_auth};

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                   # Health check (public, no token layer)
/// ├── /tasks/                   # GET list | POST create (slash optional)
/// ├── /tasks/:id/               # GET | PATCH | DELETE one task
/// └── /users/
///     ├── POST /register/       # Create account, returns token
///     ├── POST /login/          # Returns token
///     ├── POST /logout/         # Requires token
///     └── GET  /auth-check/     # Requires token
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Token resolution (everything under /tasks and /users)
/// 5. require_auth (logout and auth-check only)
///
/// Token resolution never rejects a request for lacking credentials; it
/// resolves them to a `Caller` and leaves the decision to the routes.
/// Health stays outside the token layer so monitoring probes keep working
/// when the database is down.
///
/// # Example
///
/// ```no_run
/// use taskdeck_api::app::{AppState, build_router};
/// use taskdeck_api::config::Config;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
///
/// let app = build_router(state);
///
/// // Start server
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health));

    // Task CRUD; anonymous callers are welcome, visibility does the rest.
    // The historical API used slashed paths; the collection answers both.
    let task_collection = get(routes::tasks::list_tasks).post(routes::tasks::create_task);
    let task_routes = Router::new()
        .route("/tasks", task_collection.clone())
        .route("/tasks/", task_collection)
        .route(
            "/tasks/:id/",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        );

    // Account routes; logout and auth-check require a logged-in caller
    let session_routes = Router::new()
        .route("/logout/", post(routes::users::logout))
        .route("/auth-check/", get(routes::users::auth_check))
        .route_layer(axum::middleware::from_fn(require_auth));

    let user_routes = Router::new()
        .route("/register/", post(routes::users::register))
        .route("/login/", post(routes::users::login))
        .merge(session_routes);

    // Everything under /tasks and /users goes through token resolution
    let api_routes = Router::new()
        .merge(task_routes)
        .nest("/users", user_routes)
        .layer(axum::middleware::from_fn(create_token_auth_middleware(
            state.db.clone(),
        )));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .merge(api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, DatabaseConfig};

    fn test_config(cors_origins: Vec<String>, production: bool) -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 5,
            },
        }
    }

    // Axum panics at build time on conflicting routes, so constructing the
    // router is itself a meaningful check. connect_lazy never touches the
    // network.

    #[tokio::test]
    async fn test_build_router_with_permissive_cors() {
        let pool = PgPool::connect_lazy("postgresql://localhost/test").unwrap();
        let state = AppState::new(pool, test_config(vec!["*".to_string()], false));

        let _router = build_router(state);
    }

    #[tokio::test]
    async fn test_build_router_with_explicit_origins() {
        let pool = PgPool::connect_lazy("postgresql://localhost/test").unwrap();
        let state = AppState::new(
            pool,
            test_config(vec!["https://deck.example".to_string()], true),
        );

        let _router = build_router(state);
    }
}
