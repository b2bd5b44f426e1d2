/// Authentication middleware for Axum
///
/// This module provides middleware for bearer token authentication. The
/// middleware extracts the `Authorization: Token <key>` header, resolves it
/// against the `auth_tokens` table, and adds a [`Caller`] to the request
/// extensions.
///
/// Authentication is optional at this layer: a request without credentials
/// proceeds as [`Caller::Anonymous`]. Presenting credentials that do not
/// check out is an error, never a silent downgrade. Routes that require a
/// logged-in user stack [`require_auth`] on top.
///
/// # Request Extensions
///
/// After this middleware runs, every request carries:
/// - `Caller`: the resolved identity, anonymous or a user ID
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use sqlx::PgPool;
/// use taskdeck_shared::auth::middleware::{create_token_auth_middleware, require_auth};
/// use taskdeck_shared::visibility::Caller;
///
/// async fn whoami(Extension(caller): Extension<Caller>) -> String {
///     format!("{:?}", caller)
/// }
///
/// fn routes(pool: PgPool) -> Router {
///     Router::new()
///         .route("/whoami", get(whoami))
///         .route_layer(middleware::from_fn(require_auth))
///         .layer(middleware::from_fn(create_token_auth_middleware(pool)))
/// }
/// ```

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::PgPool;

use crate::auth::token::validate_key_format;
use crate::models::token::AuthToken;
use crate::visibility::Caller;

/// Error type for authentication middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No credentials on a route that requires them
    MissingCredentials,

    /// Authorization header present but malformed
    InvalidHeader(String),

    /// Key does not match any token
    InvalidToken,

    /// Key is valid but its user has been deactivated
    InactiveUser,

    /// Database error during token lookup
    DatabaseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                "Authentication credentials were not provided.".to_string(),
            ),
            AuthError::InvalidHeader(msg) => (StatusCode::UNAUTHORIZED, msg),
            AuthError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "Invalid token.".to_string())
            }
            AuthError::InactiveUser => (
                StatusCode::UNAUTHORIZED,
                "User inactive or deleted.".to_string(),
            ),
            AuthError::DatabaseError(msg) => {
                tracing::error!(error = %msg, "Token lookup failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let error = if status == StatusCode::UNAUTHORIZED {
            "unauthorized"
        } else {
            "internal_error"
        };

        // Same envelope the handlers use, so clients parse one shape
        let body = Json(json!({
            "error": error,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Parses an Authorization header value for the Token scheme
///
/// Returns `Ok(None)` when the header uses a different scheme; such
/// requests continue anonymously rather than being rejected, leaving room
/// for other authenticators in front of this one.
///
/// # Errors
///
/// Returns `AuthError::InvalidHeader` when the Token keyword is present
/// but the key is missing or contains spaces.
fn parse_token_header(value: &str) -> Result<Option<&str>, AuthError> {
    let mut parts = value.split_whitespace();

    match parts.next() {
        Some(keyword) if keyword.eq_ignore_ascii_case("token") => {
            let key = parts.next().ok_or_else(|| {
                AuthError::InvalidHeader(
                    "Invalid token header. No credentials provided.".to_string(),
                )
            })?;

            if parts.next().is_some() {
                return Err(AuthError::InvalidHeader(
                    "Invalid token header. Token string should not contain spaces.".to_string(),
                ));
            }

            Ok(Some(key))
        }
        _ => Ok(None),
    }
}

/// Token authentication middleware
///
/// Resolves the `Authorization: Token <key>` header to a [`Caller`] and
/// stores it in the request extensions. Requests without the header, or
/// with a different authorization scheme, continue as
/// [`Caller::Anonymous`].
///
/// # Errors
///
/// Returns 401 Unauthorized if:
/// - The Token header is malformed
/// - The key does not match any issued token
/// - The token's user is inactive
pub async fn token_auth_middleware(
    pool: PgPool,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let caller = match header_value {
        None => Caller::Anonymous,
        Some(value) => match parse_token_header(value)? {
            None => Caller::Anonymous,
            Some(key) => {
                // Issued keys are always 40 lowercase hex chars, so
                // anything else cannot be in the table
                if !validate_key_format(key) {
                    return Err(AuthError::InvalidToken);
                }

                let user = AuthToken::find_user_by_key(&pool, key)
                    .await
                    .map_err(|e| AuthError::DatabaseError(e.to_string()))?
                    .ok_or(AuthError::InvalidToken)?;

                if !user.is_active {
                    return Err(AuthError::InactiveUser);
                }

                Caller::User(user.id)
            }
        },
    };

    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}

/// Creates a token authentication middleware closure
///
/// Helper function that captures the database pool and returns a
/// middleware function for `axum::middleware::from_fn`.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use sqlx::PgPool;
/// use taskdeck_shared::auth::middleware::create_token_auth_middleware;
///
/// fn routes(pool: PgPool) -> Router {
///     Router::new()
///         .route("/tasks", get(|| async { "OK" }))
///         .layer(middleware::from_fn(create_token_auth_middleware(pool)))
/// }
/// ```
pub fn create_token_auth_middleware(
    pool: PgPool,
) -> impl Fn(Request, Next) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>> + Clone {
    move |req, next| {
        let pool = pool.clone();
        Box::pin(token_auth_middleware(pool, req, next))
    }
}

/// Rejects requests that did not authenticate
///
/// Expects [`token_auth_middleware`] to have run already; reads the
/// resolved [`Caller`] and turns anonymous requests into 401s. A missing
/// extension means the route was wired without the token layer and is
/// treated the same way.
pub async fn require_auth(req: Request, next: Next) -> Result<Response, AuthError> {
    match req.extensions().get::<Caller>() {
        Some(caller) if caller.is_authenticated() => Ok(next.run(req).await),
        _ => Err(AuthError::MissingCredentials),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_header_valid() {
        let key = "a".repeat(40);
        let value = format!("Token {}", key);

        assert_eq!(parse_token_header(&value), Ok(Some(key.as_str())));

        // Keyword is case-insensitive
        let value = format!("token {}", key);
        assert_eq!(parse_token_header(&value), Ok(Some(key.as_str())));
    }

    #[test]
    fn test_parse_token_header_other_scheme_is_anonymous() {
        assert_eq!(parse_token_header("Bearer abc123"), Ok(None));
        assert_eq!(parse_token_header("Basic dXNlcjpwYXNz"), Ok(None));
    }

    #[test]
    fn test_parse_token_header_missing_key() {
        let result = parse_token_header("Token");
        assert_eq!(
            result,
            Err(AuthError::InvalidHeader(
                "Invalid token header. No credentials provided.".to_string()
            ))
        );
    }

    #[test]
    fn test_parse_token_header_spaces_in_key() {
        let result = parse_token_header("Token abc def");
        assert_eq!(
            result,
            Err(AuthError::InvalidHeader(
                "Invalid token header. Token string should not contain spaces.".to_string()
            ))
        );
    }

    #[test]
    fn test_auth_error_into_response() {
        let response = AuthError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::InvalidToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::InactiveUser.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::InvalidHeader("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthError::DatabaseError("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
