/// Account endpoints
///
/// This module provides registration and session management:
/// - Registration (issues a token immediately)
/// - Login (returns the existing token, creating one on first login)
/// - Logout (revokes the token)
/// - Auth check (probe for a valid token)
///
/// # Endpoints
///
/// - `POST /users/register/` - Register a new account
/// - `POST /users/login/` - Exchange credentials for a token
/// - `POST /users/logout/` - Revoke the caller's token
/// - `GET /users/auth-check/` - 200 when authenticated
///
/// Failed logins answer 400 with a `non_field_errors` entry rather than
/// 401: the caller's request was well-formed HTTP without credentials
/// being at fault, and the uniform message avoids confirming whether the
/// username exists.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::{
    app::AppState,
    error::{ApiError, ApiJson, ApiResult, ValidationErrorDetail},
};
use taskdeck_shared::{
    auth::password::{hash_password, verify_password},
    models::token::AuthToken,
    models::user::{CreateUser, User},
    visibility::Caller,
};

/// Register request
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    /// Desired username (required)
    pub username: Option<String>,

    /// First name (required)
    pub first_name: Option<String>,

    /// Last name (required)
    pub last_name: Option<String>,

    /// Email address (required)
    pub email: Option<String>,

    /// Password (required)
    pub password: Option<String>,

    /// Password confirmation; must equal `password`
    pub password2: Option<String>,
}

/// Field values that passed request validation
#[derive(Debug)]
struct ValidatedRegistration {
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    password: String,
}

impl RegisterRequest {
    /// Validates the request fields
    ///
    /// Per-field problems are all reported in one response. The password
    /// match check only runs once every field is individually valid, so a
    /// missing password never also reports a mismatch.
    fn validate(self) -> Result<ValidatedRegistration, ApiError> {
        let mut errors = Vec::new();

        let username = require_text("username", self.username.as_deref(), &mut errors);
        let first_name = require_text("first_name", self.first_name.as_deref(), &mut errors);
        let last_name = require_text("last_name", self.last_name.as_deref(), &mut errors);

        let email = match require_text("email", self.email.as_deref(), &mut errors) {
            Some(email) if !email.validate_email() => {
                errors.push(ValidationErrorDetail::new(
                    "email",
                    "Enter a valid email address.",
                ));
                None
            }
            other => other,
        };

        let password = require_text("password", self.password.as_deref(), &mut errors);
        let password2 = require_text("password2", self.password2.as_deref(), &mut errors);

        if !errors.is_empty() {
            return Err(ApiError::ValidationError(errors));
        }

        // All unwraps below are guarded by the empty error list
        let password = password.unwrap_or_default();
        if Some(&password) != password2.as_ref() {
            return Err(ApiError::field_error(
                "password",
                "password and password2 must match",
            ));
        }

        Ok(ValidatedRegistration {
            username: username.unwrap_or_default(),
            first_name: first_name.unwrap_or_default(),
            last_name: last_name.unwrap_or_default(),
            email: email.unwrap_or_default(),
            password,
        })
    }
}

/// Register response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// New user ID
    pub id: Uuid,

    /// Username as stored
    pub username: String,

    /// First name as stored
    pub first_name: String,

    /// Last name as stored
    pub last_name: String,

    /// Email as stored
    pub email: String,

    /// Token for immediate use; the same key login would return
    pub token: String,
}

/// Login request
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    /// Username (required)
    pub username: Option<String>,

    /// Password (required)
    pub password: Option<String>,
}

impl LoginRequest {
    /// Validates presence of both credentials
    fn validate(self) -> Result<(String, String), ApiError> {
        let mut errors = Vec::new();

        let username = require_text("username", self.username.as_deref(), &mut errors);
        let password = require_text("password", self.password.as_deref(), &mut errors);

        if errors.is_empty() {
            Ok((username.unwrap_or_default(), password.unwrap_or_default()))
        } else {
            Err(ApiError::ValidationError(errors))
        }
    }
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// The user's token key
    pub token: String,
}

/// Checks a required text field, recording missing or blank values
///
/// Values are trimmed before any check, so whitespace-only input counts
/// as blank and padded input is stored without the padding.
fn require_text(
    field: &str,
    value: Option<&str>,
    errors: &mut Vec<ValidationErrorDetail>,
) -> Option<String> {
    match value.map(str::trim) {
        None => {
            errors.push(ValidationErrorDetail::new(field, "This field is required."));
            None
        }
        Some("") => {
            errors.push(ValidationErrorDetail::new(
                field,
                "This field may not be blank.",
            ));
            None
        }
        Some(text) => Some(text.to_string()),
    }
}

/// The uniform login failure
///
/// Used for unknown usernames, wrong passwords, and disabled accounts
/// alike so the response never discloses which part was wrong.
fn login_failed() -> ApiError {
    ApiError::field_error(
        "non_field_errors",
        "Unable to log in with provided credentials.",
    )
}

/// Register a new account
///
/// Creates the user, hashes the password, and issues a token in one go so
/// the client can start making authenticated calls without a separate
/// login.
///
/// # Endpoint
///
/// ```text
/// POST /users/register/
/// Content-Type: application/json
///
/// {
///   "username": "ada",
///   "first_name": "Ada",
///   "last_name": "Lovelace",
///   "email": "ada@example.com",
///   "password": "notes-on-the-engine",
///   "password2": "notes-on-the-engine"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "id": "6a0f...",
///   "username": "ada",
///   "first_name": "Ada",
///   "last_name": "Lovelace",
///   "email": "ada@example.com",
///   "token": "9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing fields, mismatched passwords, or an
///   already-taken email or username
/// - `500 Internal Server Error`: Server error
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let fields = req.validate()?;

    if User::email_exists(&state.db, &fields.email).await? {
        return Err(ApiError::field_error("email", "Email already taken"));
    }

    if User::username_exists(&state.db, &fields.username).await? {
        return Err(ApiError::field_error(
            "username",
            "A user with that username already exists.",
        ));
    }

    let password_hash = hash_password(&fields.password)?;

    // A concurrent register with the same username or email slips past the
    // checks above; the unique constraints catch it and the sqlx error
    // converts to the same field errors
    let user = User::create(
        &state.db,
        CreateUser {
            username: fields.username,
            email: fields.email,
            password_hash,
            first_name: fields.first_name,
            last_name: fields.last_name,
        },
    )
    .await?;

    let token = AuthToken::get_or_create(&state.db, user.id).await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            token: token.key,
        }),
    ))
}

/// Exchange credentials for a token
///
/// Returns the user's standing token, creating one on first login. The
/// same key comes back on every successful login until logout revokes it.
///
/// # Endpoint
///
/// ```text
/// POST /users/login/
/// Content-Type: application/json
///
/// {
///   "username": "ada",
///   "password": "notes-on-the-engine"
/// }
/// ```
///
/// # Response
///
/// ```json
/// { "token": "9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing fields or credentials that don't check out
/// - `500 Internal Server Error`: Server error
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (username, password) = req.validate()?;

    let user = User::find_by_username(&state.db, &username)
        .await?
        .ok_or_else(login_failed)?;

    if !verify_password(&password, &user.password_hash)? {
        return Err(login_failed());
    }

    if !user.is_active {
        return Err(login_failed());
    }

    User::update_last_login(&state.db, user.id).await?;

    let token = AuthToken::get_or_create(&state.db, user.id).await?;

    tracing::debug!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse { token: token.key }))
}

/// Revoke the caller's token
///
/// After this the revoked key is rejected everywhere; the next login
/// issues a fresh one.
///
/// # Endpoint
///
/// ```text
/// POST /users/logout/
/// Authorization: Token <key>
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid credentials
pub async fn logout(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<StatusCode> {
    let user_id = caller.owner_id().ok_or_else(|| {
        ApiError::Unauthorized("Authentication credentials were not provided.".to_string())
    })?;

    AuthToken::delete_for_user(&state.db, user_id).await?;

    tracing::debug!(user_id = %user_id, "User logged out");

    Ok(StatusCode::OK)
}

/// Probe for a valid token
///
/// The route's auth layer does all the work; reaching the handler means
/// the credentials were good.
///
/// # Endpoint
///
/// ```text
/// GET /users/auth-check/
/// Authorization: Token <key>
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid credentials
pub async fn auth_check() -> StatusCode {
    StatusCode::OK
}
