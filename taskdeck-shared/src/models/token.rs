/// Bearer token model and database operations
///
/// Each user holds at most one live token at a time, enforced by the UNIQUE
/// constraint on `user_id`. Keys are stored verbatim: login returns the
/// user's existing key when one exists, which rules out one-way storage.
/// Possession of a key is the only credential, so the table should be
/// treated with the same care as password hashes.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE auth_tokens (
///     key VARCHAR(64) PRIMARY KEY,
///     user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::models::token::AuthToken;
/// use taskdeck_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// // First call creates, later calls return the same key
/// let token = AuthToken::get_or_create(&pool, user_id).await?;
/// let again = AuthToken::get_or_create(&pool, user_id).await?;
/// assert_eq!(token.key, again.key);
///
/// // Logout
/// AuthToken::delete_for_user(&pool, user_id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::token::generate_key;
use crate::models::user::User;

/// Bearer token granting authenticated access
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuthToken {
    /// Opaque 40-char hex key presented in the Authorization header
    pub key: String,

    /// The user this token authenticates
    pub user_id: Uuid,

    /// When the token was issued
    pub created_at: DateTime<Utc>,
}

impl AuthToken {
    /// Returns the user's token, creating one if absent
    ///
    /// The read-or-create is a single upsert so concurrent logins by the
    /// same user all observe one surviving key: the conflicting insert
    /// degrades to a no-op update and the RETURNING clause hands back the
    /// existing row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_or_create(pool: &PgPool, user_id: Uuid) -> Result<Self, sqlx::Error> {
        let candidate = generate_key();

        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            INSERT INTO auth_tokens (key, user_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING key, user_id, created_at
            "#,
        )
        .bind(candidate)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(token)
    }

    /// Finds the token held by a user, if any
    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            SELECT key, user_id, created_at
            FROM auth_tokens
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(token)
    }

    /// Resolves a presented key to its user
    ///
    /// Returns the full user record so the caller can also check
    /// `is_active`; an unknown key yields `None`.
    pub async fn find_user_by_key(pool: &PgPool, key: &str) -> Result<Option<User>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.email, u.password_hash, u.first_name, u.last_name,
                   u.is_active, u.created_at, u.last_login_at
            FROM users u
            JOIN auth_tokens t ON t.user_id = u.id
            WHERE t.key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Deletes the user's token (logout)
    ///
    /// # Returns
    ///
    /// True if a token was deleted, false if the user held none
    pub async fn delete_for_user(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
