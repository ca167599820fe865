/// Auth token model
///
/// Each user has at most one token. Issuing a token replaces the previous
/// one, so only the most recent credential exchange stays valid.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE auth_tokens (
///     key_hash VARCHAR(64) PRIMARY KEY,
///     user_id BIGINT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::user::User;
use crate::auth::token;

/// A stored token (hash only)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthToken {
    /// SHA-256 of the key handed to the client
    pub key_hash: String,

    pub user_id: i64,

    pub created_at: DateTime<Utc>,
}

impl AuthToken {
    /// Issues a new token for `user_id`, replacing any existing one
    ///
    /// Returns the stored row and the plaintext key. The key is not
    /// recoverable afterwards.
    pub async fn issue(pool: &PgPool, user_id: i64) -> Result<(Self, String), sqlx::Error> {
        let (key, key_hash) = token::generate_key();

        let row = sqlx::query_as::<_, AuthToken>(
            r#"
            INSERT INTO auth_tokens (key_hash, user_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id)
            DO UPDATE SET key_hash = EXCLUDED.key_hash, created_at = NOW()
            RETURNING key_hash, user_id, created_at
            "#,
        )
        .bind(key_hash)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok((row, key))
    }

    /// Resolves a plaintext key to its user
    ///
    /// Returns `None` for unknown keys. Whether the user is active is left to
    /// the caller.
    pub async fn find_user(pool: &PgPool, key: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.name, u.password_hash, u.is_active, u.is_staff,
                   u.is_superuser, u.created_at, u.updated_at, u.last_login_at
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.key_hash = $1
            "#,
        )
        .bind(token::hash_key(key))
        .fetch_optional(pool)
        .await
    }
}
