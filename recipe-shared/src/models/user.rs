/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     email CITEXT NOT NULL UNIQUE,
///     name VARCHAR(255) NOT NULL DEFAULT '',
///     password_hash VARCHAR(255) NOT NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     is_staff BOOLEAN NOT NULL DEFAULT FALSE,
///     is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use recipe_shared::models::user::{CreateUser, User};
/// # use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser::regular(
///     "cook@example.com".to_string(),
///     "$argon2id$...".to_string(),
///     "Cook".to_string(),
/// ))
/// .await?;
///
/// let found = User::find_by_email(&pool, "COOK@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

const USER_COLUMNS: &str = "id, email, name, password_hash, is_active, is_staff, is_superuser, \
                            created_at, updated_at, last_login_at";

/// A user account
///
/// Passwords are stored as Argon2id hashes; `password_hash` is never
/// serialized into API responses.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,

    /// Login identifier, unique case-insensitively (CITEXT)
    pub email: String,

    /// Display name, may be empty
    pub name: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Inactive users can neither log in nor use existing tokens
    pub is_active: bool,

    /// Grants access to the admin listing endpoints
    pub is_staff: bool,

    pub is_superuser: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address; normalized with [`normalize_email`] on insert
    pub email: String,

    /// Argon2id hash (NOT the plaintext password)
    pub password_hash: String,

    pub name: String,

    pub is_staff: bool,

    pub is_superuser: bool,
}

impl CreateUser {
    /// An ordinary account with no admin flags
    pub fn regular(email: String, password_hash: String, name: String) -> Self {
        Self {
            email,
            password_hash,
            name,
            is_staff: false,
            is_superuser: false,
        }
    }

    /// A superuser: staff and superuser flags both set
    pub fn superuser(email: String, password_hash: String, name: String) -> Self {
        Self {
            email,
            password_hash,
            name,
            is_staff: true,
            is_superuser: true,
        }
    }
}

/// Self-service profile changes; `None` fields are left alone
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,

    pub password_hash: Option<String>,
}

/// Lowercases the domain part of an email address
///
/// The local part is kept as given; some mail servers treat it as
/// case-sensitive.
///
/// # Example
///
/// ```
/// use recipe_shared::models::user::normalize_email;
///
/// assert_eq!(normalize_email("Cook@EXAMPLE.com"), "Cook@example.com");
/// assert_eq!(normalize_email("  no-at-sign "), "no-at-sign");
/// ```
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

impl User {
    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Fails with a database error on the `users_email_key` constraint when
    /// the email is already taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, password_hash, name, is_staff, is_superuser)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(&data.email))
            .bind(data.password_hash)
            .bind(data.name)
            .bind(data.is_staff)
            .bind(data.is_superuser)
            .fetch_one(pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive lookup by email
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(email))
            .fetch_optional(pool)
            .await
    }

    /// Applies profile changes
    ///
    /// Returns `None` if the user does not exist.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE users
             SET name = COALESCE($2, name),
                 password_hash = COALESCE($3, password_hash),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(data.name)
            .bind(data.password_hash)
            .fetch_optional(pool)
            .await
    }

    /// Stamps `last_login_at` after a successful credential exchange
    pub async fn update_last_login(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user; tokens, tags, ingredients and recipes cascade
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All users ordered by id, for the admin listing
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");

        sqlx::query_as::<_, User>(&query).fetch_all(pool).await
    }
}
