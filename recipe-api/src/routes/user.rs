/// User account endpoints
///
/// - Sign up
/// - Token exchange
/// - Own profile read/update
///
/// # Endpoints
///
/// - `POST /api/user/create` - Create an account
/// - `POST /api/user/token` - Exchange email and password for a token
/// - `GET /api/user/me` - Current user
/// - `PATCH /api/user/me` - Change name and/or password

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::ApiJson,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use recipe_shared::{
    auth::{middleware::AuthContext, password},
    models::{
        auth_token::AuthToken,
        user::{CreateUser, UpdateUser, User},
    },
};
use serde::{Deserialize, Serialize};
use validator::Validate;

const BLANK: &str = "This field may not be blank.";

/// Sign-up request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    pub password: String,

    #[serde(default)]
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub name: String,
}

/// Token exchange request
///
/// Both fields default to empty so a missing field reports the same way as
/// a blank one.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub password: String,
}

/// Token exchange response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Profile update request; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMeRequest {
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub name: Option<String>,

    pub password: Option<String>,
}

/// Public view of a user
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}

/// Collects derive and password-length errors into one validation error
fn check(request: &impl Validate, new_password: Option<&str>) -> ApiResult<()> {
    let mut details = match request.validate() {
        Ok(()) => Vec::new(),
        Err(e) => match ApiError::from(e) {
            ApiError::ValidationError(details) => details,
            other => return Err(other),
        },
    };

    if let Some(Err(message)) = new_password.map(password::validate_password_length) {
        details.push(ValidationErrorDetail {
            field: "password".to_string(),
            message,
        });
    }

    if details.is_empty() {
        Ok(())
    } else {
        Err(ApiError::ValidationError(details))
    }
}

/// Create a user
///
/// # Endpoint
///
/// ```text
/// POST /api/user/create
/// Content-Type: application/json
///
/// { "email": "cook@example.com", "password": "testpass123", "name": "Cook" }
/// ```
///
/// # Response
///
/// `201 Created` with `{ "email": "cook@example.com", "name": "Cook" }`.
///
/// # Errors
///
/// - `400 Bad Request`: Invalid or taken email, password shorter than 5
///   characters, malformed body
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    check(&req, Some(&req.password))?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser::regular(req.email, password_hash, req.name.trim().to_string()),
    )
    .await?;

    tracing::info!(user_id = user.id, "User created");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Exchange credentials for a token
///
/// Issues a fresh token on every call; the previous one stops working.
///
/// # Endpoint
///
/// ```text
/// POST /api/user/token
/// Content-Type: application/json
///
/// { "email": "cook@example.com", "password": "testpass123" }
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
/// - `400 Bad Request`: Blank email or password
/// - `401 Unauthorized`: Wrong credentials or inactive account
pub async fn obtain_token(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TokenRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let mut blank = Vec::new();
    for (field, value) in [("email", &req.email), ("password", &req.password)] {
        if value.trim().is_empty() {
            blank.push(ValidationErrorDetail {
                field: field.to_string(),
                message: BLANK.to_string(),
            });
        }
    }
    if !blank.is_empty() {
        return Err(ApiError::ValidationError(blank));
    }

    let rejected =
        || ApiError::Unauthorized("Unable to authenticate with provided credentials.".to_string());

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(rejected)?;

    if !password::verify_password(&req.password, &user.password_hash)? || !user.is_active {
        tracing::debug!(user_id = user.id, "Credential exchange rejected");
        return Err(rejected());
    }

    let (_, token) = AuthToken::issue(&state.db, user.id).await?;
    User::update_last_login(&state.db, user.id).await?;

    tracing::info!(user_id = user.id, "Token issued");

    Ok(Json(TokenResponse { token }))
}

/// Current user
///
/// # Endpoint
///
/// ```text
/// GET /api/user/me
/// Authorization: Token <key>
/// ```
pub async fn get_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(user.into()))
}

/// Update the current user
///
/// Only `name` and `password` can change; other fields in the body are
/// ignored.
///
/// # Errors
///
/// - `400 Bad Request`: Password shorter than 5 characters, name too long
/// - `401 Unauthorized`: Missing or invalid token
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<UpdateMeRequest>,
) -> ApiResult<Json<UserResponse>> {
    check(&req, req.password.as_deref())?;

    let password_hash = req
        .password
        .as_deref()
        .map(password::hash_password)
        .transpose()?;

    let user = User::update(
        &state.db,
        auth.user_id,
        UpdateUser {
            name: req.name.map(|n| n.trim().to_string()),
            password_hash,
        },
    )
    .await?
    .ok_or_else(ApiError::not_found)?;

    tracing::info!(user_id = user.id, "User updated");

    Ok(Json(user.into()))
}
