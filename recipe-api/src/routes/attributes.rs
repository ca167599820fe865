/// Tag and ingredient endpoints
///
/// Tags and ingredients behave identically; each public handler is a thin
/// wrapper selecting an [`AttributeKind`].
///
/// # Endpoints
///
/// - `GET /api/recipe/tags[?assigned_only=1]` - List own tags
/// - `POST /api/recipe/tags` - Create a tag
/// - `GET /api/recipe/ingredients[?assigned_only=1]` - List own ingredients
/// - `POST /api/recipe/ingredients` - Create an ingredient

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiQuery},
    routes::not_blank,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use recipe_shared::{
    auth::middleware::AuthContext,
    models::attribute::{Attribute, AttributeKind, CreateAttribute},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Listing query
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Integer flag; any non-zero value restricts to attached rows
    pub assigned_only: Option<String>,
}

impl ListQuery {
    fn assigned_only(&self) -> ApiResult<bool> {
        match self.assigned_only.as_deref().map(str::trim) {
            None | Some("") => Ok(false),
            Some(raw) => raw
                .parse::<i64>()
                .map(|n| n != 0)
                .map_err(|_| ApiError::field("assigned_only", "A valid integer is required.")),
        }
    }
}

/// Create request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAttributeRequest {
    #[serde(default)]
    #[validate(
        custom(function = "not_blank", message = "This field may not be blank."),
        length(max = 255, message = "Ensure this field has no more than 255 characters.")
    )]
    pub name: String,
}

/// A tag or ingredient as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeItem {
    pub id: i64,
    pub name: String,
}

impl From<Attribute> for AttributeItem {
    fn from(attribute: Attribute) -> Self {
        Self {
            id: attribute.id,
            name: attribute.name,
        }
    }
}

async fn list(
    kind: AttributeKind,
    state: AppState,
    auth: AuthContext,
    query: ListQuery,
) -> ApiResult<Json<Vec<AttributeItem>>> {
    let assigned_only = query.assigned_only()?;

    let rows = Attribute::list_for_user(&state.db, kind, auth.user_id, assigned_only).await?;

    Ok(Json(rows.into_iter().map(AttributeItem::from).collect()))
}

async fn create(
    kind: AttributeKind,
    state: AppState,
    auth: AuthContext,
    req: CreateAttributeRequest,
) -> ApiResult<(StatusCode, Json<AttributeItem>)> {
    req.validate()?;

    let row = Attribute::create(
        &state.db,
        kind,
        CreateAttribute {
            user_id: auth.user_id,
            name: req.name.trim().to_string(),
        },
    )
    .await?;

    tracing::info!(kind = kind.field(), id = row.id, user_id = auth.user_id, "Created");

    Ok((StatusCode::CREATED, Json(row.into())))
}

/// List the caller's tags, name descending
///
/// # Response
///
/// ```json
/// [{ "id": 2, "name": "Vegan" }, { "id": 1, "name": "Dessert" }]
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: `assigned_only` is not an integer
/// - `401 Unauthorized`: Missing or invalid token
pub async fn list_tags(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<Vec<AttributeItem>>> {
    list(AttributeKind::Tag, state, auth, query).await
}

/// Create a tag owned by the caller
///
/// # Errors
///
/// - `400 Bad Request`: Missing or blank `name`
pub async fn create_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateAttributeRequest>,
) -> ApiResult<(StatusCode, Json<AttributeItem>)> {
    create(AttributeKind::Tag, state, auth, req).await
}

/// List the caller's ingredients, name descending
pub async fn list_ingredients(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<Vec<AttributeItem>>> {
    list(AttributeKind::Ingredient, state, auth, query).await
}

/// Create an ingredient owned by the caller
pub async fn create_ingredient(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateAttributeRequest>,
) -> ApiResult<(StatusCode, Json<AttributeItem>)> {
    create(AttributeKind::Ingredient, state, auth, req).await
}
