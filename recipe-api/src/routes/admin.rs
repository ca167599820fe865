/// Staff-only listings
///
/// Read-only views over every row, regardless of owner, for operators.
/// Staff accounts are created with the `recipe-admin create-superuser`
/// command.
///
/// # Endpoints
///
/// - `GET /api/admin/users` - All users, by id
/// - `GET /api/admin/tags` - All tags, by id
/// - `GET /api/admin/ingredients` - All ingredients, by id
/// - `GET /api/admin/recipes` - All recipes, by id
///
/// # Errors
///
/// - `401 Unauthorized`: Missing or invalid token
/// - `403 Forbidden`: Caller is not staff

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use recipe_shared::{
    auth::{authorization::require_staff, middleware::AuthContext},
    models::{
        attribute::{Attribute, AttributeKind},
        recipe::Recipe,
        user::User,
    },
};

/// Users; password hashes are never serialized
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<User>>> {
    require_staff(&auth)?;
    Ok(Json(User::list(&state.db).await?))
}

pub async fn list_tags(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Attribute>>> {
    require_staff(&auth)?;
    Ok(Json(Attribute::list_all(&state.db, AttributeKind::Tag).await?))
}

pub async fn list_ingredients(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Attribute>>> {
    require_staff(&auth)?;
    Ok(Json(Attribute::list_all(&state.db, AttributeKind::Ingredient).await?))
}

/// Recipes with their owner id and stored image path
pub async fn list_recipes(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Recipe>>> {
    require_staff(&auth)?;
    Ok(Json(Recipe::list_all(&state.db).await?))
}
