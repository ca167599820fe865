/// Recipe endpoints
///
/// Every query is scoped to the authenticated user: another user's recipe
/// is indistinguishable from a missing one (404).
///
/// # Endpoints
///
/// - `GET /api/recipe/recipes[?tags=1,2&ingredients=3]` - List own recipes
/// - `POST /api/recipe/recipes` - Create a recipe
/// - `GET /api/recipe/recipes/:id` - Recipe detail
/// - `PUT /api/recipe/recipes/:id` - Full update
/// - `PATCH /api/recipe/recipes/:id` - Partial update
/// - `DELETE /api/recipe/recipes/:id` - Delete
/// - `POST /api/recipe/recipes/:id/upload-image` - Attach an image (multipart)
///
/// # PUT vs PATCH
///
/// PATCH touches only the fields present in the body. PUT requires `title`,
/// `time_minutes` and `price`; an omitted `link` resets to empty and an
/// omitted `tags`/`ingredients` list clears the association.

use std::collections::HashMap;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::{ApiJson, ApiPath, ApiQuery},
    routes::{attributes::AttributeItem, not_blank},
};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use recipe_shared::{
    auth::middleware::AuthContext,
    models::{
        attribute::{Attribute, AttributeKind},
        recipe::{CreateRecipe, Recipe, RecipeFilter, UpdateRecipe},
    },
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

const REQUIRED: &str = "This field is required.";

const NOT_NULL: &str = "This field may not be null.";

/// Multipart field carrying the image
const IMAGE_FIELD: &str = "image";

/// Recipe request body, shared by create, PUT and PATCH
///
/// Every field is optional at the type level; [`PayloadMode`] decides which
/// ones must be present. Fields sent as an explicit `null` are recorded in
/// `null_fields` and rejected by [`RecipePayload::check`].
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(from = "RawRecipePayload")]
pub struct RecipePayload {
    #[validate(
        custom(function = "not_blank", message = "This field may not be blank."),
        length(max = 255, message = "Ensure this field has no more than 255 characters.")
    )]
    pub title: Option<String>,

    #[validate(range(
        min = 0,
        max = 2147483647,
        message = "Ensure this value is between 0 and 2147483647."
    ))]
    pub time_minutes: Option<i64>,

    #[validate(custom(function = "valid_price"))]
    pub price: Option<Decimal>,

    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub link: Option<String>,

    pub tags: Option<Vec<i64>>,

    pub ingredients: Option<Vec<i64>>,

    pub null_fields: Vec<&'static str>,
}

/// Wire form of [`RecipePayload`]: the outer `Option` is presence, the inner
/// one is `null`
#[derive(Deserialize)]
struct RawRecipePayload {
    #[serde(default, deserialize_with = "present")]
    title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    time_minutes: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "present")]
    link: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    tags: Option<Option<Vec<i64>>>,
    #[serde(default, deserialize_with = "present")]
    ingredients: Option<Option<Vec<i64>>>,
}

/// Marks a key as present, keeping `null` distinct from absent
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl From<RawRecipePayload> for RecipePayload {
    fn from(raw: RawRecipePayload) -> Self {
        let mut nulls = Vec::new();

        Self {
            title: non_null(&mut nulls, "title", raw.title),
            time_minutes: non_null(&mut nulls, "time_minutes", raw.time_minutes),
            price: non_null(&mut nulls, "price", raw.price),
            link: non_null(&mut nulls, "link", raw.link),
            tags: non_null(&mut nulls, "tags", raw.tags),
            ingredients: non_null(&mut nulls, "ingredients", raw.ingredients),
            null_fields: nulls,
        }
    }
}

fn non_null<T>(nulls: &mut Vec<&'static str>, field: &'static str, value: Option<Option<T>>) -> Option<T> {
    match value {
        Some(None) => {
            nulls.push(field);
            None
        }
        other => other.flatten(),
    }
}

/// How a [`RecipePayload`] is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadMode {
    Create,
    Replace,
    Patch,
}

impl PayloadMode {
    fn requires_core_fields(self) -> bool {
        !matches!(self, PayloadMode::Patch)
    }
}

/// Prices are `NUMERIC(5,2)`: non-negative, two decimal places, below 1000
fn valid_price(price: &Decimal) -> Result<(), ValidationError> {
    let message = if price.is_sign_negative() && !price.is_zero() {
        "Ensure this value is greater than or equal to 0."
    } else if price.normalize().scale() > 2 {
        "Ensure that there are no more than 2 decimal places."
    } else if *price >= Decimal::from(1000) {
        "Ensure that there are no more than 5 digits in total."
    } else {
        return Ok(());
    };

    Err(ValidationError::new("price").with_message(message.into()))
}

impl RecipePayload {
    /// Field-level validation, required fields and attachment ids
    ///
    /// All problems are reported together.
    pub async fn check(&self, state: &AppState, mode: PayloadMode) -> ApiResult<()> {
        let mut details = match self.validate() {
            Ok(()) => Vec::new(),
            Err(e) => match ApiError::from(e) {
                ApiError::ValidationError(details) => details,
                other => return Err(other),
            },
        };

        for field in &self.null_fields {
            details.push(ValidationErrorDetail {
                field: field.to_string(),
                message: NOT_NULL.to_string(),
            });
        }

        if mode.requires_core_fields() {
            for (field, supplied) in [
                ("title", self.title.is_some()),
                ("time_minutes", self.time_minutes.is_some()),
                ("price", self.price.is_some()),
            ] {
                if !supplied && !self.null_fields.contains(&field) {
                    details.push(ValidationErrorDetail {
                        field: field.to_string(),
                        message: REQUIRED.to_string(),
                    });
                }
            }
        }

        for (kind, ids) in [
            (AttributeKind::Tag, &self.tags),
            (AttributeKind::Ingredient, &self.ingredients),
        ] {
            let Some(ids) = ids else { continue };
            for id in Attribute::missing_ids(&state.db, kind, ids).await? {
                details.push(ValidationErrorDetail {
                    field: kind.field().to_string(),
                    message: format!("Invalid pk \"{id}\" - object does not exist."),
                });
            }
        }

        if details.is_empty() {
            Ok(())
        } else {
            details.sort_by(|a, b| a.field.cmp(&b.field));
            Err(ApiError::ValidationError(details))
        }
    }

    fn time_minutes(&self) -> ApiResult<Option<i32>> {
        self.time_minutes
            .map(i32::try_from)
            .transpose()
            .map_err(|_| ApiError::field("time_minutes", "Ensure this value is between 0 and 2147483647."))
    }

    fn price(&self) -> Option<Decimal> {
        self.price.map(|p| p.round_dp(2))
    }

    /// Changes for PUT (`Replace`) or PATCH; call after [`Self::check`]
    fn into_update(self, mode: PayloadMode) -> ApiResult<UpdateRecipe> {
        let time_minutes = self.time_minutes()?;
        let price = self.price();
        let title = self.title.map(|t| t.trim().to_string());

        Ok(match mode {
            PayloadMode::Patch => UpdateRecipe {
                title,
                time_minutes,
                price,
                link: self.link,
                tags: self.tags,
                ingredients: self.ingredients,
            },
            PayloadMode::Create | PayloadMode::Replace => UpdateRecipe {
                title,
                time_minutes,
                price,
                link: Some(self.link.unwrap_or_default()),
                tags: Some(self.tags.unwrap_or_default()),
                ingredients: Some(self.ingredients.unwrap_or_default()),
            },
        })
    }
}

/// List filters as comma-separated id lists
#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

impl RecipeListQuery {
    fn filter(&self) -> ApiResult<RecipeFilter> {
        Ok(RecipeFilter {
            tags: parse_id_list("tags", self.tags.as_deref())?,
            ingredients: parse_id_list("ingredients", self.ingredients.as_deref())?,
        })
    }
}

/// Parses `"1,2,3"`; blank input means no filter
fn parse_id_list(field: &str, raw: Option<&str>) -> ApiResult<Option<Vec<i64>>> {
    let Some(raw) = raw else { return Ok(None) };

    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| ApiError::field(field, format!("\"{part}\" is not a valid id.")))
        })
        .collect::<ApiResult<Vec<i64>>>()?;

    Ok((!ids.is_empty()).then_some(ids))
}

/// List and write view: attachments as ids
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub ingredients: Vec<i64>,
    pub tags: Vec<i64>,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
}

/// Detail view: attachments nested, plus the image URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub title: String,
    pub ingredients: Vec<AttributeItem>,
    pub tags: Vec<AttributeItem>,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub image: Option<String>,
}

/// Upload response
#[derive(Debug, Serialize, Deserialize)]
pub struct ImageResponse {
    pub id: i64,
    pub image: String,
}

async fn summaries(state: &AppState, recipes: Vec<Recipe>) -> ApiResult<Vec<RecipeSummary>> {
    let ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();

    let mut tags = Attribute::ids_by_recipe(&state.db, AttributeKind::Tag, &ids).await?;
    let mut ingredients =
        Attribute::ids_by_recipe(&state.db, AttributeKind::Ingredient, &ids).await?;

    Ok(recipes
        .into_iter()
        .map(|recipe| summary(recipe, &mut tags, &mut ingredients))
        .collect())
}

fn summary(
    recipe: Recipe,
    tags: &mut HashMap<i64, Vec<i64>>,
    ingredients: &mut HashMap<i64, Vec<i64>>,
) -> RecipeSummary {
    RecipeSummary {
        id: recipe.id,
        title: recipe.title,
        ingredients: ingredients.remove(&recipe.id).unwrap_or_default(),
        tags: tags.remove(&recipe.id).unwrap_or_default(),
        time_minutes: recipe.time_minutes,
        price: recipe.price,
        link: recipe.link,
    }
}

async fn single_summary(state: &AppState, recipe: Recipe) -> ApiResult<RecipeSummary> {
    summaries(state, vec![recipe])
        .await?
        .pop()
        .ok_or_else(|| ApiError::InternalError("Recipe summary went missing".to_string()))
}

async fn owned(state: &AppState, auth: &AuthContext, id: i64) -> ApiResult<Recipe> {
    Recipe::find_for_user(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(ApiError::not_found)
}

/// List the caller's recipes, newest first
///
/// # Query
///
/// - `tags`: comma-separated tag ids; a recipe matches if it has any of them
/// - `ingredients`: same, for ingredients
///
/// With both set a recipe must match each. A recipe matching several ids is
/// listed once.
///
/// # Errors
///
/// - `400 Bad Request`: A filter id is not an integer
pub async fn list_recipes(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<RecipeListQuery>,
) -> ApiResult<Json<Vec<RecipeSummary>>> {
    let filter = query.filter()?;

    let recipes = Recipe::list_for_user(&state.db, auth.user_id, &filter).await?;

    Ok(Json(summaries(&state, recipes).await?))
}

/// Create a recipe owned by the caller
///
/// # Endpoint
///
/// ```text
/// POST /api/recipe/recipes
/// Content-Type: application/json
///
/// { "title": "Spaghetti", "time_minutes": 30, "price": "5.00", "tags": [1] }
/// ```
///
/// # Response
///
/// `201 Created` with a [`RecipeSummary`].
///
/// # Errors
///
/// - `400 Bad Request`: Missing or invalid fields, unknown tag/ingredient ids
pub async fn create_recipe(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(payload): ApiJson<RecipePayload>,
) -> ApiResult<(StatusCode, Json<RecipeSummary>)> {
    payload.check(&state, PayloadMode::Create).await?;

    let update = payload.into_update(PayloadMode::Create)?;
    let (Some(title), Some(time_minutes), Some(price)) =
        (update.title, update.time_minutes, update.price)
    else {
        return Err(ApiError::InternalError("Checked payload lost a required field".to_string()));
    };

    let recipe = Recipe::create(
        &state.db,
        CreateRecipe {
            user_id: auth.user_id,
            title,
            time_minutes,
            price,
            link: update.link.unwrap_or_default(),
            tags: update.tags.unwrap_or_default(),
            ingredients: update.ingredients.unwrap_or_default(),
        },
    )
    .await?;

    tracing::info!(recipe_id = recipe.id, user_id = auth.user_id, "Recipe created");

    Ok((StatusCode::CREATED, Json(single_summary(&state, recipe).await?)))
}

/// Recipe detail with nested tags and ingredients
///
/// # Response
///
/// ```json
/// {
///   "id": 1,
///   "title": "Spaghetti",
///   "ingredients": [{ "id": 3, "name": "Pasta" }],
///   "tags": [{ "id": 1, "name": "Italian" }],
///   "time_minutes": 30,
///   "price": "5.00",
///   "link": "",
///   "image": null
/// }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: No such recipe owned by the caller
pub async fn retrieve_recipe(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<RecipeDetail>> {
    let recipe = owned(&state, &auth, id).await?;

    let tags = Attribute::list_for_recipe(&state.db, AttributeKind::Tag, recipe.id).await?;
    let ingredients =
        Attribute::list_for_recipe(&state.db, AttributeKind::Ingredient, recipe.id).await?;

    Ok(Json(RecipeDetail {
        id: recipe.id,
        title: recipe.title,
        ingredients: ingredients.into_iter().map(AttributeItem::from).collect(),
        tags: tags.into_iter().map(AttributeItem::from).collect(),
        time_minutes: recipe.time_minutes,
        price: recipe.price,
        link: recipe.link,
        image: recipe.image.as_deref().map(|path| state.media.url_for(path)),
    }))
}

async fn update(
    state: AppState,
    auth: AuthContext,
    id: i64,
    payload: RecipePayload,
    mode: PayloadMode,
) -> ApiResult<Json<RecipeSummary>> {
    owned(&state, &auth, id).await?;
    payload.check(&state, mode).await?;

    let recipe = Recipe::update_for_user(&state.db, id, auth.user_id, payload.into_update(mode)?)
        .await?
        .ok_or_else(ApiError::not_found)?;

    tracing::info!(recipe_id = recipe.id, ?mode, "Recipe updated");

    Ok(Json(single_summary(&state, recipe).await?))
}

/// Full update (PUT)
///
/// # Errors
///
/// - `400 Bad Request`: Missing `title`, `time_minutes` or `price`, invalid
///   values, unknown ids
/// - `404 Not Found`: No such recipe owned by the caller
pub async fn replace_recipe(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<RecipePayload>,
) -> ApiResult<Json<RecipeSummary>> {
    update(state, auth, id, payload, PayloadMode::Replace).await
}

/// Partial update (PATCH)
pub async fn partial_update_recipe(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<RecipePayload>,
) -> ApiResult<Json<RecipeSummary>> {
    update(state, auth, id, payload, PayloadMode::Patch).await
}

/// Delete a recipe and its stored image
///
/// # Errors
///
/// - `404 Not Found`: No such recipe owned by the caller
pub async fn delete_recipe(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    let recipe = Recipe::delete_for_user(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    if let Some(image) = recipe.image.as_deref() {
        state.media.remove(image).await;
    }

    tracing::info!(recipe_id = recipe.id, user_id = auth.user_id, "Recipe deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Attach an image to a recipe
///
/// # Endpoint
///
/// ```text
/// POST /api/recipe/recipes/:id/upload-image
/// Content-Type: multipart/form-data; boundary=...
///
/// image=<file>
/// ```
///
/// # Response
///
/// ```json
/// { "id": 1, "image": "/media/uploads/recipe/0b5e....png" }
/// ```
///
/// The previous image file, if any, is removed.
///
/// # Errors
///
/// - `400 Bad Request`: No `image` field, or the file is not a JPEG, PNG,
///   GIF or WebP image; the stored image is left as it was
/// - `404 Not Found`: No such recipe owned by the caller
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ImageResponse>> {
    owned(&state, &auth, id).await?;
    let mut multipart = multipart?;

    let mut data = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(IMAGE_FIELD) {
            data = Some(field.bytes().await?);
            break;
        }
    }
    let data = data.ok_or_else(|| ApiError::field(IMAGE_FIELD, "No file was submitted."))?;

    let stored = state.media.save_recipe_image(&data).await?;

    let (updated, previous) = match Recipe::set_image(&state.db, id, auth.user_id, &stored).await {
        Ok(Some(swapped)) => swapped,
        Ok(None) => {
            // Deleted while the upload was in flight
            state.media.remove(&stored).await;
            return Err(ApiError::not_found());
        }
        Err(e) => {
            state.media.remove(&stored).await;
            return Err(e.into());
        }
    };

    if let Some(previous) = previous.as_deref() {
        state.media.remove(previous).await;
    }

    tracing::info!(recipe_id = id, image = %stored, bytes = data.len(), "Recipe image stored");

    Ok(Json(ImageResponse {
        id: updated.id,
        image: state.media.url_for(&stored),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_id_list() {
        assert_eq!(parse_id_list("tags", None).unwrap(), None);
        assert_eq!(parse_id_list("tags", Some("")).unwrap(), None);
        assert_eq!(parse_id_list("tags", Some(" , ")).unwrap(), None);
        assert_eq!(parse_id_list("tags", Some("1, 2,3")).unwrap(), Some(vec![1, 2, 3]));

        match parse_id_list("tags", Some("1,abc")).unwrap_err() {
            ApiError::ValidationError(details) => assert_eq!(details[0].field, "tags"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_valid_price() {
        assert!(valid_price(&dec("5.50")).is_ok());
        assert!(valid_price(&dec("0")).is_ok());
        assert!(valid_price(&dec("999.99")).is_ok());
        assert!(valid_price(&dec("5.500")).is_ok());

        assert!(valid_price(&dec("-1.00")).is_err());
        assert!(valid_price(&dec("5.555")).is_err());
        assert!(valid_price(&dec("1000")).is_err());
    }

    #[test]
    fn test_payload_field_validation() {
        let payload = RecipePayload {
            title: Some("  ".to_string()),
            time_minutes: Some(-1),
            price: Some(dec("1.234")),
            ..Default::default()
        };

        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("time_minutes"));
        assert!(fields.contains_key("price"));
    }

    #[test]
    fn test_explicit_null_is_recorded() {
        let payload: RecipePayload =
            serde_json::from_value(serde_json::json!({"title": null, "price": "1.00", "tags": null}))
                .unwrap();

        assert_eq!(payload.null_fields, vec!["title", "tags"]);
        assert!(payload.title.is_none());
        assert!(payload.time_minutes.is_none());
        assert_eq!(payload.price, Some(dec("1.00")));

        let payload: RecipePayload = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(payload.null_fields.is_empty());
    }

    #[test]
    fn test_patch_leaves_absent_fields_alone() {
        let payload = RecipePayload {
            title: Some("New title".to_string()),
            ..Default::default()
        };

        let update = payload.into_update(PayloadMode::Patch).unwrap();
        assert_eq!(update.title.as_deref(), Some("New title"));
        assert!(update.link.is_none());
        assert!(update.tags.is_none());
        assert!(update.ingredients.is_none());
    }

    #[test]
    fn test_replace_resets_absent_optionals() {
        let payload = RecipePayload {
            title: Some("Spaghetti".to_string()),
            time_minutes: Some(25),
            price: Some(dec("5.00")),
            ..Default::default()
        };

        let update = payload.into_update(PayloadMode::Replace).unwrap();
        assert_eq!(update.link.as_deref(), Some(""));
        assert_eq!(update.tags, Some(vec![]));
        assert_eq!(update.ingredients, Some(vec![]));
        assert_eq!(update.time_minutes, Some(25));
    }

    #[test]
    fn test_summary_serializes_price_as_string() {
        let summary = RecipeSummary {
            id: 1,
            title: "Spaghetti".to_string(),
            ingredients: vec![3],
            tags: vec![],
            time_minutes: 30,
            price: dec("5.00"),
            link: String::new(),
        };

        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["price"], "5.00");
        assert_eq!(json["ingredients"], serde_json::json!([3]));
    }
}
