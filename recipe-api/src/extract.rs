/// Extractors whose rejections render as [`ApiError`]
///
/// Axum's stock `Json`, `Query` and `Path` reject with plain-text bodies.
/// These wrappers run the same extraction but route failures through
/// `ApiError`, so every error response has the same JSON shape.
///
/// # Example
///
/// ```
/// use recipe_api::extract::{ApiJson, ApiPath};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Rename {
///     name: String,
/// }
///
/// async fn rename(ApiPath(id): ApiPath<i64>, ApiJson(body): ApiJson<Rename>) -> String {
///     format!("{id} -> {}", body.name)
/// }
/// ```

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON request body; syntax and type errors become 400
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string; undecodable input becomes 400
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters; ids that do not parse become 404
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
