/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `user`: Sign up, token exchange, own profile
/// - `attributes`: Tags and ingredients
/// - `recipes`: Recipes and their images
/// - `admin`: Staff-only listings

pub mod admin;
pub mod attributes;
pub mod health;
pub mod recipes;
pub mod user;

/// `validator` custom check rejecting empty or whitespace-only strings
pub(crate) fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    Ok(())
}
