//! # Recipe Shared Library
//!
//! Data layer and auth primitives shared by the recipe API server and the
//! admin CLI.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool and migrations
//! - `models`: Users, tokens, tags, ingredients and recipes
//! - `auth`: Password hashing, token keys, request authentication
//! - `media`: Uploaded image validation and storage

pub mod auth;
pub mod db;
pub mod media;
pub mod models;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
