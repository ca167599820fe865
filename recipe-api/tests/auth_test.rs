/// Authentication boundary tests that need no database
///
/// The pool behind `lazy_app` never connects, so any request that reached a
/// query would fail with 500. Getting 401/400 proves the request was
/// rejected up front without side effects.

mod common;

use axum::http::{Method, StatusCode};
use common::{lazy_app, send};
use serde_json::json;

#[tokio::test]
async fn test_every_protected_route_requires_a_token() {
    let app = lazy_app();

    let routes = [
        (Method::GET, "/api/user/me"),
        (Method::PATCH, "/api/user/me"),
        (Method::GET, "/api/recipe/tags"),
        (Method::POST, "/api/recipe/tags"),
        (Method::GET, "/api/recipe/ingredients"),
        (Method::POST, "/api/recipe/ingredients"),
        (Method::GET, "/api/recipe/recipes"),
        (Method::POST, "/api/recipe/recipes"),
        (Method::GET, "/api/recipe/recipes/1"),
        (Method::PUT, "/api/recipe/recipes/1"),
        (Method::PATCH, "/api/recipe/recipes/1"),
        (Method::DELETE, "/api/recipe/recipes/1"),
        (Method::POST, "/api/recipe/recipes/1/upload-image"),
        (Method::GET, "/api/admin/users"),
        (Method::GET, "/api/admin/recipes"),
    ];

    for (method, uri) in routes {
        let (status, body) = send(&app, method.clone(), uri, None, Some(json!({"name": "x"}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body["error"], "unauthorized", "{method} {uri}");
    }
}

#[tokio::test]
async fn test_malformed_tokens_are_rejected() {
    let app = lazy_app();

    let not_hex = "g".repeat(40);
    let uppercase = "A".repeat(40);

    for token in ["", "abc", "zz", not_hex.as_str(), uppercase.as_str()] {
        let (status, _) = send(&app, Method::GET, "/api/recipe/tags", Some(token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{token:?}");
    }
}

#[tokio::test]
async fn test_signup_validation_runs_before_the_database() {
    let app = lazy_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/user/create",
        None,
        Some(json!({"email": "cook@example.com", "password": "pw", "name": "Cook"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(common::error_fields(&body), vec!["password"]);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/user/create",
        None,
        Some(json!({"email": "not-an-email", "password": "testpass123"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(common::error_fields(&body), vec!["email"]);
}

#[tokio::test]
async fn test_token_requires_both_fields() {
    let app = lazy_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/user/token",
        None,
        Some(json!({"email": "cook@example.com", "password": ""})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(common::error_fields(&body), vec!["password"]);

    let (status, body) = send(&app, Method::POST, "/api/user/token", None, Some(json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(common::error_fields(&body), vec!["email", "password"]);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = lazy_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/user/create",
        None,
        Some(json!("just a string")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}
