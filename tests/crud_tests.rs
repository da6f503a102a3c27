//! Tests for the content CRUD surface behind the authentication core:
//! categories with their fixed panel, custom tabs, posts, and tags,
//! including ownership isolation between accounts.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use folio::{ServerConfig, auth::SameSite, create_app, db::Database};
use tower::ServiceExt;

const TEST_SECRET: &[u8] = b"test-jwt-secret-0123456789abcdef";
const PASSWORD: &str = "correct-horse-42";

async fn create_test_app() -> (Router, Database) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let config = ServerConfig {
        db: db.clone(),
        jwt_secret: TEST_SECRET.to_vec(),
        access_token_ttl: 3600,
        refresh_token_ttl: 7 * 24 * 60 * 60,
        secure_cookies: false,
        cookie_same_site: SameSite::Lax,
    };
    (create_app(&config), db)
}

async fn response_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register and log in a user, returning the Cookie header value to act as them.
async fn login_cookie(app: &Router, login_id: &str) -> String {
    let signup = Request::builder()
        .method("POST")
        .uri("/api/v1/users/signup")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({
                "loginId": login_id,
                "email": format!("{}@example.com", login_id),
                "password": PASSWORD,
                "nickname": login_id,
            })
            .to_string(),
        ))
        .unwrap();
    assert_eq!(
        app.clone().oneshot(signup).await.unwrap().status(),
        StatusCode::CREATED
    );

    let login = Request::builder()
        .method("POST")
        .uri("/api/v1/users/login")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({ "loginId": login_id, "password": PASSWORD }).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(login).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;

    format!(
        "accessToken={}; refreshToken={}",
        body["accessToken"].as_str().unwrap(),
        body["refreshToken"].as_str().unwrap()
    )
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<serde_json::Value>,
) -> axum::http::Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

/// Create a category as the cookie's owner and return its id.
async fn create_category(app: &Router, cookie: &str, title: &str) -> i64 {
    let response = send(
        app,
        "POST",
        "/api/v1/categories",
        Some(cookie),
        Some(serde_json::json!({ "title": title })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await["id"].as_i64().unwrap()
}

// =============================================================================
// Categories
// =============================================================================

#[tokio::test]
async fn test_category_lifecycle() {
    let (app, db) = create_test_app().await;
    let cookie = login_cookie(&app, "alice01").await;
    let account_id = db
        .accounts()
        .find_by_login_id("alice01")
        .await
        .unwrap()
        .unwrap()
        .id;

    let id = create_category(&app, &cookie, "My project").await;

    // Listing is public.
    let response = send(
        &app,
        "GET",
        &format!("/api/v1/categories?accountId={}", account_id),
        None,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "My project");
    assert!(body[0]["publicId"].is_string());

    // Deleting requires the owner.
    let response = send(
        &app,
        "DELETE",
        &format!("/api/v1/categories/{}", id),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        "GET",
        &format!("/api/v1/categories?accountId={}", account_id),
        None,
        None,
    )
    .await;
    assert_eq!(response_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn test_category_rejects_blank_title() {
    let (app, _) = create_test_app().await;
    let cookie = login_cookie(&app, "alice01").await;

    let response = send(
        &app,
        "POST",
        "/api/v1/categories",
        Some(&cookie),
        Some(serde_json::json!({ "title": "   " })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_foreign_category_is_invisible_to_other_accounts() {
    let (app, _) = create_test_app().await;
    let alice = login_cookie(&app, "alice01").await;
    let mallory = login_cookie(&app, "mallory1").await;

    let id = create_category(&app, &alice, "Private work").await;

    let response = send(
        &app,
        "DELETE",
        &format!("/api/v1/categories/{}", id),
        Some(&mallory),
        None,
    )
    .await;
    // Not-found rather than forbidden: existence is not disclosed.
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Basic panel and tabs
// =============================================================================

#[tokio::test]
async fn test_new_category_has_default_basic_panel() {
    let (app, _) = create_test_app().await;
    let cookie = login_cookie(&app, "alice01").await;
    let id = create_category(&app, &cookie, "My project").await;

    let response = send(
        &app,
        "GET",
        &format!("/api/v1/tabs/basic?categoryId={}", id),
        None,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["introTitle"], "Introduction");
    assert_eq!(body["resourcesTitle"], "Resources");
    assert_eq!(body["introContent"], "");
}

#[tokio::test]
async fn test_update_basic_panel() {
    let (app, _) = create_test_app().await;
    let cookie = login_cookie(&app, "alice01").await;
    let id = create_category(&app, &cookie, "My project").await;

    let response = send(
        &app,
        "PUT",
        &format!("/api/v1/tabs/basic?categoryId={}", id),
        Some(&cookie),
        Some(serde_json::json!({
            "introContent": "About this project",
            "resourcesContent": "Links",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        "GET",
        &format!("/api/v1/tabs/basic?categoryId={}", id),
        None,
        None,
    )
    .await;
    let body = response_json(response).await;
    assert_eq!(body["introContent"], "About this project");
    assert_eq!(body["resourcesContent"], "Links");
}

#[tokio::test]
async fn test_tab_lifecycle() {
    let (app, _) = create_test_app().await;
    let cookie = login_cookie(&app, "alice01").await;
    let category_id = create_category(&app, &cookie, "My project").await;

    let response = send(
        &app,
        "POST",
        &format!("/api/v1/tabs?categoryId={}", category_id),
        Some(&cookie),
        Some(serde_json::json!({ "name": "Notes" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let tab_id = response_json(response).await["id"].as_i64().unwrap();

    let response = send(
        &app,
        "PUT",
        &format!("/api/v1/tabs/{}", tab_id),
        Some(&cookie),
        Some(serde_json::json!({ "name": "Notes", "content": "Updated body" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        "GET",
        &format!("/api/v1/tabs?categoryId={}", category_id),
        None,
        None,
    )
    .await;
    let body = response_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["content"], "Updated body");

    let response = send(
        &app,
        "DELETE",
        &format!("/api/v1/tabs/{}", tab_id),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_tab_creation_in_foreign_category_is_rejected() {
    let (app, _) = create_test_app().await;
    let alice = login_cookie(&app, "alice01").await;
    let mallory = login_cookie(&app, "mallory1").await;
    let category_id = create_category(&app, &alice, "Private work").await;

    let response = send(
        &app,
        "POST",
        &format!("/api/v1/tabs?categoryId={}", category_id),
        Some(&mallory),
        Some(serde_json::json!({ "name": "Intrusion" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Posts
// =============================================================================

#[tokio::test]
async fn test_post_lifecycle() {
    let (app, _) = create_test_app().await;
    let cookie = login_cookie(&app, "alice01").await;
    let category_id = create_category(&app, &cookie, "My project").await;

    let response = send(
        &app,
        "POST",
        &format!("/api/v1/posts?categoryId={}", category_id),
        Some(&cookie),
        Some(serde_json::json!({
            "title": "First entry",
            "content": "Hello",
            "imageUrl": "https://cdn.example.com/a.png",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let post_id = response_json(response).await["id"].as_i64().unwrap();

    // Reads are public.
    let response = send(&app, "GET", &format!("/api/v1/posts/{}", post_id), None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["title"], "First entry");
    assert_eq!(body["imageUrl"], "https://cdn.example.com/a.png");

    let response = send(
        &app,
        "PUT",
        &format!("/api/v1/posts/{}", post_id),
        Some(&cookie),
        Some(serde_json::json!({ "title": "First entry", "content": "Edited" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        "GET",
        &format!("/api/v1/posts/list?categoryId={}", category_id),
        None,
        None,
    )
    .await;
    let body = response_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["content"], "Edited");

    let response = send(
        &app,
        "DELETE",
        &format!("/api/v1/posts/{}", post_id),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", &format!("/api/v1/posts/{}", post_id), None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_post_bound_to_tab() {
    let (app, _) = create_test_app().await;
    let cookie = login_cookie(&app, "alice01").await;
    let category_id = create_category(&app, &cookie, "My project").await;

    let response = send(
        &app,
        "POST",
        &format!("/api/v1/tabs?categoryId={}", category_id),
        Some(&cookie),
        Some(serde_json::json!({ "name": "Notes" })),
    )
    .await;
    let tab_id = response_json(response).await["id"].as_i64().unwrap();

    let response = send(
        &app,
        "POST",
        &format!("/api/v1/posts?categoryId={}&tabId={}", category_id, tab_id),
        Some(&cookie),
        Some(serde_json::json!({ "content": "Tab body" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(
        &app,
        "GET",
        &format!("/api/v1/posts/by-tab?tabId={}", tab_id),
        None,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["content"], "Tab body");
}

#[tokio::test]
async fn test_post_rejects_tab_from_another_category() {
    let (app, _) = create_test_app().await;
    let cookie = login_cookie(&app, "alice01").await;
    let first = create_category(&app, &cookie, "First").await;
    let second = create_category(&app, &cookie, "Second").await;

    let response = send(
        &app,
        "POST",
        &format!("/api/v1/tabs?categoryId={}", first),
        Some(&cookie),
        Some(serde_json::json!({ "name": "Notes" })),
    )
    .await;
    let tab_id = response_json(response).await["id"].as_i64().unwrap();

    let response = send(
        &app,
        "POST",
        &format!("/api/v1/posts?categoryId={}&tabId={}", second, tab_id),
        Some(&cookie),
        Some(serde_json::json!({ "content": "Mismatched" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_foreign_post_update_is_rejected() {
    let (app, _) = create_test_app().await;
    let alice = login_cookie(&app, "alice01").await;
    let mallory = login_cookie(&app, "mallory1").await;
    let category_id = create_category(&app, &alice, "Private work").await;

    let response = send(
        &app,
        "POST",
        &format!("/api/v1/posts?categoryId={}", category_id),
        Some(&alice),
        Some(serde_json::json!({ "content": "Original" })),
    )
    .await;
    let post_id = response_json(response).await["id"].as_i64().unwrap();

    let response = send(
        &app,
        "PUT",
        &format!("/api/v1/posts/{}", post_id),
        Some(&mallory),
        Some(serde_json::json!({ "content": "Defaced" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Tags
// =============================================================================

#[tokio::test]
async fn test_tag_lifecycle() {
    let (app, _) = create_test_app().await;
    let cookie = login_cookie(&app, "alice01").await;
    let category_id = create_category(&app, &cookie, "My project").await;

    let response = send(
        &app,
        "POST",
        &format!("/api/v1/tags?categoryId={}", category_id),
        Some(&cookie),
        Some(serde_json::json!({ "name": "rust" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let tag_id = response_json(response).await["id"].as_i64().unwrap();

    let response = send(
        &app,
        "PUT",
        &format!("/api/v1/tags/{}", tag_id),
        Some(&cookie),
        Some(serde_json::json!({ "name": "backend" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        "GET",
        &format!("/api/v1/tags?categoryId={}", category_id),
        None,
        None,
    )
    .await;
    let body = response_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "backend");

    let response = send(
        &app,
        "DELETE",
        &format!("/api/v1/tags/{}", tag_id),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        "GET",
        &format!("/api/v1/tags?categoryId={}", category_id),
        None,
        None,
    )
    .await;
    assert_eq!(response_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn test_tag_name_length_is_bounded() {
    let (app, _) = create_test_app().await;
    let cookie = login_cookie(&app, "alice01").await;
    let category_id = create_category(&app, &cookie, "My project").await;

    let response = send(
        &app,
        "POST",
        &format!("/api/v1/tags?categoryId={}", category_id),
        Some(&cookie),
        Some(serde_json::json!({ "name": "x".repeat(31) })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
