//! Web API Admin Tests
//!
//! Integration tests for preview cache administration.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use serde_json::Value;

use common::{admin_bearer, bearer, create_test_app, data, insert_file};

#[tokio::test]
async fn test_clear_preview_cache() {
    let app = create_test_app().await;
    let first = insert_file(&app.db, "user-1", "a.png", Some("image/png")).await;
    let second = insert_file(&app.db, "user-1", "b.mp4", Some("video/mp4")).await;

    for file in [&first, &second] {
        app.server
            .get(&format!("/api/files/{}/preview", file.id))
            .add_header(AUTHORIZATION, bearer("user-1"))
            .await
            .assert_status_ok();
    }
    assert_eq!(app.signer.calls(), 2);

    let response = app
        .server
        .post("/api/admin/preview-cache/clear")
        .add_header(AUTHORIZATION, admin_bearer("admin-1"))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["cleared"], 2);
    assert!(app.preview.is_empty());

    // The next lookup signs again.
    let body: Value = app
        .server
        .get(&format!("/api/files/{}/preview", first.id))
        .add_header(AUTHORIZATION, bearer("user-1"))
        .await
        .json();
    assert!(body["url"].as_str().unwrap().ends_with("token=t3"));
    assert_eq!(app.signer.calls(), 3);
}

#[tokio::test]
async fn test_clear_preview_cache_requires_admin() {
    let app = create_test_app().await;

    let response = app.server.post("/api/admin/preview-cache/clear").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .post("/api/admin/preview-cache/clear")
        .add_header(AUTHORIZATION, bearer("user-1"))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["error"], "Admin access required");
}

#[tokio::test]
async fn test_preview_cache_stats() {
    let app = create_test_app().await;
    let file = insert_file(&app.db, "user-1", "a.txt", Some("text/plain")).await;

    app.server
        .get(&format!("/api/files/{}/preview", file.id))
        .add_header(AUTHORIZATION, bearer("user-1"))
        .await
        .assert_status_ok();

    let response = app
        .server
        .get("/api/admin/preview-cache")
        .add_header(AUTHORIZATION, admin_bearer("admin-1"))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(data(&body)["entries"], 1);
    assert_eq!(data(&body)["ttlSecs"], 1800);
}
