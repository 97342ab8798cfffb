#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Kernel routes that answer without a database.
//!
//! These run the real router and templates against a pool that can never
//! connect, so they need no services.

use axum::http::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

mod common;
use common::{TestApp, body_string, extract_cookies, input_value, location};

#[tokio::test]
async fn health_reports_unreachable_database() {
    let app = TestApp::offline();
    let response = app.get("/health", "").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["postgres"], false);
}

#[tokio::test]
async fn settings_page_refused_without_admin_capability() {
    let app = TestApp::offline();
    let response = app.get("/admin/config/custom-css", "").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_string(response).await;
    assert!(body.contains("You do not have sufficient permissions to access this page."));
    assert!(!body.contains("post_types[]"));
}

#[tokio::test]
async fn settings_submission_refused_without_admin_capability() {
    let app = TestApp::offline();
    let response = app
        .post_form(
            "/admin/config/custom-css",
            "",
            &[("post_types[]", "page"), ("_token", "forged")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_settings_page_is_not_found() {
    let app = TestApp::offline();
    let response = app.get("/admin/config/nope", "").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_type_archive_is_not_found() {
    let app = TestApp::offline();
    let response = app.get("/type/gallery", "").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn editing_surface_requires_login() {
    let app = TestApp::offline();
    let response = app.get(&format!("/item/{}/edit", Uuid::now_v7()), "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/user/login");

    let response = app.get("/item/add/page", "").await;
    assert_eq!(location(&response), "/user/login");

    let response = app.get("/admin", "").await;
    assert_eq!(location(&response), "/user/login");
}

#[tokio::test]
async fn item_save_requires_login() {
    let app = TestApp::offline();
    let response = app
        .post_form(
            &format!("/item/{}/edit", Uuid::now_v7()),
            "",
            &[("title", "T"), ("custom_css", "body{}")],
        )
        .await;
    assert_eq!(location(&response), "/user/login");
}

#[tokio::test]
async fn autosave_requires_login() {
    let app = TestApp::offline();
    let response = app
        .post_json(
            &format!("/item/{}/autosave", Uuid::now_v7()),
            "",
            &json!({ "title": "T", "token": "x" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_form_carries_a_token() {
    let app = TestApp::offline();
    let response = app.get("/user/login", "").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!extract_cookies(&response).is_empty());

    let body = body_string(response).await;
    let token = input_value(&body, "_token").unwrap();
    assert_eq!(token.len(), 64);
}

#[tokio::test]
async fn login_with_forged_token_is_rejected() {
    let app = TestApp::offline();
    let response = app
        .post_form(
            "/user/login",
            "",
            &[("username", "admin"), ("password", "x"), ("_token", "forged")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response).await.contains("Invalid form token"));
}

#[tokio::test]
async fn plugin_menus_and_settings_are_registered() {
    let app = TestApp::offline();
    let menu = app
        .state
        .menu_registry()
        .config_page("custom-css")
        .expect("custom css page");
    assert_eq!(menu.title, "Custom CSS");
    assert_eq!(menu.heading(), "Custom CSS for Selective Content");
    let settings = app.state.settings_registry().group(custom_css::SETTINGS_GROUP);
    assert_eq!(settings.len(), 1);
    assert_eq!(settings[0].name, custom_css::POST_TYPES_OPTION);
}
