//! Page rendering and error mapping against a fake Shopify.

use axum::http::StatusCode;
use serde_json::json;
use tidepool_integration_tests::{FakeShopify, TestApp, body_text, product, test_config};

async fn app() -> (FakeShopify, TestApp) {
    let shopify = FakeShopify::start().await;
    let app = TestApp::new(test_config(&shopify, None));
    (shopify, app)
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_liveness_does_not_touch_shopify() {
    let (shopify, app) = app().await;

    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
    assert!(shopify.calls("GetCollections").is_empty());
}

#[tokio::test]
async fn test_readiness_reflects_shopify() {
    let (shopify, app) = app().await;

    let response = app.get("/health/ready").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    shopify.respond(
        "GetCollections",
        json!({ "collections": {
            "nodes": [],
            "pageInfo": { "hasNextPage": false, "hasPreviousPage": false, "startCursor": null, "endCursor": null }
        }}),
    );
    let response = app.get("/health/ready").await;
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Products
// =============================================================================

#[tokio::test]
async fn test_product_page_renders() {
    let (shopify, app) = app().await;
    shopify.respond_with("GetProductByHandle", |variables| {
        if variables["handle"] == "harbor-mug" {
            json!({ "product": product("harbor-mug", "Harbor mug", "24.00") })
        } else {
            json!({ "product": null })
        }
    });
    shopify.respond("GetProductRecommendations", json!({ "productRecommendations": [] }));

    let response = app.get("/products/harbor-mug").await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert!(headers.contains_key("content-security-policy"));
    assert!(headers.contains_key("x-request-id"));
    assert!(
        headers["cache-control"]
            .to_str()
            .unwrap_or_default()
            .contains("max-age")
    );

    let body = body_text(response).await;
    assert!(body.contains("Harbor mug"));
    assert!(body.contains("$24.00"));
    assert!(body.contains("name=\"merchandise_id\""));
    assert!(body.contains("class=\"rating\""));
}

#[tokio::test]
async fn test_product_is_cached_until_invalidated() {
    let (shopify, app) = app().await;
    shopify.respond(
        "GetProductByHandle",
        json!({ "product": product("harbor-mug", "Harbor mug", "24.00") }),
    );
    shopify.respond("GetProductRecommendations", json!({ "productRecommendations": [] }));

    for _ in 0..2 {
        let response = app.get("/products/harbor-mug").await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(shopify.calls("GetProductByHandle").len(), 1);

    app.state().storefront().invalidate_product("harbor-mug").await;
    app.get("/products/harbor-mug").await;
    assert_eq!(shopify.calls("GetProductByHandle").len(), 2);

    app.state().storefront().invalidate_all();
    app.get("/products/harbor-mug").await;
    assert_eq!(shopify.calls("GetProductByHandle").len(), 3);
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let (shopify, app) = app().await;
    shopify.respond("GetProductByHandle", json!({ "product": null }));

    let response = app.get("/products/no-such-thing").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_text(response).await;
    assert!(!body.contains("no-such-thing"), "internal detail leaked: {body}");
}

#[tokio::test]
async fn test_shopify_failure_is_internal_error() {
    let (_shopify, app) = app().await;

    // No responder registered: the fake answers with a GraphQL error.
    let response = app.get("/products/harbor-mug").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_text(response).await;
    assert!(!body.contains("unexpected operation"), "internal detail leaked: {body}");
}

// =============================================================================
// Home & Content
// =============================================================================

#[tokio::test]
async fn test_home_degrades_when_catalog_fails() {
    let (_shopify, app) = app().await;

    let response = app.get("/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Tidepool"));
    assert!(body.contains("hero-slide"));
}

#[tokio::test]
async fn test_unknown_policy_is_not_found_without_api_call() {
    let (shopify, app) = app().await;

    let response = app.get("/policies/cookie-policy").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(shopify.calls("GetShopPolicies").is_empty());
}

#[tokio::test]
async fn test_robots_disallows_private_paths() {
    let (_shopify, app) = app().await;

    let response = app.get("/robots.txt").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Disallow: /cart"));
    assert!(body.contains("Disallow: /account"));
}

// =============================================================================
// Account
// =============================================================================

#[tokio::test]
async fn test_account_requires_sign_in() {
    let (_shopify, app) = app().await;

    let response = app.get("/account").await;

    assert!(response.status().is_redirection());
    let location = response.headers()["location"].to_str().unwrap_or_default();
    assert!(location.starts_with("/auth/login"), "unexpected location {location}");
}

#[tokio::test]
async fn test_media_api_unconfigured_is_not_found() {
    let (_shopify, app) = app().await;

    let response = app.get("/api/media/generations/abc123").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
