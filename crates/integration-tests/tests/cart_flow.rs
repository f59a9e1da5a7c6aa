//! Cart dispatcher and gift with purchase against a fake Shopify.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tidepool_core::gift::GIFT_ATTRIBUTE_KEY;
use tidepool_core::{GiftPolicy, Money, VariantGid};
use tidepool_integration_tests::{
    FakeShopify, TestApp, body_text, cart, cart_line, cart_payload, session_cookie, test_config,
};

const GIFT_VARIANT: u64 = 900;

fn gift_policy() -> GiftPolicy {
    GiftPolicy {
        variant_id: VariantGid::from_numeric(GIFT_VARIANT),
        threshold: Money::parse("50.00", "USD").expect("threshold"),
    }
}

async fn app_with_gift() -> (FakeShopify, TestApp) {
    let shopify = FakeShopify::start().await;
    let app = TestApp::new(test_config(&shopify, Some(gift_policy())));
    (shopify, app)
}

const ADD_MUG: &str = "action=LinesAdd&merchandise_id=gid%3A%2F%2Fshopify%2FProductVariant%2F1001&quantity=1";

// =============================================================================
// Dispatcher
// =============================================================================

#[tokio::test]
async fn test_add_creates_cart_and_redirects() {
    let shopify = FakeShopify::start().await;
    let app = TestApp::new(test_config(&shopify, None));
    shopify.respond(
        "CreateCart",
        json!({ "cartCreate": cart_payload(cart(&[cart_line("gid://shopify/CartLine/1", 1001, 1, "24.00", false)])) }),
    );

    let response = app.post_form("/cart", ADD_MUG, None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/cart");
    assert!(session_cookie(&response).is_some(), "cart id not stored in session");
    assert_eq!(
        response.headers()["cache-control"],
        "private, no-store"
    );

    let created = shopify.calls("CreateCart");
    assert_eq!(created.len(), 1);
    assert_eq!(
        created[0]["input"]["lines"][0]["merchandiseId"],
        "gid://shopify/ProductVariant/1001"
    );
    assert_eq!(created[0]["input"]["lines"][0]["quantity"], 1);
}

#[tokio::test]
async fn test_add_accepts_numeric_variant_and_safe_redirect() {
    let shopify = FakeShopify::start().await;
    let app = TestApp::new(test_config(&shopify, None));
    shopify.respond(
        "CreateCart",
        json!({ "cartCreate": cart_payload(cart(&[cart_line("gid://shopify/CartLine/1", 1001, 2, "48.00", false)])) }),
    );

    let response = app
        .post_form(
            "/cart",
            "action=LinesAdd&merchandise_id=1001&quantity=2&redirect_to=%2F%2Fevil.example",
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/cart");
    assert_eq!(
        shopify.calls("CreateCart")[0]["input"]["lines"][0]["merchandiseId"],
        "gid://shopify/ProductVariant/1001"
    );
}

#[tokio::test]
async fn test_redirect_with_control_characters_falls_back_to_cart() {
    let shopify = FakeShopify::start().await;
    let app = TestApp::new(test_config(&shopify, None));
    shopify.respond(
        "CreateCart",
        json!({ "cartCreate": cart_payload(cart(&[cart_line("gid://shopify/CartLine/1", 1001, 1, "24.00", false)])) }),
    );

    let response = app
        .post_form("/cart", &format!("{ADD_MUG}&redirect_to=%2Fa%0Ab"), None)
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/cart");
}

#[tokio::test]
async fn test_unknown_action_is_bad_request() {
    let shopify = FakeShopify::start().await;
    let app = TestApp::new(test_config(&shopify, None));

    let response = app.post_form("/cart", "action=Teleport", None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(shopify.calls("CreateCart").is_empty());
}

#[tokio::test]
async fn test_out_of_range_quantity_is_bad_request() {
    let shopify = FakeShopify::start().await;
    let app = TestApp::new(test_config(&shopify, None));

    let response = app
        .post_form(
            "/cart",
            "action=LinesAdd&merchandise_id=1001&quantity=500",
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_htmx_add_returns_fragment_and_trigger() {
    let shopify = FakeShopify::start().await;
    let app = TestApp::new(test_config(&shopify, None));
    shopify.respond(
        "CreateCart",
        json!({ "cartCreate": cart_payload(cart(&[cart_line("gid://shopify/CartLine/1", 1001, 1, "24.00", false)])) }),
    );

    let request = Request::post("/cart")
        .header("content-type", "application/x-www-form-urlencoded")
        .header("HX-Request", "true")
        .body(Body::from(ADD_MUG))
        .expect("request");
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["hx-trigger"], "cart-updated");
    let body = body_text(response).await;
    assert!(body.contains("id=\"cart-items\""));
    assert!(body.contains("Harbor mug"));
    assert!(!body.contains("<html"));
}

#[tokio::test]
async fn test_empty_cart_count_without_session() {
    let shopify = FakeShopify::start().await;
    let app = TestApp::new(test_config(&shopify, None));

    let response = app.get("/cart/count").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(shopify.calls("GetCart").is_empty());
}

#[tokio::test]
async fn test_permalink_redirects_to_checkout() {
    let shopify = FakeShopify::start().await;
    let app = TestApp::new(test_config(&shopify, None));
    shopify.respond(
        "CreateCart",
        json!({ "cartCreate": cart_payload(cart(&[cart_line("gid://shopify/CartLine/1", 1001, 2, "48.00", false)])) }),
    );

    let response = app.get("/cart/1001:2").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()["location"],
        "https://tidepool-test.myshopify.com/cart/c/c1-test"
    );
    assert_eq!(shopify.calls("CreateCart")[0]["input"]["lines"][0]["quantity"], 2);
}

#[tokio::test]
async fn test_malformed_permalink_is_bad_request() {
    let shopify = FakeShopify::start().await;
    let app = TestApp::new(test_config(&shopify, None));

    let response = app.get("/cart/not-a-variant:1").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(shopify.calls("CreateCart").is_empty());
}

#[tokio::test]
async fn test_user_error_is_bad_request() {
    let shopify = FakeShopify::start().await;
    let app = TestApp::new(test_config(&shopify, None));
    shopify.respond(
        "CreateCart",
        json!({ "cartCreate": {
            "cart": null,
            "userErrors": [{ "code": "INVALID", "field": ["lines"], "message": "Merchandise does not exist" }]
        }}),
    );

    let response = app.post_form("/cart", ADD_MUG, None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Gift With Purchase
// =============================================================================

#[tokio::test]
async fn test_gift_added_when_threshold_met() {
    let (shopify, app) = app_with_gift().await;
    shopify.respond(
        "CreateCart",
        json!({ "cartCreate": cart_payload(cart(&[cart_line("gid://shopify/CartLine/1", 1001, 1, "60.00", false)])) }),
    );
    shopify.respond(
        "AddToCart",
        json!({ "cartLinesAdd": cart_payload(cart(&[
            cart_line("gid://shopify/CartLine/1", 1001, 1, "60.00", false),
            cart_line("gid://shopify/CartLine/2", GIFT_VARIANT, 1, "0.00", true),
        ])) }),
    );

    let response = app.post_form("/cart", ADD_MUG, None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let added = shopify.calls("AddToCart");
    assert_eq!(added.len(), 1, "gift should be added exactly once");
    let line = &added[0]["lines"][0];
    assert_eq!(line["merchandiseId"], "gid://shopify/ProductVariant/900");
    assert_eq!(line["quantity"], 1);
    assert_eq!(line["attributes"][0]["key"], GIFT_ATTRIBUTE_KEY);
}

#[tokio::test]
async fn test_gift_not_added_below_threshold() {
    let (shopify, app) = app_with_gift().await;
    shopify.respond(
        "CreateCart",
        json!({ "cartCreate": cart_payload(cart(&[cart_line("gid://shopify/CartLine/1", 1001, 1, "20.00", false)])) }),
    );

    let response = app.post_form("/cart", ADD_MUG, None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(shopify.calls("AddToCart").is_empty());
}

#[tokio::test]
async fn test_gift_removed_when_cart_drops_below_threshold() {
    let (shopify, app) = app_with_gift().await;
    let paid_and_gift = cart(&[
        cart_line("gid://shopify/CartLine/1", 1001, 3, "60.00", false),
        cart_line("gid://shopify/CartLine/2", GIFT_VARIANT, 1, "0.00", true),
    ]);
    shopify.respond("CreateCart", json!({ "cartCreate": cart_payload(paid_and_gift) }));
    shopify.respond(
        "UpdateCartLines",
        json!({ "cartLinesUpdate": cart_payload(cart(&[
            cart_line("gid://shopify/CartLine/1", 1001, 1, "20.00", false),
            cart_line("gid://shopify/CartLine/2", GIFT_VARIANT, 1, "0.00", true),
        ])) }),
    );
    shopify.respond(
        "RemoveFromCart",
        json!({ "cartLinesRemove": cart_payload(cart(&[
            cart_line("gid://shopify/CartLine/1", 1001, 1, "20.00", false),
        ])) }),
    );

    let first = app.post_form("/cart", ADD_MUG, None).await;
    let cookie = session_cookie(&first).expect("session cookie");

    let response = app
        .post_form(
            "/cart",
            "action=LinesUpdate&line_id=gid%3A%2F%2Fshopify%2FCartLine%2F1&quantity=1",
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let updated = shopify.calls("UpdateCartLines");
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0]["cartId"], "gid://shopify/Cart/c1-test");

    let removed = shopify.calls("RemoveFromCart");
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0]["lineIds"], json!(["gid://shopify/CartLine/2"]));
}

#[tokio::test]
async fn test_gift_line_quantity_cannot_be_raised() {
    let (shopify, app) = app_with_gift().await;
    let paid_and_gift = cart(&[
        cart_line("gid://shopify/CartLine/1", 1001, 3, "80.00", false),
        cart_line("gid://shopify/CartLine/2", GIFT_VARIANT, 1, "0.00", true),
    ]);
    shopify.respond("CreateCart", json!({ "cartCreate": cart_payload(paid_and_gift.clone()) }));
    shopify.respond("GetCart", json!({ "cart": paid_and_gift }));

    let first = app.post_form("/cart", ADD_MUG, None).await;
    let cookie = session_cookie(&first).expect("session cookie");

    let response = app
        .post_form(
            "/cart",
            "action=LinesUpdate&line_id=gid%3A%2F%2Fshopify%2FCartLine%2F2&quantity=5",
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("limited to one per order"));
    assert_eq!(shopify.calls("GetCart").len(), 1);
    assert!(shopify.calls("UpdateCartLines").is_empty());
}
