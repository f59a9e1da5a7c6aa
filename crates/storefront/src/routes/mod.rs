//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (Shopify reachable)
//! GET  /robots.txt             - Robots policy
//!
//! # Catalog (CacheShort)
//! GET  /products               - Product listing
//! GET  /products/{handle}      - Product detail
//! GET  /collections            - Collection listing
//! GET  /collections/{handle}   - Collection detail
//! GET  /search                 - Search results
//!
//! # Content (CacheLong)
//! GET  /pages/{handle}         - CMS page
//! GET  /policies/{handle}      - Shop policy
//!
//! # Cart (Private, rate limited)
//! GET  /cart                   - Cart page
//! POST /cart                   - Cart action dispatcher
//! GET  /cart/count             - Cart count badge (fragment)
//! GET  /cart/{lines}           - Cart permalink, redirects to checkout
//! GET  /checkout               - Redirect to Shopify checkout
//! POST /newsletter             - Newsletter sign-up (fragment)
//!
//! # Shopify Customer OAuth (Private, strict rate limit)
//! GET  /auth/login             - Redirect to Shopify sign-in
//! GET  /auth/callback          - Handle OAuth callback
//! POST /auth/logout            - Sign out
//!
//! # Account (Private, requires customer)
//! GET  /account                - Account overview
//! GET  /account/orders         - Order history
//! GET  /account/orders/{id}    - Order detail
//! GET  /account/profile        - Profile form
//! POST /account/profile        - Update profile
//! GET  /account/addresses      - Address list
//! POST /account/addresses      - Create address
//! POST /account/addresses/{id} - Update or delete (`_method=delete`) address
//!
//! # API (Private)
//! GET  /api/predictive-search              - Search suggestions
//! POST /api/media/generations              - Start image generation
//! GET  /api/media/generations/{task_id}    - Poll image generation
//! POST /api/media/upload-signature         - Signed CDN upload parameters
//! POST /api/media/uploads                  - Server-side CDN upload
//! ```

pub mod account;
pub mod api;
pub mod cart;
pub mod collections;
pub mod home;
pub mod newsletter;
pub mod pages;
pub mod products;
pub mod search;
pub mod shopify_auth;
pub mod views;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    middleware::from_fn,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::warn;

use crate::middleware::{
    auth_rate_limiter, cache_long, cache_private, cache_short, cart_rate_limiter,
    media_rate_limiter,
};
use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/products", get(products::index))
        .route("/products/{handle}", get(products::show))
        .route("/collections", get(collections::index))
        .route("/collections/{handle}", get(collections::show))
        .route("/search", get(search::search))
        .route_layer(from_fn(cache_short))
}

/// Create the content page routes router.
pub fn content_routes() -> Router<AppState> {
    Router::new()
        .route("/pages/{handle}", get(pages::page))
        .route("/policies/{handle}", get(pages::policy))
        .route("/robots.txt", get(robots))
        .route_layer(from_fn(cache_long))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show).post(cart::dispatch))
        .route("/cart/count", get(cart::count))
        .route("/cart/{lines}", get(cart::permalink))
        .route("/checkout", get(cart::checkout))
        .route("/newsletter", post(newsletter::subscribe))
        .route_layer(cart_rate_limiter())
        .route_layer(from_fn(cache_private))
}

/// Create the Shopify OAuth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(shopify_auth::login))
        .route("/callback", get(shopify_auth::callback))
        .route("/logout", post(shopify_auth::logout))
        .route_layer(auth_rate_limiter())
        .route_layer(from_fn(cache_private))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
        .route(
            "/profile",
            get(account::profile).post(account::update_profile),
        )
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route("/addresses/{id}", post(account::update_address))
        .route_layer(from_fn(cache_private))
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    let media = Router::new()
        .route("/generations", post(api::media::create_generation))
        .route(
            "/generations/{task_id}",
            get(api::media::generation_status),
        )
        .route("/upload-signature", post(api::media::upload_signature))
        .route("/uploads", post(api::media::upload))
        .route_layer(media_rate_limiter());

    Router::new()
        .route("/predictive-search", get(search::predictive))
        .nest("/media", media)
        .route_layer(from_fn(cache_private))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(catalog_routes())
        .merge(content_routes())
        .merge(cart_routes())
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the Storefront API is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.storefront().get_collections(1, None).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Robots policy. Private and transactional pages stay out of indexes.
async fn robots() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "User-agent: *\n\
         Disallow: /cart\n\
         Disallow: /checkout\n\
         Disallow: /account\n\
         Disallow: /auth\n\
         Disallow: /api\n\
         Disallow: /search\n",
    )
}
