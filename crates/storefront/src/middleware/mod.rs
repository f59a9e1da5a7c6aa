//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions, in-memory store)
//! 5. CSP nonce (generate per-request nonce for inline scripts)
//! 6. Security headers (CSP, HSTS, etc.)
//! 7. Per route group: cache strategy and rate limiting (governor)

pub mod cache_control;
pub mod csp;
pub mod layout;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod shopify_customer;

pub use cache_control::{CacheStrategy, cache_long, cache_private, cache_short};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use layout::Layout;
pub use rate_limit::{auth_rate_limiter, cart_rate_limiter, media_rate_limiter};
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
pub use shopify_customer::{
    OptionalShopifyCustomer, RequireShopifyCustomer, clear_shopify_customer_token,
    set_shopify_customer_token,
};
