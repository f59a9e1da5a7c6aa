//! Session middleware configuration.
//!
//! Sessions live in memory: they only hold the cart ID, the customer's
//! OAuth tokens and in-flight OAuth state. A restart signs customers out
//! but their carts survive on Shopify.

use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "tp_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with the in-memory store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Session keys.
pub mod keys {
    /// Shopify cart ID.
    pub const CART_ID: &str = "cart_id";

    /// OAuth `state` parameter awaiting the callback.
    pub const OAUTH_STATE: &str = "oauth_state";

    /// OAuth `nonce` awaiting the callback.
    pub const OAUTH_NONCE: &str = "oauth_nonce";

    /// Local path to return to after login.
    pub const OAUTH_RETURN_TO: &str = "oauth_return_to";

    /// Customer Account API tokens.
    pub const CUSTOMER_TOKEN: &str = "customer_token";
}

/// Cart ID stored in the session, if any.
pub async fn cart_id(session: &Session) -> Option<String> {
    session.get::<String>(keys::CART_ID).await.ok().flatten()
}

/// Remember the cart for this visitor.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_cart_id(
    session: &Session,
    cart_id: &str,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART_ID, cart_id).await
}

/// Forget the cart, e.g. after it expired on Shopify.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_cart_id(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<String>(keys::CART_ID).await?;
    Ok(())
}
