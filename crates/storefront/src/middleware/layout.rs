//! Per-request data every full page renders: branding, analytics, the CSP
//! nonce and whether a customer is signed in.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
};

use super::csp::CspNonce;
use super::shopify_customer::OptionalShopifyCustomer;
use crate::config::AnalyticsConfig;
use crate::state::AppState;

/// Layout context passed to the base template.
#[derive(Debug, Clone)]
pub struct Layout {
    pub brand_name: String,
    pub accent_color: String,
    pub nonce: String,
    pub analytics: AnalyticsConfig,
    pub signed_in: bool,
    /// Request path, for active navigation links and login return paths.
    pub path: String,
    pub gift_enabled: bool,
}

impl FromRequestParts<AppState> for Layout {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;
        let OptionalShopifyCustomer(token) =
            OptionalShopifyCustomer::from_request_parts(parts, state).await?;
        let config = state.config();
        // Nested routers see a stripped URI
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path(), |OriginalUri(uri)| uri.path())
            .to_string();

        Ok(Self {
            brand_name: config.theme.brand_name.clone(),
            accent_color: config.theme.accent_color.clone(),
            nonce,
            analytics: config.analytics.clone(),
            signed_in: token.is_some(),
            path,
            gift_enabled: config.gift.is_some(),
        })
    }
}

impl Layout {
    /// True when `prefix` is the current section, for nav highlighting.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/" {
            return self.path == "/";
        }
        self.path == prefix || self.path.starts_with(&format!("{prefix}/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(path: &str) -> Layout {
        Layout {
            brand_name: "Tidepool".to_string(),
            accent_color: "#0f766e".to_string(),
            nonce: String::new(),
            analytics: AnalyticsConfig::default(),
            signed_in: false,
            path: path.to_string(),
            gift_enabled: false,
        }
    }

    #[test]
    fn test_active_section() {
        assert!(layout("/products/sunset-tee").is_active("/products"));
        assert!(layout("/products").is_active("/products"));
        assert!(!layout("/products-archive").is_active("/products"));
        assert!(!layout("/cart").is_active("/"));
        assert!(layout("/").is_active("/"));
    }
}
