//! CSP nonce middleware for inline script protection.
//!
//! Generates a unique, cryptographically random nonce per request and builds
//! the `Content-Security-Policy` header around it. Inline scripts in the
//! layout (analytics snippets, the theme style block) carry the nonce.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;

use crate::config::AnalyticsConfig;

/// Hosts product images are served from.
const IMAGE_HOSTS: &str = "https://cdn.shopify.com https://res.cloudinary.com";

/// A CSP nonce value for inline scripts.
///
/// Each request gets a unique, cryptographically random nonce (128-bit, base64-encoded).
#[derive(Clone, Debug)]
pub struct CspNonce(pub String);

impl CspNonce {
    /// Generate a new random nonce.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    /// Get the nonce value for use in templates.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Build the `Content-Security-Policy` header value.
///
/// Analytics hosts are only allowed when the matching tracker is configured.
/// Browser uploads post straight to the CDN, so its API host is always a
/// `connect-src`.
#[must_use]
pub fn content_security_policy(nonce: &CspNonce, analytics: &AnalyticsConfig) -> String {
    let nonce = nonce.value();
    let mut script_src = format!("'self' 'nonce-{nonce}'");
    let mut connect_src = "'self' https://api.cloudinary.com".to_string();
    let mut img_src = format!("'self' data: {IMAGE_HOSTS}");

    if analytics.ga4_measurement_id.is_some() {
        script_src.push_str(" https://www.googletagmanager.com");
        connect_src.push_str(" https://*.google-analytics.com");
        img_src.push_str(" https://*.google-analytics.com");
    }
    if analytics.meta_pixel_id.is_some() {
        script_src.push_str(" https://connect.facebook.net");
        connect_src.push_str(" https://www.facebook.com");
        img_src.push_str(" https://www.facebook.com");
    }

    format!(
        "default-src 'none'; \
         script-src {script_src}; \
         style-src 'self' 'nonce-{nonce}'; \
         font-src 'self'; \
         img-src {img_src}; \
         connect-src {connect_src}; \
         frame-src 'none'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self' https://shopify.com https://*.myshopify.com; \
         frame-ancestors 'none'"
    )
}

/// Middleware that generates a CSP nonce and stores it in request extensions.
///
/// Must be added before `security_headers_middleware` in the middleware stack
/// so the nonce is available when building the CSP header.
pub async fn csp_nonce_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(CspNonce::generate());
    next.run(request).await
}

impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_else(|| {
            tracing::warn!("CSP nonce missing from request extensions");
            Self(String::new())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonces_are_unique() {
        let a = CspNonce::generate();
        let b = CspNonce::generate();
        assert_ne!(a.value(), b.value());
        assert_eq!(a.value().len(), 24);
    }

    #[test]
    fn test_policy_carries_nonce() {
        let nonce = CspNonce("abc123".to_string());
        let policy = content_security_policy(&nonce, &AnalyticsConfig::default());
        assert!(policy.contains("script-src 'self' 'nonce-abc123';"));
        assert!(policy.contains("style-src 'self' 'nonce-abc123';"));
        assert!(policy.contains("https://cdn.shopify.com"));
        assert!(!policy.contains("googletagmanager"));
        assert!(!policy.contains("facebook"));
    }

    #[test]
    fn test_policy_allows_configured_analytics() {
        let analytics = AnalyticsConfig {
            ga4_measurement_id: Some("G-TEST".to_string()),
            meta_pixel_id: Some("1234".to_string()),
        };
        let policy = content_security_policy(&CspNonce("n".to_string()), &analytics);
        assert!(policy.contains("https://www.googletagmanager.com"));
        assert!(policy.contains("https://connect.facebook.net"));
    }
}
