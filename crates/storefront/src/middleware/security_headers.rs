//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Adds restrictive security headers to all responses. Start locked down and
//! loosen only when specific functionality requires it.

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY,
            X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::csp::{CspNonce, content_security_policy};
use crate::config::AnalyticsConfig;
use crate::state::AppState;

/// Add security headers to all responses.
///
/// Headers applied:
/// - `Content-Security-Policy` - Nonce-based policy from [`content_security_policy`]
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: strict-origin-when-cross-origin`
/// - `Permissions-Policy` - Deny sensitive features
/// - `Cross-Origin-Opener-Policy: same-origin` - Process isolation
/// - `Strict-Transport-Security` - Only when served over HTTPS
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let nonce = request.extensions().get::<CspNonce>().cloned();
    let mut response = next.run(request).await;

    let config = state.config();
    apply_security_headers(
        response.headers_mut(),
        nonce.as_ref(),
        &config.analytics,
        config.is_secure(),
    );

    response
}

fn apply_security_headers(
    headers: &mut HeaderMap,
    nonce: Option<&CspNonce>,
    analytics: &AnalyticsConfig,
    secure: bool,
) {
    let nonce = nonce.cloned().unwrap_or_else(CspNonce::generate);
    if let Ok(value) = HeaderValue::from_str(&content_security_policy(&nonce, analytics)) {
        headers.insert(CONTENT_SECURITY_POLICY, value);
    }

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    // Checkout on Shopify needs the origin for attribution
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             browsing-topics=(), \
             camera=(), \
             display-capture=(), \
             geolocation=(), \
             gyroscope=(), \
             interest-cohort=(), \
             magnetometer=(), \
             microphone=(), \
             usb=(), \
             xr-spatial-tracking=()",
        ),
    );

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    if secure {
        headers.insert(
            STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=63072000; includeSubDomains"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_use_request_nonce() {
        let mut headers = HeaderMap::new();
        let nonce = CspNonce("request-nonce".to_string());
        apply_security_headers(&mut headers, Some(&nonce), &AnalyticsConfig::default(), false);

        let csp = headers[CONTENT_SECURITY_POLICY].to_str().unwrap_or_default();
        assert!(csp.contains("'nonce-request-nonce'"));
        assert_eq!(headers[X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert!(!headers.contains_key(STRICT_TRANSPORT_SECURITY));
    }

    #[test]
    fn test_hsts_only_over_https() {
        let mut headers = HeaderMap::new();
        apply_security_headers(&mut headers, None, &AnalyticsConfig::default(), true);
        assert!(headers.contains_key(STRICT_TRANSPORT_SECURITY));
        assert!(headers.contains_key(CONTENT_SECURITY_POLICY));
    }
}
