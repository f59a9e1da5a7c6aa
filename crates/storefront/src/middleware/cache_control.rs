//! `Cache-Control` strategies per route group.
//!
//! Catalog pages are public and revalidated in the background; anything tied
//! to a session (cart, account, auth, media API) is never stored. Only
//! successful responses get a public policy, errors are always `no-store`.

use axum::{
    extract::Request,
    http::{HeaderValue, header::CACHE_CONTROL},
    middleware::Next,
    response::Response,
};

/// Named caching policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStrategy {
    /// Catalog pages: fresh for a second, served stale while revalidating.
    CacheShort,
    /// Content that rarely changes: policies, CMS pages, robots.txt.
    CacheLong,
    /// Per-visitor responses.
    Private,
}

impl CacheStrategy {
    #[must_use]
    pub const fn header_value(self) -> &'static str {
        match self {
            Self::CacheShort => "public, max-age=1, stale-while-revalidate=9",
            Self::CacheLong => "public, max-age=3600, stale-while-revalidate=82800",
            Self::Private => "private, no-store",
        }
    }

    fn apply(self, response: &mut Response) {
        let value = if response.status().is_success() {
            self
        } else {
            Self::Private
        };
        // Handlers may pick a stricter policy themselves
        if !response.headers().contains_key(CACHE_CONTROL) {
            response.headers_mut().insert(
                CACHE_CONTROL,
                HeaderValue::from_static(value.header_value()),
            );
        }
    }
}

/// Middleware for [`CacheStrategy::CacheShort`] routes.
pub async fn cache_short(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    CacheStrategy::CacheShort.apply(&mut response);
    response
}

/// Middleware for [`CacheStrategy::CacheLong`] routes.
pub async fn cache_long(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    CacheStrategy::CacheLong.apply(&mut response);
    response
}

/// Middleware for [`CacheStrategy::Private`] routes.
pub async fn cache_private(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    CacheStrategy::Private.apply(&mut response);
    response
}
