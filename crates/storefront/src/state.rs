//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::services::cdn::CdnClient;
use crate::services::media::MediaClient;
use crate::shopify::{CustomerClient, StorefrontClient};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// configuration and the API clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storefront: StorefrontClient,
    customer: CustomerClient,
    media: Option<MediaClient>,
    cdn: Option<CdnClient>,
}

impl AppState {
    /// Create the application state and its API clients.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let storefront = StorefrontClient::new(&config.shopify);
        let customer = CustomerClient::new(&config.shopify);
        let media = config.media.as_ref().map(MediaClient::new);
        let cdn = config.cdn.as_ref().map(CdnClient::new);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                storefront,
                customer,
                media,
                cdn,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    /// Get a reference to the Customer Account API client.
    #[must_use]
    pub fn customer(&self) -> &CustomerClient {
        &self.inner.customer
    }

    /// Image generation client, when configured.
    #[must_use]
    pub fn media(&self) -> Option<&MediaClient> {
        self.inner.media.as_ref()
    }

    /// Image CDN client, when configured.
    #[must_use]
    pub fn cdn(&self) -> Option<&CdnClient> {
        self.inner.cdn.as_ref()
    }
}
