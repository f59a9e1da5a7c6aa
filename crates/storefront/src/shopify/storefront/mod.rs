//! Shopify Storefront API client implementation.
//!
//! Uses `graphql_client` request/response types with `reqwest` 0.13 for HTTP.
//! Products, collections, pages and policies are cached with `moka`
//! (5-minute TTL); carts always go to the API.

mod cache;
mod conversions;
pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{GraphQLQuery, Response};
use moka::future::Cache;
use secrecy::ExposeSecret;
use tracing::{debug, instrument};

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::types::{
    Cart, CartBuyerIdentityInput, CartLineInput, CartLineUpdateInput, Collection,
    CollectionConnection, Page, PolicyKind, PredictiveSearch, Product, ProductConnection,
    ProductRecommendationIntent, SearchResults, ShopPolicy, SortOption,
};
use crate::shopify::{GraphQLError, GraphQLErrorLocation, ShopifyError};

use cache::CacheValue;
use conversions::{
    convert_cart, convert_collection, convert_collection_connection, convert_page,
    convert_policy, convert_predictive_search, convert_product, convert_product_connection,
    convert_search, format_user_errors,
};
use queries::fragments::CartMutationPayload;
use queries::{
    AddToCart, CreateCart, CreateCustomer, GetCart, GetCollectionByHandle, GetCollections,
    GetPage, GetProductByHandle, GetProductRecommendations, GetProducts, GetShopPolicies,
    PredictiveSearch as PredictiveSearchQuery, RemoveFromCart, SearchProducts,
    UpdateCartBuyerIdentity, UpdateCartDiscountCodes, UpdateCartGiftCardCodes, UpdateCartLines,
    UpdateCartNote, add_to_cart, create_cart, create_customer, get_cart,
    get_collection_by_handle, get_collections, get_page, get_product_by_handle,
    get_product_recommendations, get_products, get_shop_policies, predictive_search,
    remove_from_cart, search_products, update_cart_buyer_identity, update_cart_discount_codes,
    update_cart_gift_card_codes, update_cart_lines, update_cart_note,
};

/// Longest body excerpt written to logs.
const LOG_BODY_LIMIT: usize = 500;

fn excerpt(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}

/// Turn a cart mutation payload into the updated cart.
///
/// User errors win over a returned cart; a payload with neither is reported
/// as a GraphQL error naming the mutation.
fn finish_cart_mutation(
    payload: Option<CartMutationPayload>,
    mutation: &str,
) -> Result<Cart, ShopifyError> {
    let payload = payload.ok_or_else(|| {
        ShopifyError::GraphQL(vec![GraphQLError::message(format!(
            "{mutation} returned no payload"
        ))])
    })?;

    if !payload.user_errors.is_empty() {
        return Err(ShopifyError::UserError(format_user_errors(
            &payload.user_errors,
        )));
    }

    payload.cart.map(convert_cart).ok_or_else(|| {
        ShopifyError::GraphQL(vec![GraphQLError::message(format!(
            "{mutation} returned no cart"
        ))])
    })
}

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Cheap to clone; all clones share the HTTP client and cache.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    cache: Cache<String, CacheValue>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint: config.storefront_endpoint(),
                access_token: config.storefront_private_token.expose_secret().to_string(),
                cache,
            }),
        }
    }

    /// GraphQL endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            // Private access tokens use a different header than public tokens
            .header("Shopify-Storefront-Private-Token", &self.inner.access_token)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                operation = request_body.operation_name,
                body = %excerpt(&response_text, LOG_BODY_LIMIT),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::GraphQL(vec![GraphQLError::message(format!(
                "HTTP {status}: {}",
                excerpt(&response_text, 200)
            ))]));
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    operation = request_body.operation_name,
                    body = %excerpt(&response_text, LOG_BODY_LIMIT),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            tracing::debug!(errors = ?errors, "GraphQL errors in response");

            return Err(ShopifyError::GraphQL(
                errors
                    .into_iter()
                    .map(|e| GraphQLError {
                        message: e.message,
                        locations: e.locations.map_or_else(Vec::new, |locs| {
                            locs.into_iter()
                                .map(|l| GraphQLErrorLocation {
                                    line: i64::from(l.line),
                                    column: i64::from(l.column),
                                })
                                .collect()
                        }),
                        path: e.path.map_or_else(Vec::new, |p| {
                            p.into_iter()
                                .map(|fragment| match fragment {
                                    graphql_client::PathFragment::Key(s) => {
                                        serde_json::Value::String(s)
                                    }
                                    graphql_client::PathFragment::Index(i) => {
                                        serde_json::Value::Number(i.into())
                                    }
                                })
                                .collect()
                        }),
                    })
                    .collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %excerpt(&response_text, LOG_BODY_LIMIT),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::GraphQL(vec![GraphQLError::message("No data in response")])
        })
    }

    // =========================================================================
    // Cache
    // =========================================================================

    async fn cached(&self, key: &str) -> Option<CacheValue> {
        let value = self.inner.cache.get(key).await;
        if value.is_some() {
            debug!(key, "Storefront cache hit");
        }
        value
    }

    async fn remember(&self, key: String, value: CacheValue) {
        self.inner.cache.insert(key, value).await;
    }

    /// Drop a cached product so the next request refetches it.
    pub async fn invalidate_product(&self, handle: &str) {
        self.inner.cache.invalidate(&format!("product:{handle}")).await;
    }

    /// Drop every cached catalog and content entry.
    pub fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::NotFound`] if no product has this handle, or
    /// an error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<Product, ShopifyError> {
        let cache_key = format!("product:{handle}");
        if let Some(CacheValue::Product(product)) = self.cached(&cache_key).await {
            return Ok(*product);
        }

        let data = self
            .execute::<GetProductByHandle>(get_product_by_handle::Variables {
                handle: handle.to_string(),
            })
            .await?;

        let product = data
            .product
            .map(convert_product)
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))?;

        self.remember(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get a page of the full catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(
        &self,
        first: i64,
        after: Option<String>,
        sort: SortOption,
    ) -> Result<ProductConnection, ShopifyError> {
        let cache_key = format!(
            "products:{first}:{}:{}",
            after.as_deref().unwrap_or(""),
            sort.param()
        );
        if let Some(CacheValue::Products(products)) = self.cached(&cache_key).await {
            return Ok(products);
        }

        let (sort_key, reverse) = sort.for_products();
        let data = self
            .execute::<GetProducts>(get_products::Variables {
                first,
                after,
                query: None,
                sort_key: Some(sort_key),
                reverse: Some(reverse),
            })
            .await?;

        let connection = convert_product_connection(data.products);
        self.remember(cache_key, CacheValue::Products(connection.clone()))
            .await;

        Ok(connection)
    }

    /// Get products related to a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product_recommendations(
        &self,
        product_id: &str,
        intent: Option<ProductRecommendationIntent>,
    ) -> Result<Vec<Product>, ShopifyError> {
        let data = self
            .execute::<GetProductRecommendations>(get_product_recommendations::Variables {
                product_id: product_id.to_string(),
                intent,
            })
            .await?;

        Ok(data
            .product_recommendations
            .map(|recs| recs.into_iter().map(convert_product).collect())
            .unwrap_or_default())
    }

    // =========================================================================
    // Collection Methods
    // =========================================================================

    /// Get a collection and one page of its products.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::NotFound`] if no collection has this handle,
    /// or an error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_collection_by_handle(
        &self,
        handle: &str,
        first: i64,
        after: Option<String>,
        sort: SortOption,
    ) -> Result<Collection, ShopifyError> {
        let cache_key = format!(
            "collection:{handle}:{first}:{}:{}",
            after.as_deref().unwrap_or(""),
            sort.param()
        );
        if let Some(CacheValue::Collection(collection)) = self.cached(&cache_key).await {
            return Ok(*collection);
        }

        let (sort_key, reverse) = sort.for_collection();
        let data = self
            .execute::<GetCollectionByHandle>(get_collection_by_handle::Variables {
                handle: handle.to_string(),
                first,
                after,
                sort_key: Some(sort_key),
                reverse: Some(reverse),
            })
            .await?;

        let collection = data
            .collection
            .map(convert_collection)
            .ok_or_else(|| ShopifyError::NotFound(format!("Collection not found: {handle}")))?;

        self.remember(
            cache_key,
            CacheValue::Collection(Box::new(collection.clone())),
        )
        .await;

        Ok(collection)
    }

    /// Get a page of collections, without their products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_collections(
        &self,
        first: i64,
        after: Option<String>,
    ) -> Result<CollectionConnection, ShopifyError> {
        let cache_key = format!("collections:{first}:{}", after.as_deref().unwrap_or(""));
        if let Some(CacheValue::Collections(collections)) = self.cached(&cache_key).await {
            return Ok(collections);
        }

        let data = self
            .execute::<GetCollections>(get_collections::Variables { first, after })
            .await?;

        let connection = convert_collection_connection(data.collections);
        self.remember(cache_key, CacheValue::Collections(connection.clone()))
            .await;

        Ok(connection)
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Full-text product search.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search_products(
        &self,
        query: &str,
        first: i64,
        after: Option<String>,
        sort: SortOption,
    ) -> Result<SearchResults, ShopifyError> {
        let (sort_key, reverse) = sort.for_search();
        let data = self
            .execute::<SearchProducts>(search_products::Variables {
                query: query.to_string(),
                first,
                after,
                sort_key: Some(sort_key),
                reverse: Some(reverse),
            })
            .await?;

        Ok(convert_search(data.search))
    }

    /// Type-ahead suggestions for the search box.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn predictive_search(
        &self,
        query: &str,
        limit: i64,
    ) -> Result<PredictiveSearch, ShopifyError> {
        let data = self
            .execute::<PredictiveSearchQuery>(predictive_search::Variables {
                query: query.to_string(),
                limit,
            })
            .await?;

        Ok(convert_predictive_search(data.predictive_search))
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// Get an online store page by handle.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::NotFound`] if the page does not exist, or an
    /// error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_page_by_handle(&self, handle: &str) -> Result<Page, ShopifyError> {
        let cache_key = format!("page:{handle}");
        if let Some(CacheValue::Page(page)) = self.cached(&cache_key).await {
            return Ok(*page);
        }

        let data = self
            .execute::<GetPage>(get_page::Variables {
                handle: handle.to_string(),
            })
            .await?;

        let page = data
            .page
            .map(convert_page)
            .ok_or_else(|| ShopifyError::NotFound(format!("Page not found: {handle}")))?;

        self.remember(cache_key, CacheValue::Page(Box::new(page.clone())))
            .await;

        Ok(page)
    }

    /// Get one of the shop's legal policies.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::NotFound`] if the shop has not published this
    /// policy, or an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_shop_policy(&self, kind: PolicyKind) -> Result<ShopPolicy, ShopifyError> {
        let cache_key = format!("policy:{}", kind.handle());
        if let Some(CacheValue::Policy(policy)) = self.cached(&cache_key).await {
            return Ok(*policy);
        }

        let data = self
            .execute::<GetShopPolicies>(get_shop_policies::Variables {})
            .await?;

        let shop = data.shop;
        let policy = match kind {
            PolicyKind::Privacy => shop.privacy_policy,
            PolicyKind::Refund => shop.refund_policy,
            PolicyKind::Shipping => shop.shipping_policy,
            PolicyKind::TermsOfService => shop.terms_of_service,
        }
        .map(convert_policy)
        .ok_or_else(|| ShopifyError::NotFound(format!("Policy not found: {}", kind.handle())))?;

        self.remember(cache_key, CacheValue::Policy(Box::new(policy.clone())))
            .await;

        Ok(policy)
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Create a customer record, used for newsletter sign-ups.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::UserError`] with the platform's messages (for
    /// example "Email has already been taken"), or an error if the API
    /// request fails.
    #[instrument(skip(self, password))]
    pub async fn create_customer(
        &self,
        email: &str,
        password: &str,
        accepts_marketing: bool,
    ) -> Result<String, ShopifyError> {
        let data = self
            .execute::<CreateCustomer>(create_customer::Variables {
                input: create_customer::CustomerCreateInput {
                    email: email.to_string(),
                    password: password.to_string(),
                    accepts_marketing,
                },
            })
            .await?;

        let payload = data.customer_create.ok_or_else(|| {
            ShopifyError::GraphQL(vec![GraphQLError::message(
                "customerCreate returned no payload",
            )])
        })?;

        if !payload.customer_user_errors.is_empty() {
            return Err(ShopifyError::UserError(format_user_errors(
                &payload.customer_user_errors,
            )));
        }

        payload
            .customer
            .map(|c| c.id)
            .ok_or_else(|| ShopifyError::UserError("Customer was not created".to_string()))
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Create a new cart, optionally with initial lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the input is rejected.
    #[instrument(skip(self, lines))]
    pub async fn create_cart(
        &self,
        lines: Vec<CartLineInput>,
        buyer_identity: Option<CartBuyerIdentityInput>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<CreateCart>(create_cart::Variables {
                input: create_cart::CartInput {
                    lines,
                    note: None,
                    buyer_identity,
                },
            })
            .await?;

        finish_cart_mutation(data.cart_create, "cartCreate")
    }

    /// Get a cart by ID.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::NotFound`] if the cart has expired or never
    /// existed, or an error if the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &str) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<GetCart>(get_cart::Variables {
                cart_id: cart_id.to_string(),
            })
            .await?;

        data.cart
            .map(convert_cart)
            .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {cart_id}")))
    }

    /// Add lines to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the lines are rejected.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn add_to_cart(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<AddToCart>(add_to_cart::Variables {
                cart_id: cart_id.to_string(),
                lines,
            })
            .await?;

        finish_cart_mutation(data.cart_lines_add, "cartLinesAdd")
    }

    /// Change line quantities. A quantity of zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the update is rejected.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn update_cart(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<UpdateCartLines>(update_cart_lines::Variables {
                cart_id: cart_id.to_string(),
                lines,
            })
            .await?;

        finish_cart_mutation(data.cart_lines_update, "cartLinesUpdate")
    }

    /// Remove lines from a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the removal is rejected.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn remove_from_cart(
        &self,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<RemoveFromCart>(remove_from_cart::Variables {
                cart_id: cart_id.to_string(),
                line_ids,
            })
            .await?;

        finish_cart_mutation(data.cart_lines_remove, "cartLinesRemove")
    }

    /// Replace the cart's discount codes. An empty list clears them.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn update_discount_codes(
        &self,
        cart_id: &str,
        discount_codes: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<UpdateCartDiscountCodes>(update_cart_discount_codes::Variables {
                cart_id: cart_id.to_string(),
                discount_codes,
            })
            .await?;

        finish_cart_mutation(data.cart_discount_codes_update, "cartDiscountCodesUpdate")
    }

    /// Replace the cart's gift card codes.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or a code is rejected.
    #[instrument(skip(self, gift_card_codes), fields(cart_id = %cart_id))]
    pub async fn update_gift_card_codes(
        &self,
        cart_id: &str,
        gift_card_codes: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<UpdateCartGiftCardCodes>(update_cart_gift_card_codes::Variables {
                cart_id: cart_id.to_string(),
                gift_card_codes,
            })
            .await?;

        finish_cart_mutation(data.cart_gift_card_codes_update, "cartGiftCardCodesUpdate")
    }

    /// Set the buyer's email and country on the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the identity is rejected.
    #[instrument(skip(self, buyer_identity), fields(cart_id = %cart_id))]
    pub async fn update_buyer_identity(
        &self,
        cart_id: &str,
        buyer_identity: CartBuyerIdentityInput,
    ) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<UpdateCartBuyerIdentity>(update_cart_buyer_identity::Variables {
                cart_id: cart_id.to_string(),
                buyer_identity,
            })
            .await?;

        finish_cart_mutation(data.cart_buyer_identity_update, "cartBuyerIdentityUpdate")
    }

    /// Set the order note.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, note), fields(cart_id = %cart_id))]
    pub async fn update_cart_note(&self, cart_id: &str, note: &str) -> Result<Cart, ShopifyError> {
        let data = self
            .execute::<UpdateCartNote>(update_cart_note::Variables {
                cart_id: cart_id.to_string(),
                note: note.to_string(),
            })
            .await?;

        finish_cart_mutation(data.cart_note_update, "cartNoteUpdate")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_user_errors_win() {
        let payload: CartMutationPayload = serde_json::from_value(serde_json::json!({
            "cart": null,
            "userErrors": [
                { "code": "INVALID", "field": ["lines", "0", "quantity"], "message": "Quantity must be positive" },
                { "code": null, "field": null, "message": "Try again" }
            ]
        }))
        .unwrap();

        let err = finish_cart_mutation(Some(payload), "cartLinesUpdate").unwrap_err();
        assert_eq!(
            err.to_string(),
            "User error: Quantity must be positive; Try again"
        );
    }

    #[test]
    fn test_mutation_without_payload() {
        let err = finish_cart_mutation(None, "cartLinesAdd").unwrap_err();
        assert!(matches!(err, ShopifyError::GraphQL(_)));
        assert!(err.to_string().contains("cartLinesAdd returned no payload"));
    }

    #[test]
    fn test_mutation_without_cart_or_errors() {
        let payload: CartMutationPayload =
            serde_json::from_value(serde_json::json!({ "cart": null, "userErrors": [] })).unwrap();
        let err = finish_cart_mutation(Some(payload), "cartNoteUpdate").unwrap_err();
        assert!(err.to_string().contains("cartNoteUpdate returned no cart"));
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("héllo", 2), "hé");
        assert_eq!(excerpt("ok", 10), "ok");
    }
}
