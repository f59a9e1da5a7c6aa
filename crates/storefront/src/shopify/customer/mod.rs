//! Shopify Customer Account API client.
//!
//! Customers sign in with OAuth 2.0 on the platform's hosted login page:
//!
//! 1. Redirect to [`CustomerClient::authorization_url`] with a random state
//!    and nonce stored in the session.
//! 2. The platform redirects back with an authorization code.
//! 3. [`CustomerClient::exchange_code`] turns the code into tokens.
//! 4. Account queries run with the customer's access token;
//!    [`CustomerClient::refresh_token`] renews it before it expires.

mod types;

pub use types::*;

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tidepool_core::Money;
use tracing::instrument;

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::ShopifyError;
use crate::shopify::queries::fragments::{Connection, Nodes, money, optional_money};

// ─────────────────────────────────────────────────────────────────────────────
// GraphQL Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
}

impl<T> GraphQLResponse<T> {
    fn into_result(self) -> Result<T, ShopifyError> {
        if let Some(errors) = self.errors
            && !errors.is_empty()
        {
            let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
            return Err(ShopifyError::OAuth(messages.join("; ")));
        }

        self.data
            .ok_or_else(|| ShopifyError::OAuth("No data in response".to_string()))
    }
}

/// Fail with the joined messages when a mutation reported user errors.
fn check_user_errors(errors: &[CustomerUserError]) -> Result<(), ShopifyError> {
    if errors.is_empty() {
        return Ok(());
    }
    let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
    Err(ShopifyError::UserError(messages.join(", ")))
}

macro_rules! address_fields {
    () => {
        "id firstName lastName company address1 address2 city province zoneCode \
         country territoryCode zip phoneNumber"
    };
}

macro_rules! money_fields {
    () => {
        "{ amount currencyCode }"
    };
}

macro_rules! customer_fields {
    () => {
        concat!(
            "id firstName lastName emailAddress { emailAddress } phoneNumber { phoneNumber } ",
            "defaultAddress { ",
            address_fields!(),
            " }"
        )
    };
}

// ─────────────────────────────────────────────────────────────────────────────
// Customer Account Client
// ─────────────────────────────────────────────────────────────────────────────

/// Client for the Shopify Customer Account API.
#[derive(Clone)]
pub struct CustomerClient {
    inner: Arc<CustomerClientInner>,
}

struct CustomerClientInner {
    client: reqwest::Client,
    store_id: String,
    api_version: String,
    client_id: String,
    client_secret: String,
}

impl CustomerClient {
    /// Create a new Customer Account API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        Self {
            inner: Arc::new(CustomerClientInner {
                client: reqwest::Client::new(),
                store_id: config.customer_shop_id.clone(),
                api_version: config.api_version.clone(),
                client_id: config.customer_client_id.clone(),
                client_secret: config.customer_client_secret.expose_secret().to_string(),
            }),
        }
    }

    /// Get the OAuth client ID (safe to expose in frontend).
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    fn token_url(&self) -> String {
        format!("https://shopify.com/{}/auth/oauth/token", self.inner.store_id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // OAuth Flow
    // ─────────────────────────────────────────────────────────────────────────

    /// Generate the authorization URL for customer login.
    ///
    /// Redirect customers to this URL to begin the OAuth flow.
    ///
    /// # Arguments
    ///
    /// * `redirect_uri` - The callback URL to redirect to after authentication
    /// * `state` - A random string stored in the session to prevent CSRF attacks
    /// * `nonce` - A random string for `OpenID` Connect replay protection
    ///
    /// # Returns
    ///
    /// The full authorization URL to redirect the customer to.
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str, state: &str, nonce: &str) -> String {
        format!(
            "https://shopify.com/{}/auth/oauth/authorize?\
            client_id={}&\
            response_type=code&\
            redirect_uri={}&\
            scope=openid%20email%20customer-account-api:full&\
            state={}&\
            nonce={}",
            self.inner.store_id,
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state),
            urlencoding::encode(nonce)
        )
    }

    /// Generate the logout URL.
    ///
    /// # Arguments
    ///
    /// * `id_token` - The ID token from the current session
    /// * `post_logout_redirect_uri` - Where to redirect after logout
    ///
    /// # Returns
    ///
    /// The full logout URL to redirect the customer to.
    #[must_use]
    pub fn logout_url(&self, id_token: &str, post_logout_redirect_uri: &str) -> String {
        format!(
            "https://shopify.com/{}/auth/oauth/logout?\
            id_token_hint={}&\
            post_logout_redirect_uri={}",
            self.inner.store_id,
            urlencoding::encode(id_token),
            urlencoding::encode(post_logout_redirect_uri)
        )
    }

    /// Exchange an authorization code for access tokens.
    ///
    /// # Arguments
    ///
    /// * `code` - The authorization code from the OAuth callback
    /// * `redirect_uri` - The same redirect URI used in the authorization request
    ///
    /// # Errors
    ///
    /// Returns an error if the token exchange fails.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        let url = self.token_url();

        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", &self.inner.client_id),
            ("client_secret", &self.inner.client_secret),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self.inner.client.post(&url).form(&params).send().await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::OAuth(format!(
                "Token exchange failed: {text}"
            )));
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(token_response.into_token(None))
    }

    /// Refresh an access token using a refresh token.
    ///
    /// # Arguments
    ///
    /// * `refresh_token` - The refresh token from a previous authentication
    ///
    /// # Errors
    ///
    /// Returns an error if the token refresh fails.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        let url = self.token_url();

        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", &self.inner.client_id),
            ("client_secret", &self.inner.client_secret),
            ("refresh_token", refresh_token),
        ];

        let response = self.inner.client.post(&url).form(&params).send().await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::OAuth(format!("Token refresh failed: {text}")));
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(token_response.into_token(Some(refresh_token)))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // GraphQL Execution
    // ─────────────────────────────────────────────────────────────────────────

    /// Execute a GraphQL query against the Customer Account API.
    async fn query<T: DeserializeOwned>(
        &self,
        access_token: &str,
        query: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<T, ShopifyError> {
        let url = format!(
            "https://shopify.com/{}/account/customer/api/{}/graphql",
            self.inner.store_id, self.inner.api_version
        );

        let request = GraphQLRequest { query, variables };

        let response = self
            .inner
            .client
            .post(&url)
            .header("Authorization", access_token)
            .header("Content-Type", "application/json")
            .header("User-Agent", "Tidepool/1.0")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::OAuth(format!(
                "Customer API request failed ({status}): {text}"
            )));
        }

        let gql_response: GraphQLResponse<T> = response.json().await?;
        gql_response.into_result()
    }


    // ─────────────────────────────────────────────────────────────────────────
    // Customer Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn get_customer(&self, access_token: &str) -> Result<Customer, ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            customer: Customer,
        }

        const QUERY: &str = concat!("query GetCustomer { customer { ", customer_fields!(), " } }");

        let response: Response = self.query(access_token, QUERY, None).await?;
        Ok(response.customer)
    }

    /// Update the customer's name.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the input is rejected.
    #[instrument(skip_all)]
    pub async fn update_customer(
        &self,
        access_token: &str,
        input: CustomerUpdateInput,
    ) -> Result<Customer, ShopifyError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Response {
            customer_update: Payload,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Payload {
            customer: Option<Customer>,
            user_errors: Vec<CustomerUserError>,
        }

        const QUERY: &str = concat!(
            "mutation UpdateCustomer($input: CustomerUpdateInput!) { ",
            "customerUpdate(input: $input) { customer { ",
            customer_fields!(),
            " } userErrors { field message code } } }"
        );

        let variables = serde_json::json!({ "input": input });
        let response: Response = self.query(access_token, QUERY, Some(variables)).await?;

        check_user_errors(&response.customer_update.user_errors)?;
        response
            .customer_update
            .customer
            .ok_or_else(|| ShopifyError::OAuth("No customer returned".to_string()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Order Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// One page of orders, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, access_token))]
    pub async fn get_orders(
        &self,
        access_token: &str,
        first: u32,
        after: Option<&str>,
    ) -> Result<OrderPage, ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            customer: CustomerWithOrders,
        }

        #[derive(Deserialize)]
        struct CustomerWithOrders {
            orders: Connection<OrderSummary>,
        }

        const QUERY: &str = concat!(
            "query GetOrders($first: Int!, $after: String) { customer { ",
            "orders(first: $first, after: $after, sortKey: PROCESSED_AT, reverse: true) { nodes { ",
            "id name processedAt financialStatus fulfillmentStatus totalPrice ",
            money_fields!(),
            " } pageInfo { hasNextPage hasPreviousPage startCursor endCursor } } } }"
        );

        let variables = serde_json::json!({ "first": first, "after": after });
        let response: Response = self.query(access_token, QUERY, Some(variables)).await?;
        let orders = response.customer.orders;

        Ok(OrderPage {
            orders: orders.nodes,
            has_next_page: orders.page_info.has_next_page,
            end_cursor: orders.page_info.end_cursor,
        })
    }

    /// A single order with line items and shipments.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::NotFound`] if the order does not exist or
    /// belongs to another customer, or an error if the API request fails.
    #[instrument(skip(self, access_token))]
    pub async fn get_order(&self, access_token: &str, order_id: &str) -> Result<Order, ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            order: Option<OrderNode>,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct OrderNode {
            id: String,
            name: String,
            processed_at: String,
            #[serde(default)]
            financial_status: Option<tidepool_core::FinancialStatus>,
            #[serde(default)]
            fulfillment_status: Option<tidepool_core::FulfillmentStatus>,
            #[serde(deserialize_with = "optional_money", default)]
            subtotal: Option<Money>,
            #[serde(deserialize_with = "optional_money", default)]
            total_shipping: Option<Money>,
            #[serde(deserialize_with = "optional_money", default)]
            total_tax: Option<Money>,
            #[serde(deserialize_with = "money")]
            total_price: Money,
            line_items: Nodes<OrderLineItem>,
            shipping_address: Option<Address>,
            fulfillments: Nodes<Fulfillment>,
        }

        const QUERY: &str = concat!(
            "query GetOrder($id: ID!) { order(id: $id) { ",
            "id name processedAt financialStatus fulfillmentStatus ",
            "subtotal ",
            money_fields!(),
            " totalShipping ",
            money_fields!(),
            " totalTax ",
            money_fields!(),
            " totalPrice ",
            money_fields!(),
            " lineItems(first: 50) { nodes { title variantTitle quantity ",
            "image { url altText width height } totalPrice ",
            money_fields!(),
            " } } shippingAddress { ",
            address_fields!(),
            " } fulfillments(first: 10) { nodes { status ",
            "trackingInformation { number url company } } } } }"
        );

        let variables = serde_json::json!({ "id": order_id });
        let response: Response = self.query(access_token, QUERY, Some(variables)).await?;

        let order = response
            .order
            .ok_or_else(|| ShopifyError::NotFound(format!("Order not found: {order_id}")))?;

        Ok(Order {
            id: order.id,
            name: order.name,
            processed_at: order.processed_at,
            financial_status: order.financial_status,
            fulfillment_status: order.fulfillment_status,
            subtotal: order.subtotal,
            total_shipping: order.total_shipping,
            total_tax: order.total_tax,
            total_price: order.total_price,
            line_items: order.line_items.nodes,
            shipping_address: order.shipping_address,
            fulfillments: order.fulfillments.nodes,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Address Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// The customer's saved addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, access_token))]
    pub async fn get_addresses(
        &self,
        access_token: &str,
        first: u32,
    ) -> Result<Vec<Address>, ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            customer: CustomerWithAddresses,
        }

        #[derive(Deserialize)]
        struct CustomerWithAddresses {
            addresses: Nodes<Address>,
        }

        const QUERY: &str = concat!(
            "query GetAddresses($first: Int!) { customer { addresses(first: $first) { nodes { ",
            address_fields!(),
            " } } } }"
        );

        let variables = serde_json::json!({ "first": first });
        let response: Response = self.query(access_token, QUERY, Some(variables)).await?;
        Ok(response.customer.addresses.nodes)
    }

    /// Save a new address, optionally as the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the address is rejected.
    #[instrument(skip_all)]
    pub async fn create_address(
        &self,
        access_token: &str,
        address: AddressInput,
        default_address: bool,
    ) -> Result<Address, ShopifyError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Response {
            customer_address_create: Payload,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Payload {
            customer_address: Option<Address>,
            user_errors: Vec<CustomerUserError>,
        }

        const QUERY: &str = concat!(
            "mutation CreateAddress($address: CustomerAddressInput!, $defaultAddress: Boolean) { ",
            "customerAddressCreate(address: $address, defaultAddress: $defaultAddress) { ",
            "customerAddress { ",
            address_fields!(),
            " } userErrors { field message code } } }"
        );

        let variables = serde_json::json!({
            "address": address,
            "defaultAddress": default_address,
        });
        let response: Response = self.query(access_token, QUERY, Some(variables)).await?;

        check_user_errors(&response.customer_address_create.user_errors)?;
        response
            .customer_address_create
            .customer_address
            .ok_or_else(|| ShopifyError::OAuth("No address returned".to_string()))
    }

    /// Update a saved address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the address is rejected.
    #[instrument(skip(self, access_token, address))]
    pub async fn update_address(
        &self,
        access_token: &str,
        address_id: &str,
        address: AddressInput,
        default_address: bool,
    ) -> Result<Address, ShopifyError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Response {
            customer_address_update: Payload,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Payload {
            customer_address: Option<Address>,
            user_errors: Vec<CustomerUserError>,
        }

        const QUERY: &str = concat!(
            "mutation UpdateAddress($addressId: ID!, $address: CustomerAddressInput, ",
            "$defaultAddress: Boolean) { ",
            "customerAddressUpdate(addressId: $addressId, address: $address, ",
            "defaultAddress: $defaultAddress) { customerAddress { ",
            address_fields!(),
            " } userErrors { field message code } } }"
        );

        let variables = serde_json::json!({
            "addressId": address_id,
            "address": address,
            "defaultAddress": default_address,
        });
        let response: Response = self.query(access_token, QUERY, Some(variables)).await?;

        check_user_errors(&response.customer_address_update.user_errors)?;
        response
            .customer_address_update
            .customer_address
            .ok_or_else(|| ShopifyError::OAuth("No address returned".to_string()))
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the deletion is rejected.
    #[instrument(skip(self, access_token))]
    pub async fn delete_address(
        &self,
        access_token: &str,
        address_id: &str,
    ) -> Result<(), ShopifyError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Response {
            customer_address_delete: Payload,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Payload {
            user_errors: Vec<CustomerUserError>,
        }

        const QUERY: &str = "mutation DeleteAddress($addressId: ID!) { \
            customerAddressDelete(addressId: $addressId) { \
            deletedAddressId userErrors { field message code } } }";

        let variables = serde_json::json!({ "addressId": address_id });
        let response: Response = self.query(access_token, QUERY, Some(variables)).await?;

        check_user_errors(&response.customer_address_delete.user_errors)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn client() -> CustomerClient {
        CustomerClient::new(&ShopifyStorefrontConfig {
            store: "tidepool.myshopify.com".to_string(),
            api_version: "2025-01".to_string(),
            storefront_endpoint: None,
            storefront_private_token: SecretString::from("shpat_test"),
            customer_shop_id: "12345".to_string(),
            customer_client_id: "client id".to_string(),
            customer_client_secret: SecretString::from("secret"),
        })
    }

    #[test]
    fn test_authorization_url_encodes_parameters() {
        let url = client().authorization_url("https://shop.test/auth/callback", "st&1", "n1");
        assert!(url.starts_with("https://shopify.com/12345/auth/oauth/authorize?"));
        assert!(url.contains("client_id=client%20id"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fshop.test%2Fauth%2Fcallback"));
        assert!(url.contains("state=st%261"));
        assert!(url.contains("scope=openid%20email%20customer-account-api:full"));
    }

    #[test]
    fn test_logout_url() {
        let url = client().logout_url("idt", "https://shop.test/");
        assert_eq!(
            url,
            "https://shopify.com/12345/auth/oauth/logout?id_token_hint=idt&post_logout_redirect_uri=https%3A%2F%2Fshop.test%2F"
        );
    }

    #[test]
    fn test_check_user_errors() {
        assert!(check_user_errors(&[]).is_ok());
        let errors = vec![
            CustomerUserError {
                message: "Zip is invalid".to_string(),
            },
            CustomerUserError {
                message: "City is blank".to_string(),
            },
        ];
        assert_eq!(
            check_user_errors(&errors).unwrap_err().to_string(),
            "User error: Zip is invalid, City is blank"
        );
    }

    #[test]
    fn test_graphql_errors_become_oauth_errors() {
        let response: GraphQLResponse<serde_json::Value> = serde_json::from_value(
            serde_json::json!({ "data": null, "errors": [{ "message": "Unauthorized" }] }),
        )
        .unwrap();
        assert_eq!(
            response.into_result().unwrap_err().to_string(),
            "Customer account error: Unauthorized"
        );
    }
}
