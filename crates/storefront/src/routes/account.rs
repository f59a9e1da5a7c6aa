//! Account route handlers.
//!
//! These routes require a signed-in Shopify customer. Data is read from the
//! Customer Account API with the customer's own token.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tidepool_core::{AddressGid, OrderGid, split_gid};
use tracing::{info, instrument, warn};

use super::views::{Pagination, with_query};
use crate::error::{AppError, Result, set_sentry_user};
use crate::filters;
use crate::middleware::{Layout, RequireShopifyCustomer};
use crate::shopify::customer::{Address, AddressInput, CustomerUpdateInput, Order, OrderSummary};
use crate::state::AppState;

/// Orders per page of order history.
const ORDERS_PAGE_SIZE: u32 = 10;

/// Orders shown on the overview.
const RECENT_ORDERS: u32 = 3;

/// Addresses fetched for the address book.
const MAX_ADDRESSES: u32 = 50;

// =============================================================================
// View Models
// =============================================================================

/// Customer display data for templates.
#[derive(Debug, Clone)]
pub struct CustomerView {
    pub display_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// Order row on the overview and history pages.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: String,
    pub name: String,
    pub date: String,
    pub financial_status: String,
    pub fulfillment_status: String,
    pub total: String,
}

impl From<&OrderSummary> for OrderView {
    fn from(order: &OrderSummary) -> Self {
        Self {
            id: trailing_id(&order.id),
            name: order.name.clone(),
            date: order.processed_on(),
            financial_status: order
                .financial_status
                .map(|status| status.label().to_string())
                .unwrap_or_default(),
            fulfillment_status: order
                .fulfillment_status
                .map(|status| status.label().to_string())
                .unwrap_or_default(),
            total: order.total_price.to_string(),
        }
    }
}

/// Order line item display data.
#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub title: String,
    pub variant_title: Option<String>,
    pub quantity: i64,
    pub total: String,
    pub image_url: Option<String>,
}

/// Shipment tracking link.
#[derive(Debug, Clone)]
pub struct TrackingView {
    pub company: String,
    pub number: String,
    pub url: Option<String>,
}

/// Order detail page data.
#[derive(Debug, Clone)]
pub struct OrderDetailView {
    pub summary: OrderView,
    pub lines: Vec<OrderLineView>,
    pub subtotal: Option<String>,
    pub shipping: Option<String>,
    pub tax: Option<String>,
    pub shipping_address: Option<String>,
    pub tracking: Vec<TrackingView>,
}

impl From<&Order> for OrderDetailView {
    fn from(order: &Order) -> Self {
        Self {
            summary: OrderView {
                id: trailing_id(&order.id),
                name: order.name.clone(),
                date: order.processed_on(),
                financial_status: order
                    .financial_status
                    .map(|status| status.label().to_string())
                    .unwrap_or_default(),
                fulfillment_status: order
                    .fulfillment_status
                    .map(|status| status.label().to_string())
                    .unwrap_or_default(),
                total: order.total_price.to_string(),
            },
            lines: order
                .line_items
                .iter()
                .map(|item| OrderLineView {
                    title: item.title.clone(),
                    variant_title: item
                        .variant_title
                        .clone()
                        .filter(|title| title != "Default Title"),
                    quantity: item.quantity,
                    total: item.total_price.map(|price| price.to_string()).unwrap_or_default(),
                    image_url: item.image.as_ref().map(|image| image.url.clone()),
                })
                .collect(),
            subtotal: order.subtotal.map(|m| m.to_string()),
            shipping: order.total_shipping.map(|m| m.to_string()),
            tax: order.total_tax.map(|m| m.to_string()),
            shipping_address: order
                .shipping_address
                .as_ref()
                .map(Address::formatted_single_line),
            tracking: order
                .fulfillments
                .iter()
                .flat_map(|fulfillment| &fulfillment.tracking_information)
                .filter_map(|info| {
                    info.number.as_ref().map(|number| TrackingView {
                        company: info.company.clone().unwrap_or_default(),
                        number: number.clone(),
                        url: info.url.clone(),
                    })
                })
                .collect(),
        }
    }
}

/// Address display and edit-form data.
#[derive(Debug, Clone)]
pub struct AddressView {
    pub id: String,
    pub name: String,
    pub single_line: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub zone_code: String,
    pub territory_code: String,
    pub zip: String,
    pub phone_number: String,
    pub is_default: bool,
}

impl AddressView {
    fn build(address: &Address, default_id: Option<&str>) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        let name = [&address.first_name, &address.last_name]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            id: trailing_id(&address.id),
            name,
            single_line: address.formatted_single_line(),
            first_name: text(&address.first_name),
            last_name: text(&address.last_name),
            company: text(&address.company),
            address1: text(&address.address1),
            address2: text(&address.address2),
            city: text(&address.city),
            zone_code: text(&address.zone_code),
            territory_code: text(&address.territory_code),
            zip: text(&address.zip),
            phone_number: text(&address.phone_number),
            is_default: default_id == Some(address.id.as_str()),
        }
    }
}

/// The numeric part of a global ID, used in account URLs.
fn trailing_id(gid: &str) -> String {
    split_gid(gid).map_or_else(|_| gid.to_string(), |(_, id)| id.to_string())
}

/// Parse a numeric ID from an account URL.
fn numeric_path_id(raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|_| AppError::NotFound(format!("Account resource: {raw}")))
}

// =============================================================================
// Templates
// =============================================================================

/// Account overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub layout: Layout,
    pub customer: CustomerView,
    pub recent_orders: Vec<OrderView>,
    pub default_address: Option<String>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderView>,
    pub pagination: Pagination,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderTemplate {
    pub layout: Layout,
    pub order: OrderDetailView,
}

/// Profile form template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub layout: Layout,
    pub customer: CustomerView,
    pub saved: bool,
}

/// Address book template.
#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AddressesTemplate {
    pub layout: Layout,
    pub addresses: Vec<AddressView>,
}

// =============================================================================
// Forms
// =============================================================================

/// Order history query parameters.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub after: Option<String>,
}

/// Profile query parameters.
#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    #[serde(default)]
    pub saved: bool,
}

/// Profile update form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Address create/update form data.
#[derive(Debug, Default, Deserialize)]
pub struct AddressForm {
    #[serde(default, rename = "_method")]
    pub method: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub address1: String,
    #[serde(default)]
    pub address2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zone_code: String,
    #[serde(default)]
    pub territory_code: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub phone_number: String,
    /// Checkbox; present when ticked.
    pub default_address: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl AddressForm {
    fn is_delete(&self) -> bool {
        self.method.eq_ignore_ascii_case("delete")
    }

    fn is_default(&self) -> bool {
        self.default_address.is_some()
    }

    fn to_input(&self) -> Result<AddressInput> {
        if non_empty(&self.address1).is_none() || non_empty(&self.territory_code).is_none() {
            return Err(AppError::BadRequest(
                "Street address and country are required".to_string(),
            ));
        }

        Ok(AddressInput {
            first_name: non_empty(&self.first_name),
            last_name: non_empty(&self.last_name),
            company: non_empty(&self.company),
            address1: non_empty(&self.address1),
            address2: non_empty(&self.address2),
            city: non_empty(&self.city),
            zone_code: non_empty(&self.zone_code).map(|code| code.to_ascii_uppercase()),
            territory_code: non_empty(&self.territory_code).map(|code| code.to_ascii_uppercase()),
            zip: non_empty(&self.zip),
            phone_number: non_empty(&self.phone_number),
        })
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display account overview page.
///
/// # Errors
///
/// Returns an error if the customer record cannot be loaded.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    layout: Layout,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
) -> Result<impl IntoResponse> {
    let customer_api = state.customer();
    let (customer, orders) = tokio::join!(
        customer_api.get_customer(&token.access_token),
        customer_api.get_orders(&token.access_token, RECENT_ORDERS, None),
    );
    let customer = customer?;
    set_sentry_user(&customer.id, None);

    let recent_orders = match orders {
        Ok(page) => page.orders.iter().map(OrderView::from).collect(),
        Err(e) => {
            warn!(error = %e, "Failed to load recent orders");
            Vec::new()
        }
    };

    Ok(AccountIndexTemplate {
        layout,
        default_address: customer
            .default_address
            .as_ref()
            .map(Address::formatted_single_line),
        customer: customer_view(&customer),
        recent_orders,
    })
}

fn customer_view(customer: &crate::shopify::customer::Customer) -> CustomerView {
    CustomerView {
        display_name: customer.display_name(),
        first_name: customer.first_name.clone().unwrap_or_default(),
        last_name: customer.last_name.clone().unwrap_or_default(),
        email: customer.email().unwrap_or_default().to_string(),
        phone: customer.phone().unwrap_or_default().to_string(),
    }
}

/// Display order history.
///
/// # Errors
///
/// Returns an error if the orders cannot be loaded.
#[instrument(skip_all)]
pub async fn orders(
    State(state): State<AppState>,
    layout: Layout,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
    Query(query): Query<OrdersQuery>,
) -> Result<impl IntoResponse> {
    let after = query.after.filter(|cursor| !cursor.is_empty());
    let page = state
        .customer()
        .get_orders(&token.access_token, ORDERS_PAGE_SIZE, after.as_deref())
        .await?;

    let pagination = Pagination {
        next_url: page
            .end_cursor
            .as_deref()
            .filter(|_| page.has_next_page)
            .map(|cursor| with_query("/account/orders", &[("after", cursor)])),
        first_url: after.is_some().then(|| "/account/orders".to_string()),
    };

    Ok(OrdersTemplate {
        layout,
        orders: page.orders.iter().map(OrderView::from).collect(),
        pagination,
    })
}

/// Display one order.
///
/// # Errors
///
/// Returns 404 if the order doesn't exist or belongs to someone else.
#[instrument(skip(state, layout, token))]
pub async fn order(
    State(state): State<AppState>,
    layout: Layout,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let order_id = OrderGid::from_numeric(numeric_path_id(&id)?);
    let order = state
        .customer()
        .get_order(&token.access_token, order_id.as_str())
        .await?;

    Ok(OrderTemplate {
        layout,
        order: OrderDetailView::from(&order),
    })
}

/// Display the profile form.
///
/// # Errors
///
/// Returns an error if the customer record cannot be loaded.
#[instrument(skip_all)]
pub async fn profile(
    State(state): State<AppState>,
    layout: Layout,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
    Query(query): Query<ProfileQuery>,
) -> Result<impl IntoResponse> {
    let customer = state.customer().get_customer(&token.access_token).await?;

    Ok(ProfileTemplate {
        layout,
        customer: customer_view(&customer),
        saved: query.saved,
    })
}

/// Update the customer's name.
///
/// # Errors
///
/// Returns 400 if Shopify rejects the update.
#[instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
    Form(form): Form<ProfileForm>,
) -> Result<Redirect> {
    state
        .customer()
        .update_customer(
            &token.access_token,
            CustomerUpdateInput {
                first_name: non_empty(&form.first_name),
                last_name: non_empty(&form.last_name),
            },
        )
        .await?;

    info!("Customer profile updated");
    Ok(Redirect::to("/account/profile?saved=true"))
}

/// Display the address book.
///
/// # Errors
///
/// Returns an error if the addresses cannot be loaded.
#[instrument(skip_all)]
pub async fn addresses(
    State(state): State<AppState>,
    layout: Layout,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
) -> Result<impl IntoResponse> {
    let customer_api = state.customer();
    let (customer, addresses) = tokio::join!(
        customer_api.get_customer(&token.access_token),
        customer_api.get_addresses(&token.access_token, MAX_ADDRESSES),
    );
    let default_id = customer
        .ok()
        .and_then(|customer| customer.default_address.map(|address| address.id));
    let addresses = addresses?;

    Ok(AddressesTemplate {
        layout,
        addresses: addresses
            .iter()
            .map(|address| AddressView::build(address, default_id.as_deref()))
            .collect(),
    })
}

/// Add an address.
///
/// # Errors
///
/// Returns 400 for an incomplete form or an address Shopify rejects.
#[instrument(skip_all)]
pub async fn create_address(
    State(state): State<AppState>,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
    Form(form): Form<AddressForm>,
) -> Result<Redirect> {
    state
        .customer()
        .create_address(&token.access_token, form.to_input()?, form.is_default())
        .await?;

    Ok(Redirect::to("/account/addresses"))
}

/// Update an address, or delete it when `_method=delete`.
///
/// # Errors
///
/// Returns 404 for a malformed ID and 400 for an address Shopify rejects.
#[instrument(skip(state, token, form))]
pub async fn update_address(
    State(state): State<AppState>,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
    Path(id): Path<String>,
    Form(form): Form<AddressForm>,
) -> Result<Redirect> {
    let address_id = AddressGid::from_numeric(numeric_path_id(&id)?);

    if form.is_delete() {
        state
            .customer()
            .delete_address(&token.access_token, address_id.as_str())
            .await?;
        info!("Customer address deleted");
    } else {
        state
            .customer()
            .update_address(
                &token.access_token,
                address_id.as_str(),
                form.to_input()?,
                form.is_default(),
            )
            .await?;
    }

    Ok(Redirect::to("/account/addresses"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_id() {
        assert_eq!(trailing_id("gid://shopify/Order/1234"), "1234");
        assert_eq!(trailing_id("not-a-gid"), "not-a-gid");
    }

    #[test]
    fn test_numeric_path_id() {
        assert_eq!(numeric_path_id("42").unwrap(), 42);
        assert_eq!(
            numeric_path_id("../42").unwrap_err().status(),
            axum::http::StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_address_form_to_input() {
        let form = AddressForm {
            first_name: " Ada ".to_string(),
            address1: "1 Harbour Rd".to_string(),
            territory_code: "ca".to_string(),
            zone_code: "bc".to_string(),
            default_address: Some("on".to_string()),
            ..AddressForm::default()
        };

        let input = form.to_input().unwrap();
        assert_eq!(input.first_name.as_deref(), Some("Ada"));
        assert_eq!(input.territory_code.as_deref(), Some("CA"));
        assert_eq!(input.zone_code.as_deref(), Some("BC"));
        assert!(input.company.is_none());
        assert!(form.is_default());
        assert!(!form.is_delete());
    }

    #[test]
    fn test_address_form_requires_street_and_country() {
        let form = AddressForm {
            city: "Tofino".to_string(),
            ..AddressForm::default()
        };
        assert_eq!(
            form.to_input().unwrap_err().status(),
            axum::http::StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_delete_method() {
        let form = AddressForm {
            method: "DELETE".to_string(),
            ..AddressForm::default()
        };
        assert!(form.is_delete());
    }

    #[test]
    fn test_address_view_marks_default() {
        let address = Address {
            id: "gid://shopify/CustomerAddress/7".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            company: None,
            address1: Some("1 Harbour Rd".to_string()),
            address2: None,
            city: Some("Tofino".to_string()),
            province: None,
            zone_code: Some("BC".to_string()),
            country: Some("Canada".to_string()),
            territory_code: Some("CA".to_string()),
            zip: None,
            phone_number: None,
        };

        let view = AddressView::build(&address, Some("gid://shopify/CustomerAddress/7"));
        assert_eq!(view.id, "7");
        assert_eq!(view.name, "Ada Lovelace");
        assert!(view.is_default);
        assert!(!AddressView::build(&address, None).is_default);
    }
}
