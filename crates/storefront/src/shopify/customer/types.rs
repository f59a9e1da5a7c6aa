//! Types for Shopify Customer Account API OAuth and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tidepool_core::{FinancialStatus, FulfillmentStatus, Money};

use crate::shopify::queries::fragments::{ImageNode, money, optional_money};

/// Seconds before expiry at which a token counts as expired.
pub const TOKEN_EXPIRY_BUFFER_SECS: i64 = 60;

// ─────────────────────────────────────────────────────────────────────────────
// OAuth Types
// ─────────────────────────────────────────────────────────────────────────────

/// Customer access token obtained via OAuth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerAccessToken {
    /// The access token for API requests.
    pub access_token: String,
    /// The ID token (`OpenID` Connect), needed for logout.
    pub id_token: Option<String>,
    /// The refresh token for obtaining new access tokens.
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds.
    pub expires_in: Option<i64>,
    /// Unix timestamp when the token was obtained.
    pub obtained_at: i64,
}

impl CustomerAccessToken {
    /// Check if the access token is expired, with a 60s buffer.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    /// Expiry check against an explicit clock.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_in.is_some_and(|expires_in| {
            let expires_at = self.obtained_at + expires_in;
            now >= expires_at - TOKEN_EXPIRY_BUFFER_SECS
        })
    }
}

/// Raw token response from the OAuth token endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: String,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    pub(super) fn into_token(self, previous_refresh: Option<&str>) -> CustomerAccessToken {
        CustomerAccessToken {
            access_token: self.access_token,
            id_token: self.id_token,
            // Refresh responses may omit the refresh token; keep the old one
            refresh_token: self
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string)),
            expires_in: self.expires_in,
            obtained_at: Utc::now().timestamp(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Customer Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct EmailAddressNode {
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PhoneNumberNode {
    pub phone_number: Option<String>,
}

/// A signed-in customer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(rename = "emailAddress")]
    email_address: Option<EmailAddressNode>,
    #[serde(rename = "phoneNumber")]
    phone_number: Option<PhoneNumberNode>,
    pub default_address: Option<Address>,
}

impl Customer {
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email_address
            .as_ref()
            .and_then(|e| e.email_address.as_deref())
    }

    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.phone_number
            .as_ref()
            .and_then(|p| p.phone_number.as_deref())
    }

    /// First and last name, whichever are set.
    #[must_use]
    pub fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => String::new(),
        }
    }

    /// Name for greetings, falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = self.full_name();
        if name.is_empty() {
            self.email().unwrap_or("there").to_string()
        } else {
            name
        }
    }
}

/// A customer address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    /// Province/state code.
    pub zone_code: Option<String>,
    pub country: Option<String>,
    /// ISO country code.
    pub territory_code: Option<String>,
    pub zip: Option<String>,
    pub phone_number: Option<String>,
}

impl Address {
    /// The address on one line, skipping empty parts.
    #[must_use]
    pub fn formatted_single_line(&self) -> String {
        [
            &self.address1,
            &self.address2,
            &self.city,
            &self.zone_code,
            &self.zip,
            &self.country,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref().filter(|p| !p.is_empty()))
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// An order in the customer's history.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: String,
    /// Display name (e.g., "#1001").
    pub name: String,
    pub processed_at: String,
    #[serde(default)]
    pub financial_status: Option<FinancialStatus>,
    #[serde(default)]
    pub fulfillment_status: Option<FulfillmentStatus>,
    #[serde(deserialize_with = "money")]
    pub total_price: Money,
}

impl OrderSummary {
    /// Processed date for display, e.g. "March 4, 2026".
    #[must_use]
    pub fn processed_on(&self) -> String {
        format_date(&self.processed_at)
    }
}

/// One page of the order history.
#[derive(Debug, Clone, Default)]
pub struct OrderPage {
    pub orders: Vec<OrderSummary>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// A purchased line on an order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub title: String,
    pub variant_title: Option<String>,
    pub quantity: i64,
    pub image: Option<ImageNode>,
    #[serde(deserialize_with = "optional_money", default)]
    pub total_price: Option<Money>,
}

/// Shipment tracking details.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingInfo {
    pub number: Option<String>,
    pub url: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fulfillment {
    pub status: Option<String>,
    #[serde(default)]
    pub tracking_information: Vec<TrackingInfo>,
}

/// A single order with its lines, totals and shipments.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: String,
    pub name: String,
    pub processed_at: String,
    pub financial_status: Option<FinancialStatus>,
    pub fulfillment_status: Option<FulfillmentStatus>,
    pub subtotal: Option<Money>,
    pub total_shipping: Option<Money>,
    pub total_tax: Option<Money>,
    pub total_price: Money,
    pub line_items: Vec<OrderLineItem>,
    pub shipping_address: Option<Address>,
    pub fulfillments: Vec<Fulfillment>,
}

impl Order {
    #[must_use]
    pub fn processed_on(&self) -> String {
        format_date(&self.processed_at)
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn format_date(value: &str) -> String {
    parse_timestamp(value).map_or_else(
        || value.to_string(),
        |dt| dt.format("%B %-d, %Y").to_string(),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Input Types
// ─────────────────────────────────────────────────────────────────────────────

/// Input for creating or updating an address.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub territory_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Input for updating customer information.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdateInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal Response Types
// ─────────────────────────────────────────────────────────────────────────────

/// User error from a mutation.
#[derive(Debug, Deserialize)]
pub(super) struct CustomerUserError {
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn token(obtained_at: i64, expires_in: Option<i64>) -> CustomerAccessToken {
        CustomerAccessToken {
            access_token: "at".to_string(),
            id_token: None,
            refresh_token: Some("rt".to_string()),
            expires_in,
            obtained_at,
        }
    }

    #[test]
    fn test_token_expiry_buffer() {
        let t = token(1_000, Some(3_600));
        assert!(!t.is_expired_at(1_000));
        assert!(!t.is_expired_at(4_539));
        assert!(t.is_expired_at(4_540));
        assert!(!token(0, None).is_expired_at(i64::MAX));
    }

    #[test]
    fn test_refresh_keeps_previous_refresh_token() {
        let response = TokenResponse {
            access_token: "new".to_string(),
            id_token: None,
            refresh_token: None,
            expires_in: Some(3_600),
        };
        let t = response.into_token(Some("old-refresh"));
        assert_eq!(t.access_token, "new");
        assert_eq!(t.refresh_token.as_deref(), Some("old-refresh"));
    }

    #[test]
    fn test_customer_display_name() {
        let customer: Customer = serde_json::from_value(serde_json::json!({
            "id": "gid://shopify/Customer/1",
            "firstName": null,
            "lastName": null,
            "emailAddress": { "emailAddress": "sam@example.com" },
            "phoneNumber": null,
            "defaultAddress": null
        }))
        .unwrap();
        assert_eq!(customer.email(), Some("sam@example.com"));
        assert_eq!(customer.display_name(), "sam@example.com");
    }

    #[test]
    fn test_order_summary_deserializes() {
        let order: OrderSummary = serde_json::from_value(serde_json::json!({
            "id": "gid://shopify/Order/5",
            "name": "#1005",
            "processedAt": "2026-03-04T10:00:00Z",
            "financialStatus": "PAID",
            "fulfillmentStatus": "UNFULFILLED",
            "totalPrice": { "amount": "42.5", "currencyCode": "USD" }
        }))
        .unwrap();
        assert_eq!(order.total_price.to_string(), "$42.50");
        assert_eq!(order.financial_status, Some(FinancialStatus::Paid));
        assert_eq!(order.processed_on(), "March 4, 2026");
    }

    #[test]
    fn test_address_single_line() {
        let address = Address {
            id: "gid://shopify/CustomerAddress/1".to_string(),
            first_name: None,
            last_name: None,
            company: None,
            address1: Some("1 Harbor Way".to_string()),
            address2: Some(String::new()),
            city: Some("Portland".to_string()),
            province: None,
            zone_code: Some("ME".to_string()),
            country: Some("United States".to_string()),
            territory_code: Some("US".to_string()),
            zip: Some("04101".to_string()),
            phone_number: None,
        };
        assert_eq!(
            address.formatted_single_line(),
            "1 Harbor Way, Portland, ME, 04101, United States"
        );
    }
}
