//! Order status enums, as reported by the Customer Account API.

use serde::{Deserialize, Serialize};

/// Order fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentStatus {
    #[default]
    Unfulfilled,
    PartiallyFulfilled,
    Fulfilled,
    Restocked,
    OnHold,
    InProgress,
    /// Any status this storefront doesn't render specially.
    #[serde(other)]
    Other,
}

impl FulfillmentStatus {
    /// Parse the platform's enum string, mapping unknown values to `Other`.
    #[must_use]
    pub fn from_platform(value: &str) -> Self {
        match value {
            "UNFULFILLED" => Self::Unfulfilled,
            "PARTIALLY_FULFILLED" => Self::PartiallyFulfilled,
            "FULFILLED" => Self::Fulfilled,
            "RESTOCKED" => Self::Restocked,
            "ON_HOLD" => Self::OnHold,
            "IN_PROGRESS" => Self::InProgress,
            _ => Self::Other,
        }
    }

    /// Label shown on the order history page.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unfulfilled => "Unfulfilled",
            Self::PartiallyFulfilled => "Partially fulfilled",
            Self::Fulfilled => "Fulfilled",
            Self::Restocked => "Restocked",
            Self::OnHold => "On hold",
            Self::InProgress => "In progress",
            Self::Other => "Processing",
        }
    }
}

/// Order financial status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinancialStatus {
    #[default]
    Pending,
    Authorized,
    PartiallyPaid,
    Paid,
    PartiallyRefunded,
    Refunded,
    Voided,
    Expired,
    #[serde(other)]
    Other,
}

impl FinancialStatus {
    /// Parse the platform's enum string, mapping unknown values to `Other`.
    #[must_use]
    pub fn from_platform(value: &str) -> Self {
        match value {
            "PENDING" => Self::Pending,
            "AUTHORIZED" => Self::Authorized,
            "PARTIALLY_PAID" => Self::PartiallyPaid,
            "PAID" => Self::Paid,
            "PARTIALLY_REFUNDED" => Self::PartiallyRefunded,
            "REFUNDED" => Self::Refunded,
            "VOIDED" => Self::Voided,
            "EXPIRED" => Self::Expired,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Payment pending",
            Self::Authorized => "Authorized",
            Self::PartiallyPaid => "Partially paid",
            Self::Paid => "Paid",
            Self::PartiallyRefunded => "Partially refunded",
            Self::Refunded => "Refunded",
            Self::Voided => "Voided",
            Self::Expired => "Expired",
            Self::Other => "Unknown",
        }
    }

    /// True once money has gone back to the customer.
    #[must_use]
    pub const fn is_refunded(self) -> bool {
        matches!(self, Self::PartiallyRefunded | Self::Refunded)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fulfillment_from_platform() {
        assert_eq!(
            FulfillmentStatus::from_platform("PARTIALLY_FULFILLED"),
            FulfillmentStatus::PartiallyFulfilled
        );
        assert_eq!(
            FulfillmentStatus::from_platform("SCHEDULED"),
            FulfillmentStatus::Other
        );
        assert_eq!(FulfillmentStatus::Other.label(), "Processing");
    }

    #[test]
    fn test_financial_serde_tolerates_unknown() {
        let status: FinancialStatus = serde_json::from_str("\"PAID\"").unwrap();
        assert_eq!(status, FinancialStatus::Paid);
        let unknown: FinancialStatus = serde_json::from_str("\"CHARGEBACK\"").unwrap();
        assert_eq!(unknown, FinancialStatus::Other);
    }

    #[test]
    fn test_refunded() {
        assert!(FinancialStatus::Refunded.is_refunded());
        assert!(FinancialStatus::PartiallyRefunded.is_refunded());
        assert!(!FinancialStatus::Paid.is_refunded());
    }
}
