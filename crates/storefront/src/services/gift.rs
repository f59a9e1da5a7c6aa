//! Applies the gift-with-purchase promotion to a cart.
//!
//! Runs after every cart mutation. The eligibility decision comes from
//! [`tidepool_core::gift::evaluate`]; this module turns it into at most one
//! extra cart mutation. Failures are logged and the cart is returned as it
//! was, so a broken promotion never blocks a purchase.

use tidepool_core::gift::{GIFT_ATTRIBUTE_KEY, GIFT_ATTRIBUTE_VALUE};
use tidepool_core::{GiftDecision, GiftPolicy};
use tracing::{info, instrument, warn};

use crate::shopify::{AttributeInput, Cart, CartLineInput, StorefrontClient};

/// Cart line that adds the gift.
#[must_use]
pub fn gift_line_input(policy: &GiftPolicy) -> CartLineInput {
    CartLineInput {
        merchandise_id: policy.variant_id.as_str().to_string(),
        quantity: 1,
        attributes: Some(vec![AttributeInput {
            key: GIFT_ATTRIBUTE_KEY.to_string(),
            value: GIFT_ATTRIBUTE_VALUE.to_string(),
        }]),
        selling_plan_id: None,
    }
}

/// Bring the cart in line with the promotion.
#[instrument(skip_all, fields(cart_id = %cart.id))]
pub async fn reconcile_gift(client: &StorefrontClient, policy: &GiftPolicy, cart: Cart) -> Cart {
    let decision = match tidepool_core::gift::evaluate(policy, &cart.gift_lines()) {
        Ok(decision) => decision,
        Err(e) => {
            warn!(error = %e, "Gift eligibility check failed");
            return cart;
        }
    };

    let result = match decision {
        GiftDecision::NoChange => return cart,
        GiftDecision::Add => {
            info!(variant_id = %policy.variant_id, "Adding gift to cart");
            client
                .add_to_cart(&cart.id, vec![gift_line_input(policy)])
                .await
        }
        GiftDecision::Remove { line_ids } => {
            info!(count = line_ids.len(), "Removing gift lines from cart");
            client.remove_from_cart(&cart.id, line_ids).await
        }
    };

    match result {
        Ok(updated) => updated,
        Err(e) => {
            warn!(error = %e, "Failed to apply gift with purchase");
            cart
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tidepool_core::{Money, VariantGid};

    #[test]
    fn test_gift_line_input_is_tagged() {
        let policy = GiftPolicy {
            variant_id: VariantGid::from_numeric(42),
            threshold: Money::parse("75.00", "USD").unwrap(),
        };
        let line = gift_line_input(&policy);
        assert_eq!(line.merchandise_id, "gid://shopify/ProductVariant/42");
        assert_eq!(line.quantity, 1);
        let attrs = line.attributes.unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].key, "_gift_with_purchase");
        assert_eq!(attrs[0].value, "true");
    }
}
