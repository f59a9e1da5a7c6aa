//! Cart conversions.

use crate::shopify::types::{
    AppliedGiftCard, Attribute, Cart, CartBuyerIdentity, CartCost, CartDiscountCode, CartLine,
    CartLineCost, CartMerchandise, CartMerchandiseProduct,
};

use super::super::queries::fragments::{CartLineNode, CartNode, UserErrorNode};
use super::{convert_image, convert_money, convert_selected_options};

fn convert_line(line: CartLineNode) -> CartLine {
    let merchandise = line.merchandise;
    CartLine {
        id: line.id,
        quantity: line.quantity,
        attributes: line
            .attributes
            .into_iter()
            .map(|a| Attribute {
                key: a.key,
                value: a.value,
            })
            .collect(),
        cost: CartLineCost {
            amount_per_quantity: convert_money(line.cost.amount_per_quantity),
            compare_at_amount_per_quantity: line
                .cost
                .compare_at_amount_per_quantity
                .map(convert_money),
            subtotal_amount: convert_money(line.cost.subtotal_amount),
            total_amount: convert_money(line.cost.total_amount),
        },
        merchandise: CartMerchandise {
            id: merchandise.id,
            title: merchandise.title,
            available_for_sale: merchandise.available_for_sale,
            price: convert_money(merchandise.price),
            selected_options: convert_selected_options(merchandise.selected_options),
            image: merchandise.image.map(convert_image),
            product: CartMerchandiseProduct {
                id: merchandise.product.id,
                handle: merchandise.product.handle,
                title: merchandise.product.title,
                vendor: merchandise.product.vendor,
                featured_image: merchandise.product.featured_image.map(convert_image),
            },
        },
        discount_allocations: line
            .discount_allocations
            .into_iter()
            .map(|d| convert_money(d.discounted_amount))
            .collect(),
    }
}

pub fn convert_cart(cart: CartNode) -> Cart {
    let buyer_identity = cart.buyer_identity.unwrap_or_default();
    Cart {
        id: cart.id,
        checkout_url: cart.checkout_url,
        note: cart.note.filter(|n| !n.is_empty()),
        total_quantity: cart.total_quantity,
        buyer_identity: CartBuyerIdentity {
            email: buyer_identity.email,
            country_code: buyer_identity.country_code,
        },
        cost: CartCost {
            subtotal: convert_money(cart.cost.subtotal_amount),
            total: convert_money(cart.cost.total_amount),
            total_tax: cart.cost.total_tax_amount.map(convert_money),
            total_duty: cart.cost.total_duty_amount.map(convert_money),
        },
        discount_codes: cart
            .discount_codes
            .into_iter()
            .map(|d| CartDiscountCode {
                code: d.code,
                applicable: d.applicable,
            })
            .collect(),
        applied_gift_cards: cart
            .applied_gift_cards
            .into_iter()
            .map(|g| AppliedGiftCard {
                id: g.id,
                last_characters: g.last_characters,
                amount_used: convert_money(g.amount_used),
            })
            .collect(),
        lines: cart.lines.nodes.into_iter().map(convert_line).collect(),
    }
}

/// Join mutation user errors into one message.
pub fn format_user_errors(errors: &[UserErrorNode]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cart_json() -> serde_json::Value {
        serde_json::json!({
            "id": "gid://shopify/Cart/abc",
            "checkoutUrl": "https://shop.example/checkouts/abc",
            "note": "",
            "totalQuantity": 2,
            "buyerIdentity": { "email": null, "countryCode": "US" },
            "cost": {
                "subtotalAmount": { "amount": "60.0", "currencyCode": "USD" },
                "totalAmount": { "amount": "60.0", "currencyCode": "USD" },
                "totalTaxAmount": null,
                "totalDutyAmount": null
            },
            "discountCodes": [{ "code": "SUMMER", "applicable": false }],
            "appliedGiftCards": [],
            "lines": { "nodes": [
                {
                    "id": "gid://shopify/CartLine/1",
                    "quantity": 2,
                    "attributes": [],
                    "cost": {
                        "amountPerQuantity": { "amount": "30.0", "currencyCode": "USD" },
                        "compareAtAmountPerQuantity": null,
                        "subtotalAmount": { "amount": "60.0", "currencyCode": "USD" },
                        "totalAmount": { "amount": "60.0", "currencyCode": "USD" }
                    },
                    "discountAllocations": [],
                    "merchandise": {
                        "id": "gid://shopify/ProductVariant/11",
                        "title": "M",
                        "availableForSale": true,
                        "price": { "amount": "30.0", "currencyCode": "USD" },
                        "selectedOptions": [{ "name": "Size", "value": "M" }],
                        "image": null,
                        "product": {
                            "id": "gid://shopify/Product/1",
                            "handle": "sunset-tee",
                            "title": "Sunset Tee",
                            "vendor": "Tidepool",
                            "featuredImage": null
                        }
                    }
                },
                {
                    "id": "gid://shopify/CartLine/2",
                    "quantity": 1,
                    "attributes": [{ "key": "_gift_with_purchase", "value": "true" }],
                    "cost": {
                        "amountPerQuantity": { "amount": "0.0", "currencyCode": "USD" },
                        "compareAtAmountPerQuantity": null,
                        "subtotalAmount": { "amount": "0.0", "currencyCode": "USD" },
                        "totalAmount": { "amount": "0.0", "currencyCode": "USD" }
                    },
                    "discountAllocations": [],
                    "merchandise": {
                        "id": "gid://shopify/ProductVariant/900",
                        "title": "Default Title",
                        "availableForSale": true,
                        "price": { "amount": "0.0", "currencyCode": "USD" },
                        "selectedOptions": [],
                        "image": null,
                        "product": {
                            "id": "gid://shopify/Product/9",
                            "handle": "tote",
                            "title": "Tote",
                            "vendor": "Tidepool",
                            "featuredImage": null
                        }
                    }
                }
            ] }
        })
    }

    #[test]
    fn test_convert_cart() {
        let node: CartNode = serde_json::from_value(cart_json()).unwrap();
        let cart = convert_cart(node);

        assert_eq!(cart.total_quantity, 2);
        assert_eq!(cart.note, None);
        assert_eq!(cart.buyer_identity.country_code.as_deref(), Some("US"));
        assert_eq!(cart.cost.subtotal.to_string(), "$60.00");
        assert!(!cart.discount_codes[0].applicable);
        assert_eq!(cart.lines.len(), 2);
        assert!(!cart.lines[0].is_gift());
        assert!(cart.lines[1].is_gift());
    }

    #[test]
    fn test_gift_lines_view() {
        let cart = convert_cart(serde_json::from_value(cart_json()).unwrap());
        let lines = cart.gift_lines();
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].line_total.to_string(), "$60.00");
        assert!(lines[1].is_gift);
    }

    #[test]
    fn test_format_user_errors() {
        let errors = vec![
            UserErrorNode {
                code: Some("INVALID".to_string()),
                field: None,
                message: "Quantity is too high".to_string(),
            },
            UserErrorNode {
                code: None,
                field: Some(vec!["lines".to_string()]),
                message: "Variant is sold out".to_string(),
            },
        ];
        assert_eq!(
            format_user_errors(&errors),
            "Quantity is too high; Variant is sold out"
        );
    }
}
