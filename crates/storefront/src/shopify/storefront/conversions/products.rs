//! Product, search and recommendation conversions.

use crate::shopify::types::{
    PredictiveCollection, PredictiveProduct, PredictiveSearch, PriceRange, Product,
    ProductConnection, ProductOption, ProductVariant, SearchResults, SellingPlan,
    SellingPlanGroup,
};

use super::super::queries::fragments::{Connection, ProductNode, VariantNode};
use super::super::queries::{predictive_search, search_products};
use super::{
    convert_image, convert_money, convert_page_info, convert_selected_options, convert_seo,
};

fn convert_variant(variant: VariantNode) -> ProductVariant {
    ProductVariant {
        id: variant.id,
        title: variant.title,
        available_for_sale: variant.available_for_sale,
        sku: variant.sku.filter(|s| !s.is_empty()),
        price: convert_money(variant.price),
        compare_at_price: variant.compare_at_price.map(convert_money),
        selected_options: convert_selected_options(variant.selected_options),
        image: variant.image.map(convert_image),
    }
}

/// Convert a product node. Card queries leave detail fields empty.
pub fn convert_product(product: ProductNode) -> Product {
    let price_range = PriceRange {
        min_variant_price: convert_money(product.price_range.min_variant_price),
        max_variant_price: convert_money(product.price_range.max_variant_price),
    };

    // Zero compare-at means "not on sale"
    let compare_at_price = product
        .compare_at_price_range
        .map(|range| convert_money(range.max_variant_price))
        .filter(|price| !price.is_zero());

    Product {
        id: product.id,
        handle: product.handle,
        title: product.title,
        vendor: product.vendor,
        available_for_sale: product.available_for_sale,
        tags: product.tags,
        description: product.description,
        description_html: product.description_html,
        product_type: product.product_type,
        seo: convert_seo(product.seo),
        price_range,
        compare_at_price,
        featured_image: product.featured_image.map(convert_image),
        images: product.images.nodes.into_iter().map(convert_image).collect(),
        options: product
            .options
            .into_iter()
            .map(|option| ProductOption {
                name: option.name,
                values: option.option_values.into_iter().map(|v| v.name).collect(),
            })
            .collect(),
        variants: product
            .variants
            .nodes
            .into_iter()
            .map(convert_variant)
            .collect(),
        selling_plan_groups: product
            .selling_plan_groups
            .nodes
            .into_iter()
            .map(|group| SellingPlanGroup {
                name: group.name,
                selling_plans: group
                    .selling_plans
                    .nodes
                    .into_iter()
                    .map(|plan| SellingPlan {
                        id: plan.id,
                        name: plan.name,
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub fn convert_product_connection(connection: Connection<ProductNode>) -> ProductConnection {
    ProductConnection {
        products: connection.nodes.into_iter().map(convert_product).collect(),
        page_info: convert_page_info(connection.page_info),
    }
}

pub fn convert_search(search: search_products::SearchConnection) -> SearchResults {
    SearchResults {
        total_count: search.total_count,
        products: ProductConnection {
            products: search.nodes.into_iter().map(convert_product).collect(),
            page_info: convert_page_info(search.page_info),
        },
    }
}

pub fn convert_predictive_search(
    result: Option<predictive_search::PredictiveSearchResult>,
) -> PredictiveSearch {
    let Some(result) = result else {
        return PredictiveSearch::default();
    };

    PredictiveSearch {
        products: result
            .products
            .into_iter()
            .map(|p| PredictiveProduct {
                handle: p.handle,
                title: p.title,
                price: p.price_range.map(|r| convert_money(r.min_variant_price)),
                image_url: p.featured_image.map(|i| i.url),
            })
            .collect(),
        collections: result
            .collections
            .into_iter()
            .map(|c| PredictiveCollection {
                handle: c.handle,
                title: c.title,
            })
            .collect(),
        queries: result.queries.into_iter().map(|q| q.text).collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product_json() -> serde_json::Value {
        serde_json::json!({
            "id": "gid://shopify/Product/1",
            "handle": "sunset-tee",
            "title": "Sunset Tee",
            "vendor": "Tidepool",
            "availableForSale": true,
            "tags": ["summer"],
            "description": "Soft cotton.",
            "descriptionHtml": "<p>Soft cotton.</p>",
            "productType": "Shirts",
            "seo": { "title": "", "description": "A tee" },
            "featuredImage": { "url": "https://cdn.example/tee.jpg", "altText": null, "width": 800, "height": 800 },
            "priceRange": {
                "minVariantPrice": { "amount": "28.00", "currencyCode": "USD" },
                "maxVariantPrice": { "amount": "32.00", "currencyCode": "USD" }
            },
            "compareAtPriceRange": { "maxVariantPrice": { "amount": "0.0", "currencyCode": "USD" } },
            "images": { "nodes": [] },
            "options": [{ "name": "Size", "optionValues": [{ "name": "S" }, { "name": "M" }] }],
            "variants": { "nodes": [{
                "id": "gid://shopify/ProductVariant/11",
                "title": "S",
                "availableForSale": true,
                "sku": "",
                "price": { "amount": "28.00", "currencyCode": "USD" },
                "compareAtPrice": null,
                "selectedOptions": [{ "name": "Size", "value": "S" }],
                "image": null
            }] },
            "sellingPlanGroups": { "nodes": [] }
        })
    }

    #[test]
    fn test_convert_product() {
        let node: ProductNode = serde_json::from_value(product_json()).unwrap();
        let product = convert_product(node);

        assert_eq!(product.handle, "sunset-tee");
        assert_eq!(product.price_range.min_variant_price.to_string(), "$28.00");
        assert!(!product.price_range.is_single_price());
        assert_eq!(product.options[0].values, vec!["S", "M"]);
        assert_eq!(product.variants[0].sku, None);
        assert_eq!(product.seo.title, None);
        assert_eq!(product.seo.description.as_deref(), Some("A tee"));
    }

    #[test]
    fn test_zero_compare_at_is_dropped() {
        let node: ProductNode = serde_json::from_value(product_json()).unwrap();
        assert!(convert_product(node).compare_at_price.is_none());
    }

    #[test]
    fn test_missing_predictive_search_is_empty() {
        let results = convert_predictive_search(None);
        assert!(results.products.is_empty());
        assert!(results.queries.is_empty());
    }
}
