//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tidepool_core::ReviewSummary;
use tracing::{instrument, warn};

use super::views::{
    ImageView, Pagination, ProductCard, ReviewView, SortChoice, cards, sort_choices, with_query,
};
use crate::error::Result;
use crate::filters;
use crate::middleware::Layout;
use crate::shopify::types::{
    Product, ProductRecommendationIntent, ProductVariant, SelectedOption, SortOption,
};
use crate::state::AppState;

/// Products per listing page.
pub const PAGE_SIZE: i64 = 24;

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub after: Option<String>,
    pub sort: Option<String>,
}

impl ListingQuery {
    /// Non-empty cursor.
    #[must_use]
    pub fn cursor(&self) -> Option<String> {
        self.after.clone().filter(|c| !c.is_empty())
    }

    #[must_use]
    pub fn sort_option(&self) -> SortOption {
        SortOption::from_param(self.sort.as_deref())
    }
}

/// One value of a product option, as a link that selects it.
#[derive(Debug, Clone)]
pub struct OptionValueView {
    pub value: String,
    pub url: String,
    pub selected: bool,
    /// Some variant with this value is in stock.
    pub available: bool,
}

/// A product option with its selectable values.
#[derive(Debug, Clone)]
pub struct OptionView {
    pub name: String,
    pub values: Vec<OptionValueView>,
}

/// Subscription choice on the product form.
#[derive(Debug, Clone)]
pub struct SellingPlanView {
    pub id: String,
    pub label: String,
}

/// Product detail display data.
#[derive(Debug, Clone)]
pub struct ProductDetailView {
    pub handle: String,
    pub title: String,
    pub vendor: String,
    pub description_html: String,
    pub seo_title: String,
    pub seo_description: String,
    pub images: Vec<ImageView>,
    pub options: Vec<OptionView>,
    pub selling_plans: Vec<SellingPlanView>,
    pub review: ReviewView,
    pub variant_id: Option<String>,
    pub variant_title: Option<String>,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub available: bool,
}

impl ProductDetailView {
    fn build(product: &Product, selection: &[SelectedOption]) -> Self {
        let variant = product.select_variant(selection);
        let current = variant.map_or_else(Vec::new, |v| v.selected_options.clone());

        let options = if product.has_only_default_variant() {
            Vec::new()
        } else {
            product
                .options
                .iter()
                .map(|option| option_view(product, option.name.as_str(), &option.values, &current))
                .collect()
        };

        let mut images: Vec<ImageView> = product
            .images
            .iter()
            .map(|image| ImageView::sized(image, 1200, &product.title))
            .collect();
        // Selected variant's image goes first
        if let Some(variant_image) = variant.and_then(|v| v.image.as_ref()) {
            let view = ImageView::sized(variant_image, 1200, &product.title);
            images.retain(|image| image.url != view.url);
            images.insert(0, view);
        } else if images.is_empty()
            && let Some(featured) = &product.featured_image
        {
            images.push(ImageView::sized(featured, 1200, &product.title));
        }

        let selling_plans = product
            .selling_plan_groups
            .iter()
            .flat_map(|group| {
                group.selling_plans.iter().map(|plan| SellingPlanView {
                    id: plan.id.clone(),
                    label: format!("{}: {}", group.name, plan.name),
                })
            })
            .collect();

        Self {
            handle: product.handle.clone(),
            title: product.title.clone(),
            vendor: product.vendor.clone(),
            description_html: product.description_html.clone(),
            seo_title: product
                .seo
                .title
                .clone()
                .unwrap_or_else(|| product.title.clone()),
            seo_description: product
                .seo
                .description
                .clone()
                .unwrap_or_else(|| product.description.chars().take(160).collect()),
            images,
            options,
            selling_plans,
            review: ReviewSummary::for_id(&product.id).into(),
            variant_id: variant.map(|v| v.id.clone()),
            variant_title: variant
                .filter(|_| !product.has_only_default_variant())
                .map(|v| v.title.clone()),
            price: variant.map_or_else(
                || product.price_range.min_variant_price.to_string(),
                |v| v.price.to_string(),
            ),
            compare_at_price: variant
                .filter(|v| v.is_on_sale())
                .and_then(|v| v.compare_at_price)
                .map(|m| m.to_string()),
            available: variant.is_some_and(|v| v.available_for_sale),
        }
    }
}

fn option_view(
    product: &Product,
    name: &str,
    values: &[String],
    current: &[SelectedOption],
) -> OptionView {
    let values = values
        .iter()
        .map(|value| {
            // Keep the other options, swap this one
            let mut wanted: Vec<SelectedOption> = current
                .iter()
                .filter(|o| o.name != name)
                .cloned()
                .collect();
            wanted.push(SelectedOption {
                name: name.to_string(),
                value: value.clone(),
            });
            let pairs: Vec<(&str, &str)> = wanted
                .iter()
                .map(|o| (o.name.as_str(), o.value.as_str()))
                .collect();

            OptionValueView {
                value: value.clone(),
                url: with_query(&format!("/products/{}", product.handle), &pairs),
                selected: current.iter().any(|o| o.name == name && &o.value == value),
                available: product
                    .variants
                    .iter()
                    .any(|v| v.available_for_sale && has_option(v, name, value)),
            }
        })
        .collect();

    OptionView {
        name: name.to_string(),
        values,
    }
}

fn has_option(variant: &ProductVariant, name: &str, value: &str) -> bool {
    variant
        .selected_options
        .iter()
        .any(|o| o.name == name && o.value == value)
}

/// Option selection from query parameters, keeping only the product's own
/// option names.
fn selection_from_query(product: &Product, params: &[(String, String)]) -> Vec<SelectedOption> {
    params
        .iter()
        .filter(|(name, _)| product.options.iter().any(|o| &o.name == name))
        .map(|(name, value)| SelectedOption {
            name: name.clone(),
            value: value.clone(),
        })
        .collect()
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCard>,
    pub sort_options: Vec<SortChoice>,
    pub pagination: Pagination,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductDetailView,
    pub recommendations: Vec<ProductCard>,
}

/// Display product listing page.
#[instrument(skip(state, layout))]
pub async fn index(
    State(state): State<AppState>,
    layout: Layout,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse> {
    let sort = query.sort_option();
    let cursor = query.cursor();
    let on_first_page = cursor.is_none();

    let connection = state
        .storefront()
        .get_products(PAGE_SIZE, cursor, sort)
        .await?;

    let sort_param = if sort == SortOption::default() {
        ""
    } else {
        sort.param()
    };

    Ok(ProductsIndexTemplate {
        layout,
        products: cards(&connection.products),
        sort_options: sort_choices(sort),
        pagination: Pagination::new(
            "/products",
            &connection.page_info,
            on_first_page,
            &[("sort", sort_param)],
        ),
    })
}

/// Display product detail page.
///
/// Options are selected with `?Color=Blue&Size=M`; without a full match the
/// first available variant is shown.
#[instrument(skip(state, layout, params))]
pub async fn show(
    State(state): State<AppState>,
    layout: Layout,
    Path(handle): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse> {
    let product = state.storefront().get_product_by_handle(&handle).await?;
    let selection = selection_from_query(&product, &params);

    let recommendations = match state
        .storefront()
        .get_product_recommendations(&product.id, Some(ProductRecommendationIntent::Related))
        .await
    {
        Ok(products) => products,
        Err(e) => {
            warn!(error = %e, "Failed to load recommendations");
            Vec::new()
        }
    };

    Ok(ProductShowTemplate {
        layout,
        product: ProductDetailView::build(&product, &selection),
        recommendations: cards(&recommendations).into_iter().take(4).collect(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shopify::types::{PriceRange, ProductOption, Seo};
    use tidepool_core::Money;

    fn variant(id: &str, color: &str, size: &str, available: bool) -> ProductVariant {
        ProductVariant {
            id: id.to_string(),
            title: format!("{color} / {size}"),
            available_for_sale: available,
            sku: None,
            price: Money::parse("30.00", "USD").unwrap(),
            compare_at_price: None,
            selected_options: vec![
                SelectedOption {
                    name: "Color".to_string(),
                    value: color.to_string(),
                },
                SelectedOption {
                    name: "Size".to_string(),
                    value: size.to_string(),
                },
            ],
            image: None,
        }
    }

    fn product() -> Product {
        let price = Money::parse("30.00", "USD").unwrap();
        Product {
            id: "gid://shopify/Product/1".to_string(),
            handle: "sunset-tee".to_string(),
            title: "Sunset Tee".to_string(),
            vendor: "Tidepool".to_string(),
            available_for_sale: true,
            tags: Vec::new(),
            description: "Soft cotton tee".to_string(),
            description_html: "<p>Soft cotton tee</p>".to_string(),
            product_type: "Shirts".to_string(),
            seo: Seo::default(),
            price_range: PriceRange {
                min_variant_price: price,
                max_variant_price: price,
            },
            compare_at_price: None,
            featured_image: None,
            images: Vec::new(),
            options: vec![
                ProductOption {
                    name: "Color".to_string(),
                    values: vec!["Coral".to_string(), "Sea".to_string()],
                },
                ProductOption {
                    name: "Size".to_string(),
                    values: vec!["S".to_string(), "M".to_string()],
                },
            ],
            variants: vec![
                variant("v1", "Coral", "S", false),
                variant("v2", "Coral", "M", true),
                variant("v3", "Sea", "S", true),
                variant("v4", "Sea", "M", true),
            ],
            selling_plan_groups: Vec::new(),
        }
    }

    #[test]
    fn test_selection_ignores_unknown_params() {
        let params = vec![
            ("Color".to_string(), "Sea".to_string()),
            ("utm_source".to_string(), "mail".to_string()),
        ];
        let selection = selection_from_query(&product(), &params);
        assert_eq!(selection.len(), 1);
        assert_eq!(selection[0].name, "Color");
    }

    #[test]
    fn test_detail_selects_matching_variant() {
        let p = product();
        let selection = vec![
            SelectedOption {
                name: "Color".to_string(),
                value: "Sea".to_string(),
            },
            SelectedOption {
                name: "Size".to_string(),
                value: "M".to_string(),
            },
        ];
        let view = ProductDetailView::build(&p, &selection);
        assert_eq!(view.variant_id.as_deref(), Some("v4"));
        assert_eq!(view.variant_title.as_deref(), Some("Sea / M"));
        assert!(view.available);
        assert_eq!(view.price, "$30.00");
    }

    #[test]
    fn test_detail_falls_back_to_first_available() {
        let view = ProductDetailView::build(&product(), &[]);
        assert_eq!(view.variant_id.as_deref(), Some("v2"));
    }

    #[test]
    fn test_option_links_swap_one_option() {
        let view = ProductDetailView::build(&product(), &[]);
        let color = &view.options[0];
        assert_eq!(color.name, "Color");
        let sea = color.values.iter().find(|v| v.value == "Sea").unwrap();
        assert_eq!(sea.url, "/products/sunset-tee?Size=M&Color=Sea");
        assert!(!sea.selected);
        let coral = color.values.iter().find(|v| v.value == "Coral").unwrap();
        assert!(coral.selected);
    }

    #[test]
    fn test_seo_falls_back_to_title_and_description() {
        let view = ProductDetailView::build(&product(), &[]);
        assert_eq!(view.seo_title, "Sunset Tee");
        assert_eq!(view.seo_description, "Soft cotton tee");
    }
}
