//! View models shared by several pages.
//!
//! Templates get plain strings so they never format money or build URLs
//! themselves.

use tidepool_core::ReviewSummary;

use crate::shopify::types::{Image, PageInfo, Product, SortOption};

/// Image display data for templates.
#[derive(Debug, Clone)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
}

impl ImageView {
    /// Image resized on the Shopify CDN.
    #[must_use]
    pub fn sized(image: &Image, width: u32, fallback_alt: &str) -> Self {
        Self {
            url: sized_image_url(&image.url, width),
            alt: image
                .alt_text
                .clone()
                .filter(|alt| !alt.is_empty())
                .unwrap_or_else(|| fallback_alt.to_string()),
        }
    }
}

/// Append a `width` parameter to Shopify CDN URLs. Other hosts are left as is.
#[must_use]
pub fn sized_image_url(url: &str, width: u32) -> String {
    if !url.starts_with("https://cdn.shopify.com/") {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}width={width}")
}

/// The path if it stays on this site, rejecting `//host`, `/\\host` and
/// anything that cannot go into a `Location` header.
#[must_use]
pub fn local_path(target: &str) -> Option<&str> {
    let path = target.trim();
    (path.starts_with('/')
        && !path.starts_with("//")
        && !path.contains('\\')
        && !path.chars().any(char::is_control))
    .then_some(path)
}

/// Star rating display.
#[derive(Debug, Clone)]
pub struct ReviewView {
    pub rating: String,
    pub count: u32,
    pub full_stars: u32,
    pub half_star: bool,
    pub empty_stars: u32,
}

impl From<ReviewSummary> for ReviewView {
    fn from(summary: ReviewSummary) -> Self {
        let (full, half, empty) = summary.stars();
        Self {
            rating: summary.rating(),
            count: summary.count,
            full_stars: full,
            half_star: half == 1,
            empty_stars: empty,
        }
    }
}

/// Product card on listing pages.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub handle: String,
    pub title: String,
    pub vendor: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub image: Option<ImageView>,
    pub available: bool,
    pub review: ReviewView,
    /// Set when the product can be added without choosing options.
    pub quick_add_variant_id: Option<String>,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        let min = product.price_range.min_variant_price;
        let price = if product.price_range.is_single_price() {
            min.to_string()
        } else {
            format!("From {min}")
        };
        let quick_add_variant_id = product
            .has_only_default_variant()
            .then(|| product.variants.first())
            .flatten()
            .filter(|variant| variant.available_for_sale)
            .map(|variant| variant.id.clone());

        Self {
            handle: product.handle.clone(),
            title: product.title.clone(),
            vendor: product.vendor.clone(),
            price,
            compare_at_price: product
                .compare_at_price
                .filter(|compare| compare.amount > min.amount)
                .map(|compare| compare.to_string()),
            image: product
                .featured_image
                .as_ref()
                .map(|image| ImageView::sized(image, 600, &product.title)),
            available: product.available_for_sale,
            review: ReviewSummary::for_id(&product.id).into(),
            quick_add_variant_id,
        }
    }
}

/// Convert a list of products to cards.
#[must_use]
pub fn cards(products: &[Product]) -> Vec<ProductCard> {
    products.iter().map(ProductCard::from).collect()
}

/// Sort dropdown entry.
#[derive(Debug, Clone)]
pub struct SortChoice {
    pub param: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Sort dropdown for `current`.
#[must_use]
pub fn sort_choices(current: SortOption) -> Vec<SortChoice> {
    SortOption::ALL
        .into_iter()
        .map(|option| SortChoice {
            param: option.param(),
            label: option.label(),
            selected: option == current,
        })
        .collect()
}

/// Forward-only cursor pagination links.
#[derive(Debug, Clone, Default)]
pub struct Pagination {
    pub next_url: Option<String>,
    /// Link back to the first page, shown once past it.
    pub first_url: Option<String>,
}

impl Pagination {
    /// Links for a listing at `path`. `extra` query pairs (search term, sort)
    /// are carried onto every link.
    #[must_use]
    pub fn new(path: &str, page_info: &PageInfo, on_first_page: bool, extra: &[(&str, &str)]) -> Self {
        let next_url = page_info
            .has_next_page
            .then_some(page_info.end_cursor.as_deref())
            .flatten()
            .map(|cursor| {
                let mut pairs = extra.to_vec();
                pairs.push(("after", cursor));
                with_query(path, &pairs)
            });
        let first_url = (!on_first_page).then(|| with_query(path, extra));
        Self {
            next_url,
            first_url,
        }
    }
}

/// `path?k=v&...` with values URL-encoded. Empty values are dropped.
#[must_use]
pub fn with_query(path: &str, pairs: &[(&str, &str)]) -> String {
    let query = pairs
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sized_image_url() {
        assert_eq!(
            sized_image_url("https://cdn.shopify.com/s/files/tee.jpg", 600),
            "https://cdn.shopify.com/s/files/tee.jpg?width=600"
        );
        assert_eq!(
            sized_image_url("https://cdn.shopify.com/s/files/tee.jpg?v=2", 300),
            "https://cdn.shopify.com/s/files/tee.jpg?v=2&width=300"
        );
        assert_eq!(
            sized_image_url("/static/placeholder.png", 300),
            "/static/placeholder.png"
        );
    }

    #[test]
    fn test_with_query_encodes_and_skips_empty() {
        assert_eq!(
            with_query("/search", &[("q", "linen shirt"), ("sort", "")]),
            "/search?q=linen%20shirt"
        );
        assert_eq!(with_query("/products", &[]), "/products");
    }

    #[test]
    fn test_pagination_links() {
        let page_info = PageInfo {
            has_next_page: true,
            has_previous_page: false,
            start_cursor: None,
            end_cursor: Some("abc==".to_string()),
        };
        let pagination = Pagination::new("/products", &page_info, true, &[("sort", "newest")]);
        assert_eq!(
            pagination.next_url.as_deref(),
            Some("/products?sort=newest&after=abc%3D%3D")
        );
        assert!(pagination.first_url.is_none());

        let last = PageInfo {
            has_next_page: false,
            ..page_info
        };
        let pagination = Pagination::new("/products", &last, false, &[]);
        assert!(pagination.next_url.is_none());
        assert_eq!(pagination.first_url.as_deref(), Some("/products"));
    }

    #[test]
    fn test_review_view_from_summary() {
        let view = ReviewView::from(ReviewSummary {
            rating_tenths: 46,
            count: 120,
        });
        assert_eq!(view.rating, "4.6");
        assert_eq!(view.full_stars, 4);
        assert!(view.half_star);
        assert_eq!(view.empty_stars, 0);
    }
}
