//! Domain types for the Shopify Storefront API.
//!
//! These types provide a clean, ergonomic API separate from the raw wire
//! types in `storefront::queries`. Prices use [`tidepool_core::Money`], so
//! every amount leaving this module is already parsed and currency-checked.

use serde::{Deserialize, Serialize};
pub use tidepool_core::Money;
use tidepool_core::gift::{GIFT_ATTRIBUTE_KEY, GIFT_ATTRIBUTE_VALUE};
use tidepool_core::{GiftLine, GiftPolicy};

// =============================================================================
// Shared Types
// =============================================================================

/// Price range for a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRange {
    pub min_variant_price: Money,
    pub max_variant_price: Money,
}

impl PriceRange {
    /// True when all variants cost the same.
    #[must_use]
    pub fn is_single_price(&self) -> bool {
        self.min_variant_price == self.max_variant_price
    }
}

/// Product, variant or collection image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub alt_text: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

/// SEO metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seo {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Pagination information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

// =============================================================================
// Product Types
// =============================================================================

/// Selected option on a product variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    /// Option name (e.g., "Size", "Color").
    pub name: String,
    /// Selected value (e.g., "Large", "Blue").
    pub value: String,
}

/// Product option definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductOption {
    pub name: String,
    pub values: Vec<String>,
}

/// A subscription plan a variant can be bought on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellingPlan {
    /// Selling plan ID (pass to cart).
    pub id: String,
    /// Display name (e.g., "Delivery every 30 days").
    pub name: String,
}

/// A group of selling plans (e.g., "Subscribe & Save").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellingPlanGroup {
    pub name: String,
    pub selling_plans: Vec<SellingPlan>,
}

/// A product variant (specific combination of options).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: String,
    pub title: String,
    pub available_for_sale: bool,
    pub sku: Option<String>,
    pub price: Money,
    /// Compare-at price (original price if on sale).
    pub compare_at_price: Option<Money>,
    pub selected_options: Vec<SelectedOption>,
    pub image: Option<Image>,
}

impl ProductVariant {
    /// True when the variant has every `(name, value)` pair in `selection`.
    #[must_use]
    pub fn matches(&self, selection: &[SelectedOption]) -> bool {
        selection
            .iter()
            .all(|wanted| self.selected_options.contains(wanted))
    }

    /// True when the compare-at price is above the current price.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.compare_at_price
            .is_some_and(|compare| compare.amount > self.price.amount)
    }
}

/// A product in the store.
///
/// List queries only fill the card fields; `description_html`, `images`,
/// `options`, `selling_plan_groups` and all but the first variant are empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub vendor: String,
    pub available_for_sale: bool,
    pub tags: Vec<String>,
    pub description: String,
    pub description_html: String,
    pub product_type: String,
    pub seo: Seo,
    pub price_range: PriceRange,
    pub compare_at_price: Option<Money>,
    pub featured_image: Option<Image>,
    pub images: Vec<Image>,
    pub options: Vec<ProductOption>,
    pub variants: Vec<ProductVariant>,
    pub selling_plan_groups: Vec<SellingPlanGroup>,
}

impl Product {
    /// The variant matching `selection`, falling back to the first
    /// available variant, then the first variant.
    #[must_use]
    pub fn select_variant(&self, selection: &[SelectedOption]) -> Option<&ProductVariant> {
        let exact = (!selection.is_empty())
            .then(|| self.variants.iter().find(|v| v.matches(selection)))
            .flatten();
        exact
            .or_else(|| self.variants.iter().find(|v| v.available_for_sale))
            .or_else(|| self.variants.first())
    }

    /// True for the platform's single "Default Title" option.
    #[must_use]
    pub fn has_only_default_variant(&self) -> bool {
        self.variants.len() <= 1
            && self
                .options
                .iter()
                .all(|o| o.values.len() <= 1 && o.values.iter().all(|v| v == "Default Title"))
    }
}

/// A collection of products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub description: String,
    pub description_html: String,
    pub seo: Seo,
    pub image: Option<Image>,
    /// Products in this page of the collection.
    pub products: Vec<Product>,
    pub page_info: PageInfo,
}

/// Paginated list of products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConnection {
    pub products: Vec<Product>,
    pub page_info: PageInfo,
}

/// Paginated list of collections (without products).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConnection {
    pub collections: Vec<Collection>,
    pub page_info: PageInfo,
}

// =============================================================================
// Search & Content Types
// =============================================================================

/// Full search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub total_count: i64,
    pub products: ProductConnection,
}

/// A product suggestion in predictive search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictiveProduct {
    pub handle: String,
    pub title: String,
    pub price: Option<Money>,
    pub image_url: Option<String>,
}

/// A collection suggestion in predictive search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictiveCollection {
    pub handle: String,
    pub title: String,
}

/// Predictive (type-ahead) search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictiveSearch {
    pub products: Vec<PredictiveProduct>,
    pub collections: Vec<PredictiveCollection>,
    /// Suggested query strings.
    pub queries: Vec<String>,
}

/// An online store page managed in the platform admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub handle: String,
    pub title: String,
    /// Page body as HTML.
    pub body: String,
    pub body_summary: String,
    pub seo: Seo,
}

/// A legal policy (privacy, refund, shipping, terms).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopPolicy {
    pub handle: String,
    pub title: String,
    /// Policy body as HTML.
    pub body: String,
    pub url: String,
}

/// Policy handles the storefront serves under `/policies/{handle}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    Privacy,
    Refund,
    Shipping,
    TermsOfService,
}

impl PolicyKind {
    /// Look a policy up by its URL handle.
    #[must_use]
    pub fn from_handle(handle: &str) -> Option<Self> {
        match handle {
            "privacy-policy" => Some(Self::Privacy),
            "refund-policy" => Some(Self::Refund),
            "shipping-policy" => Some(Self::Shipping),
            "terms-of-service" => Some(Self::TermsOfService),
            _ => None,
        }
    }

    #[must_use]
    pub const fn handle(self) -> &'static str {
        match self {
            Self::Privacy => "privacy-policy",
            Self::Refund => "refund-policy",
            Self::Shipping => "shipping-policy",
            Self::TermsOfService => "terms-of-service",
        }
    }
}

// =============================================================================
// Cart Types
// =============================================================================

/// Custom attribute (key-value pair).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: Option<String>,
}

/// Input for custom attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeInput {
    pub key: String,
    pub value: String,
}

/// Merchandise in a cart line (simplified product variant info).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartMerchandise {
    /// Variant ID.
    pub id: String,
    /// Variant title.
    pub title: String,
    pub available_for_sale: bool,
    pub price: Money,
    pub selected_options: Vec<SelectedOption>,
    pub image: Option<Image>,
    pub product: CartMerchandiseProduct,
}

/// Simplified product info for cart merchandise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartMerchandiseProduct {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub vendor: String,
    pub featured_image: Option<Image>,
}

/// Cost for a cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineCost {
    /// Price per unit.
    pub amount_per_quantity: Money,
    /// Compare-at price per unit.
    pub compare_at_amount_per_quantity: Option<Money>,
    /// Subtotal (before discounts).
    pub subtotal_amount: Money,
    /// Total (after line-level discounts).
    pub total_amount: Money,
}

/// A line item in the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub id: String,
    pub quantity: i64,
    pub attributes: Vec<Attribute>,
    pub cost: CartLineCost,
    pub merchandise: CartMerchandise,
    /// Discount amounts applied to this line.
    pub discount_allocations: Vec<Money>,
}

impl CartLine {
    /// True for the automatically added gift-with-purchase line.
    #[must_use]
    pub fn is_gift(&self) -> bool {
        self.attributes.iter().any(|attr| {
            attr.key == GIFT_ATTRIBUTE_KEY && attr.value.as_deref() == Some(GIFT_ATTRIBUTE_VALUE)
        })
    }

    /// View of this line for the gift eligibility check.
    #[must_use]
    pub fn gift_line(&self) -> GiftLine {
        GiftLine {
            line_id: self.id.clone(),
            merchandise_id: self.merchandise.id.clone(),
            quantity: u32::try_from(self.quantity).unwrap_or(0),
            line_total: self.cost.subtotal_amount,
            is_gift: self.is_gift(),
        }
    }
}

/// Cart cost summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartCost {
    /// Subtotal before tax/shipping.
    pub subtotal: Money,
    pub total: Money,
    pub total_tax: Option<Money>,
    pub total_duty: Option<Money>,
}

/// Discount code applied to cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartDiscountCode {
    pub code: String,
    /// Whether the code currently applies to the cart contents.
    pub applicable: bool,
}

/// Gift card applied to the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedGiftCard {
    pub id: String,
    pub last_characters: String,
    pub amount_used: Money,
}

/// Buyer identity for the cart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartBuyerIdentity {
    pub email: Option<String>,
    pub country_code: Option<String>,
}

/// A shopping cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: String,
    /// Hosted checkout URL for the hand-off.
    pub checkout_url: String,
    pub note: Option<String>,
    pub total_quantity: i64,
    pub buyer_identity: CartBuyerIdentity,
    pub cost: CartCost,
    pub discount_codes: Vec<CartDiscountCode>,
    pub applied_gift_cards: Vec<AppliedGiftCard>,
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Lines for the gift eligibility check.
    #[must_use]
    pub fn gift_lines(&self) -> Vec<GiftLine> {
        self.lines.iter().map(CartLine::gift_line).collect()
    }

    /// Amount left to unlock the gift, or `None` once unlocked.
    #[must_use]
    pub fn gift_remaining(&self, policy: &GiftPolicy) -> Option<Money> {
        policy.remaining(&self.gift_lines()).ok().flatten()
    }
}

/// Input for adding a line to cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    /// Product variant ID.
    pub merchandise_id: String,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<AttributeInput>>,
    /// Selling plan ID (for subscriptions).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selling_plan_id: Option<String>,
}

/// Input for updating a cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineUpdateInput {
    /// Cart line ID.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
}

/// Input for updating the buyer identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartBuyerIdentityInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// ISO 3166-1 alpha-2 country code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

// =============================================================================
// Sort Keys
// =============================================================================

/// Sort keys for product queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductSortKey {
    Title,
    UpdatedAt,
    CreatedAt,
    BestSelling,
    Price,
    Relevance,
}

/// Sort keys for collection product queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCollectionSortKey {
    CollectionDefault,
    Title,
    Price,
    BestSelling,
    Created,
}

/// Sort keys for search queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchSortKey {
    Price,
    Relevance,
}

/// Intent for product recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductRecommendationIntent {
    Related,
    Complementary,
}

/// Sort order chosen from the listing page's `?sort=` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    #[default]
    Featured,
    BestSelling,
    Newest,
    PriceLowHigh,
    PriceHighLow,
    TitleAz,
}

impl SortOption {
    /// All options, in dropdown order.
    pub const ALL: [Self; 6] = [
        Self::Featured,
        Self::BestSelling,
        Self::Newest,
        Self::PriceLowHigh,
        Self::PriceHighLow,
        Self::TitleAz,
    ];

    /// Parse the query parameter, falling back to `Featured`.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        Self::ALL
            .into_iter()
            .find(|option| Some(option.param()) == value)
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn param(self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::BestSelling => "best-selling",
            Self::Newest => "newest",
            Self::PriceLowHigh => "price-low-high",
            Self::PriceHighLow => "price-high-low",
            Self::TitleAz => "title-az",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Featured => "Featured",
            Self::BestSelling => "Best selling",
            Self::Newest => "Newest",
            Self::PriceLowHigh => "Price: low to high",
            Self::PriceHighLow => "Price: high to low",
            Self::TitleAz => "Alphabetical",
        }
    }

    /// Sort key and `reverse` flag for the products query.
    #[must_use]
    pub const fn for_products(self) -> (ProductSortKey, bool) {
        match self {
            Self::Featured | Self::BestSelling => (ProductSortKey::BestSelling, false),
            Self::Newest => (ProductSortKey::CreatedAt, true),
            Self::PriceLowHigh => (ProductSortKey::Price, false),
            Self::PriceHighLow => (ProductSortKey::Price, true),
            Self::TitleAz => (ProductSortKey::Title, false),
        }
    }

    /// Sort key and `reverse` flag for a collection's products.
    #[must_use]
    pub const fn for_collection(self) -> (ProductCollectionSortKey, bool) {
        match self {
            Self::Featured => (ProductCollectionSortKey::CollectionDefault, false),
            Self::BestSelling => (ProductCollectionSortKey::BestSelling, false),
            Self::Newest => (ProductCollectionSortKey::Created, true),
            Self::PriceLowHigh => (ProductCollectionSortKey::Price, false),
            Self::PriceHighLow => (ProductCollectionSortKey::Price, true),
            Self::TitleAz => (ProductCollectionSortKey::Title, false),
        }
    }

    /// Sort key and `reverse` flag for search. Search only sorts by price.
    #[must_use]
    pub const fn for_search(self) -> (SearchSortKey, bool) {
        match self {
            Self::PriceLowHigh => (SearchSortKey::Price, false),
            Self::PriceHighLow => (SearchSortKey::Price, true),
            _ => (SearchSortKey::Relevance, false),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn money(amount: &str) -> Money {
        Money::parse(amount, "USD").unwrap()
    }

    fn variant(id: &str, size: &str, color: &str, available: bool) -> ProductVariant {
        ProductVariant {
            id: id.to_string(),
            title: format!("{size} / {color}"),
            available_for_sale: available,
            sku: None,
            price: money("20.00"),
            compare_at_price: None,
            selected_options: vec![
                SelectedOption {
                    name: "Size".to_string(),
                    value: size.to_string(),
                },
                SelectedOption {
                    name: "Color".to_string(),
                    value: color.to_string(),
                },
            ],
            image: None,
        }
    }

    fn product(variants: Vec<ProductVariant>) -> Product {
        Product {
            id: "gid://shopify/Product/1".to_string(),
            handle: "tee".to_string(),
            title: "Tee".to_string(),
            vendor: "Tidepool".to_string(),
            available_for_sale: true,
            tags: vec![],
            description: String::new(),
            description_html: String::new(),
            product_type: String::new(),
            seo: Seo::default(),
            price_range: PriceRange {
                min_variant_price: money("20.00"),
                max_variant_price: money("20.00"),
            },
            compare_at_price: None,
            featured_image: None,
            images: vec![],
            options: vec![],
            variants,
            selling_plan_groups: vec![],
        }
    }

    #[test]
    fn test_select_variant_exact_match() {
        let p = product(vec![
            variant("v1", "S", "Red", true),
            variant("v2", "M", "Blue", true),
        ]);
        let selection = vec![
            SelectedOption {
                name: "Size".to_string(),
                value: "M".to_string(),
            },
            SelectedOption {
                name: "Color".to_string(),
                value: "Blue".to_string(),
            },
        ];
        assert_eq!(p.select_variant(&selection).unwrap().id, "v2");
    }

    #[test]
    fn test_select_variant_falls_back_to_available() {
        let p = product(vec![
            variant("v1", "S", "Red", false),
            variant("v2", "M", "Blue", true),
        ]);
        assert_eq!(p.select_variant(&[]).unwrap().id, "v2");

        let unknown = vec![SelectedOption {
            name: "Size".to_string(),
            value: "XXL".to_string(),
        }];
        assert_eq!(p.select_variant(&unknown).unwrap().id, "v2");
    }

    #[test]
    fn test_select_variant_all_sold_out() {
        let p = product(vec![variant("v1", "S", "Red", false)]);
        assert_eq!(p.select_variant(&[]).unwrap().id, "v1");
        assert!(product(vec![]).select_variant(&[]).is_none());
    }

    #[test]
    fn test_variant_on_sale() {
        let mut v = variant("v1", "S", "Red", true);
        assert!(!v.is_on_sale());
        v.compare_at_price = Some(money("25.00"));
        assert!(v.is_on_sale());
    }

    #[test]
    fn test_sort_option_from_param() {
        assert_eq!(SortOption::from_param(None), SortOption::Featured);
        assert_eq!(
            SortOption::from_param(Some("price-high-low")),
            SortOption::PriceHighLow
        );
        assert_eq!(SortOption::from_param(Some("bogus")), SortOption::Featured);
        assert_eq!(
            SortOption::PriceHighLow.for_collection(),
            (ProductCollectionSortKey::Price, true)
        );
        assert_eq!(
            SortOption::Newest.for_search(),
            (SearchSortKey::Relevance, false)
        );
    }

    #[test]
    fn test_sort_key_serialization() {
        assert_eq!(
            serde_json::to_string(&ProductCollectionSortKey::CollectionDefault).unwrap(),
            "\"COLLECTION_DEFAULT\""
        );
        assert_eq!(
            serde_json::to_string(&ProductSortKey::BestSelling).unwrap(),
            "\"BEST_SELLING\""
        );
    }

    #[test]
    fn test_policy_handles() {
        for kind in [
            PolicyKind::Privacy,
            PolicyKind::Refund,
            PolicyKind::Shipping,
            PolicyKind::TermsOfService,
        ] {
            assert_eq!(PolicyKind::from_handle(kind.handle()), Some(kind));
        }
        assert_eq!(PolicyKind::from_handle("cookies"), None);
    }
}
