//! GraphQL operations for the Storefront API.
//!
//! Each operation lives in its own module with the same shape
//! `graphql_client` codegen produces (`OPERATION_NAME`, `QUERY`, `Variables`,
//! `ResponseData`) and a marker type implementing [`GraphQLQuery`]. The
//! selection sets are shared through the `*_fields!` macros so the wire
//! structs in [`fragments`] line up with every document that uses them.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

use crate::shopify::types::{
    CartBuyerIdentityInput, CartLineInput, CartLineUpdateInput, ProductCollectionSortKey,
    ProductRecommendationIntent, ProductSortKey, SearchSortKey,
};

// =============================================================================
// Selection Sets
// =============================================================================

macro_rules! money_fields {
    () => {
        "{ amount currencyCode }"
    };
}

macro_rules! image_fields {
    () => {
        "{ url altText width height }"
    };
}

macro_rules! page_info_fields {
    () => {
        "pageInfo { hasNextPage hasPreviousPage startCursor endCursor }"
    };
}

macro_rules! product_card_fields {
    () => {
        concat!(
            "id handle title vendor availableForSale tags ",
            "featuredImage ",
            image_fields!(),
            " priceRange { minVariantPrice ",
            money_fields!(),
            " maxVariantPrice ",
            money_fields!(),
            " } compareAtPriceRange { maxVariantPrice ",
            money_fields!(),
            " } variants(first: 1) { nodes { ",
            variant_fields!(),
            " } }"
        )
    };
}

macro_rules! variant_fields {
    () => {
        concat!(
            "id title availableForSale sku price ",
            money_fields!(),
            " compareAtPrice ",
            money_fields!(),
            " selectedOptions { name value } image ",
            image_fields!()
        )
    };
}

macro_rules! product_detail_fields {
    () => {
        concat!(
            "id handle title vendor availableForSale tags description descriptionHtml productType ",
            "seo { title description } featuredImage ",
            image_fields!(),
            " priceRange { minVariantPrice ",
            money_fields!(),
            " maxVariantPrice ",
            money_fields!(),
            " } compareAtPriceRange { maxVariantPrice ",
            money_fields!(),
            " } images(first: 10) { nodes ",
            image_fields!(),
            " } options { name optionValues { name } } variants(first: 100) { nodes { ",
            variant_fields!(),
            " } } sellingPlanGroups(first: 5) { nodes { name sellingPlans(first: 10) { nodes { id name } } } }"
        )
    };
}

macro_rules! cart_fields {
    () => {
        concat!(
            "id checkoutUrl note totalQuantity buyerIdentity { email countryCode } ",
            "cost { subtotalAmount ",
            money_fields!(),
            " totalAmount ",
            money_fields!(),
            " totalTaxAmount ",
            money_fields!(),
            " totalDutyAmount ",
            money_fields!(),
            " } discountCodes { code applicable } appliedGiftCards { id lastCharacters amountUsed ",
            money_fields!(),
            " } lines(first: 100) { nodes { id quantity attributes { key value } ",
            "cost { amountPerQuantity ",
            money_fields!(),
            " compareAtAmountPerQuantity ",
            money_fields!(),
            " subtotalAmount ",
            money_fields!(),
            " totalAmount ",
            money_fields!(),
            " } discountAllocations { discountedAmount ",
            money_fields!(),
            " } merchandise { ... on ProductVariant { id title availableForSale price ",
            money_fields!(),
            " selectedOptions { name value } image ",
            image_fields!(),
            " product { id handle title vendor featuredImage ",
            image_fields!(),
            " } } } } }"
        )
    };
}

macro_rules! cart_mutation_payload {
    () => {
        concat!(
            "{ cart { ",
            cart_fields!(),
            " } userErrors { code field message } }"
        )
    };
}

/// Implement [`GraphQLQuery`] for an operation module.
macro_rules! graphql_operation {
    ($name:ident, $module:ident) => {
        pub struct $name;

        impl GraphQLQuery for $name {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $module::QUERY,
                    operation_name: $module::OPERATION_NAME,
                }
            }
        }
    };
}

// =============================================================================
// Shared Wire Types
// =============================================================================

/// Wire types for the shared selection sets.
pub mod fragments {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer};
    use tidepool_core::{CurrencyCode, Money};

    /// Parsed and validated on deserialization.
    #[derive(Debug, Clone, Copy, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MoneyV2 {
        pub amount: Decimal,
        pub currency_code: CurrencyCode,
    }

    impl From<MoneyV2> for Money {
        fn from(money: MoneyV2) -> Self {
            Self::new(money.amount, money.currency_code)
        }
    }

    /// Deserialize a `MoneyV2` object straight into [`Money`].
    ///
    /// # Errors
    ///
    /// Fails on a malformed amount or currency code.
    pub fn money<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        MoneyV2::deserialize(deserializer).map(Money::from)
    }

    /// Nullable variant of [`money`].
    ///
    /// # Errors
    ///
    /// Fails on a malformed amount or currency code.
    pub fn optional_money<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Money>, D::Error> {
        Ok(Option::<MoneyV2>::deserialize(deserializer)?.map(Money::from))
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ImageNode {
        pub url: String,
        pub alt_text: Option<String>,
        pub width: Option<i64>,
        pub height: Option<i64>,
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PageInfoNode {
        pub has_next_page: bool,
        pub has_previous_page: bool,
        pub start_cursor: Option<String>,
        pub end_cursor: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Nodes<T> {
        pub nodes: Vec<T>,
    }

    impl<T> Default for Nodes<T> {
        fn default() -> Self {
            Self { nodes: Vec::new() }
        }
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Connection<T> {
        pub nodes: Vec<T>,
        pub page_info: PageInfoNode,
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct SeoNode {
        pub title: Option<String>,
        pub description: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PriceRangeNode {
        pub min_variant_price: MoneyV2,
        pub max_variant_price: MoneyV2,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CompareAtPriceRangeNode {
        pub max_variant_price: MoneyV2,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct SelectedOptionNode {
        pub name: String,
        pub value: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct VariantNode {
        pub id: String,
        pub title: String,
        pub available_for_sale: bool,
        pub sku: Option<String>,
        pub price: MoneyV2,
        pub compare_at_price: Option<MoneyV2>,
        pub selected_options: Vec<SelectedOptionNode>,
        pub image: Option<ImageNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct OptionValueNode {
        pub name: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductOptionNode {
        pub name: String,
        pub option_values: Vec<OptionValueNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct SellingPlanNode {
        pub id: String,
        pub name: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SellingPlanGroupNode {
        pub name: String,
        pub selling_plans: Nodes<SellingPlanNode>,
    }

    /// Product card and product detail share this type; detail-only fields
    /// default to empty for cards.
    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductNode {
        pub id: String,
        pub handle: String,
        pub title: String,
        pub vendor: String,
        pub available_for_sale: bool,
        #[serde(default)]
        pub tags: Vec<String>,
        #[serde(default)]
        pub description: String,
        #[serde(default)]
        pub description_html: String,
        #[serde(default)]
        pub product_type: String,
        #[serde(default)]
        pub seo: Option<SeoNode>,
        pub featured_image: Option<ImageNode>,
        pub price_range: PriceRangeNode,
        pub compare_at_price_range: Option<CompareAtPriceRangeNode>,
        #[serde(default)]
        pub images: Nodes<ImageNode>,
        #[serde(default)]
        pub options: Vec<ProductOptionNode>,
        #[serde(default)]
        pub variants: Nodes<VariantNode>,
        #[serde(default)]
        pub selling_plan_groups: Nodes<SellingPlanGroupNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CollectionSummaryNode {
        pub id: String,
        pub handle: String,
        pub title: String,
        #[serde(default)]
        pub description: String,
        pub image: Option<ImageNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct AttributeNode {
        pub key: String,
        pub value: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartLineCostNode {
        pub amount_per_quantity: MoneyV2,
        pub compare_at_amount_per_quantity: Option<MoneyV2>,
        pub subtotal_amount: MoneyV2,
        pub total_amount: MoneyV2,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DiscountAllocationNode {
        pub discounted_amount: MoneyV2,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartProductNode {
        pub id: String,
        pub handle: String,
        pub title: String,
        pub vendor: String,
        pub featured_image: Option<ImageNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MerchandiseNode {
        pub id: String,
        pub title: String,
        pub available_for_sale: bool,
        pub price: MoneyV2,
        pub selected_options: Vec<SelectedOptionNode>,
        pub image: Option<ImageNode>,
        pub product: CartProductNode,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartLineNode {
        pub id: String,
        pub quantity: i64,
        pub attributes: Vec<AttributeNode>,
        pub cost: CartLineCostNode,
        pub discount_allocations: Vec<DiscountAllocationNode>,
        pub merchandise: MerchandiseNode,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartCostNode {
        pub subtotal_amount: MoneyV2,
        pub total_amount: MoneyV2,
        pub total_tax_amount: Option<MoneyV2>,
        pub total_duty_amount: Option<MoneyV2>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct DiscountCodeNode {
        pub code: String,
        pub applicable: bool,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AppliedGiftCardNode {
        pub id: String,
        pub last_characters: String,
        pub amount_used: MoneyV2,
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BuyerIdentityNode {
        pub email: Option<String>,
        pub country_code: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartNode {
        pub id: String,
        pub checkout_url: String,
        pub note: Option<String>,
        pub total_quantity: i64,
        #[serde(default)]
        pub buyer_identity: Option<BuyerIdentityNode>,
        pub cost: CartCostNode,
        pub discount_codes: Vec<DiscountCodeNode>,
        #[serde(default)]
        pub applied_gift_cards: Vec<AppliedGiftCardNode>,
        pub lines: Nodes<CartLineNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct UserErrorNode {
        pub code: Option<String>,
        pub field: Option<Vec<String>>,
        pub message: String,
    }

    /// Payload shared by every cart mutation.
    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartMutationPayload {
        pub cart: Option<CartNode>,
        #[serde(default)]
        pub user_errors: Vec<UserErrorNode>,
    }
}

// =============================================================================
// Products
// =============================================================================

pub mod get_product_by_handle {
    use super::{Deserialize, Serialize, fragments::ProductNode};

    pub const OPERATION_NAME: &str = "GetProductByHandle";
    pub const QUERY: &str = concat!(
        "query GetProductByHandle($handle: String!) { product(handle: $handle) { ",
        product_detail_fields!(),
        " } }"
    );

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub handle: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub product: Option<ProductNode>,
    }
}
graphql_operation!(GetProductByHandle, get_product_by_handle);

pub mod get_products {
    use super::{
        Deserialize, ProductSortKey, Serialize,
        fragments::{Connection, ProductNode},
    };

    pub const OPERATION_NAME: &str = "GetProducts";
    pub const QUERY: &str = concat!(
        "query GetProducts($first: Int!, $after: String, $query: String, ",
        "$sortKey: ProductSortKeys, $reverse: Boolean) { ",
        "products(first: $first, after: $after, query: $query, sortKey: $sortKey, reverse: $reverse) { ",
        "nodes { ",
        product_card_fields!(),
        " } ",
        page_info_fields!(),
        " } }"
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub first: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub after: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub query: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub sort_key: Option<ProductSortKey>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub reverse: Option<bool>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub products: Connection<ProductNode>,
    }
}
graphql_operation!(GetProducts, get_products);

pub mod get_product_recommendations {
    use super::{Deserialize, ProductRecommendationIntent, Serialize, fragments::ProductNode};

    pub const OPERATION_NAME: &str = "GetProductRecommendations";
    pub const QUERY: &str = concat!(
        "query GetProductRecommendations($productId: ID!, $intent: ProductRecommendationIntent) { ",
        "productRecommendations(productId: $productId, intent: $intent) { ",
        product_card_fields!(),
        " } }"
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub product_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub intent: Option<ProductRecommendationIntent>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub product_recommendations: Option<Vec<ProductNode>>,
    }
}
graphql_operation!(GetProductRecommendations, get_product_recommendations);

// =============================================================================
// Collections
// =============================================================================

pub mod get_collection_by_handle {
    use super::{
        Deserialize, ProductCollectionSortKey, Serialize,
        fragments::{Connection, ImageNode, ProductNode, SeoNode},
    };

    pub const OPERATION_NAME: &str = "GetCollectionByHandle";
    pub const QUERY: &str = concat!(
        "query GetCollectionByHandle($handle: String!, $first: Int!, $after: String, ",
        "$sortKey: ProductCollectionSortKeys, $reverse: Boolean) { ",
        "collection(handle: $handle) { id handle title description descriptionHtml ",
        "seo { title description } image ",
        image_fields!(),
        " products(first: $first, after: $after, sortKey: $sortKey, reverse: $reverse) { nodes { ",
        product_card_fields!(),
        " } ",
        page_info_fields!(),
        " } } }"
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub handle: String,
        pub first: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub after: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub sort_key: Option<ProductCollectionSortKey>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub reverse: Option<bool>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CollectionNode {
        pub id: String,
        pub handle: String,
        pub title: String,
        pub description: String,
        pub description_html: String,
        pub seo: Option<SeoNode>,
        pub image: Option<ImageNode>,
        pub products: Connection<ProductNode>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub collection: Option<CollectionNode>,
    }
}
graphql_operation!(GetCollectionByHandle, get_collection_by_handle);

pub mod get_collections {
    use super::{
        Deserialize, Serialize,
        fragments::{CollectionSummaryNode, Connection},
    };

    pub const OPERATION_NAME: &str = "GetCollections";
    pub const QUERY: &str = concat!(
        "query GetCollections($first: Int!, $after: String) { ",
        "collections(first: $first, after: $after, sortKey: TITLE) { ",
        "nodes { id handle title description image ",
        image_fields!(),
        " } ",
        page_info_fields!(),
        " } }"
    );

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub first: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub after: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub collections: Connection<CollectionSummaryNode>,
    }
}
graphql_operation!(GetCollections, get_collections);

// =============================================================================
// Search
// =============================================================================

pub mod search_products {
    use super::{
        Deserialize, SearchSortKey, Serialize,
        fragments::{PageInfoNode, ProductNode},
    };

    pub const OPERATION_NAME: &str = "SearchProducts";
    pub const QUERY: &str = concat!(
        "query SearchProducts($query: String!, $first: Int!, $after: String, ",
        "$sortKey: SearchSortKeys, $reverse: Boolean) { ",
        "search(query: $query, first: $first, after: $after, types: [PRODUCT], ",
        "sortKey: $sortKey, reverse: $reverse, unavailableProducts: LAST) { totalCount ",
        "nodes { ... on Product { ",
        product_card_fields!(),
        " } } ",
        page_info_fields!(),
        " } }"
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub query: String,
        pub first: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub after: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub sort_key: Option<SearchSortKey>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub reverse: Option<bool>,
    }

    /// Only products are requested, so every node is a product.
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SearchConnection {
        pub total_count: i64,
        pub nodes: Vec<ProductNode>,
        pub page_info: PageInfoNode,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub search: SearchConnection,
    }
}
graphql_operation!(SearchProducts, search_products);

pub mod predictive_search {
    use super::{
        Deserialize, Serialize,
        fragments::{ImageNode, MoneyV2},
    };

    pub const OPERATION_NAME: &str = "PredictiveSearch";
    pub const QUERY: &str = concat!(
        "query PredictiveSearch($query: String!, $limit: Int!) { ",
        "predictiveSearch(query: $query, limit: $limit, types: [PRODUCT, COLLECTION, QUERY]) { ",
        "products { handle title featuredImage ",
        image_fields!(),
        " priceRange { minVariantPrice ",
        money_fields!(),
        " } } collections { handle title } queries { text } } }"
    );

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub query: String,
        pub limit: i64,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MinPriceNode {
        pub min_variant_price: MoneyV2,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductSuggestion {
        pub handle: String,
        pub title: String,
        pub featured_image: Option<ImageNode>,
        pub price_range: Option<MinPriceNode>,
    }

    #[derive(Debug, Deserialize)]
    pub struct CollectionSuggestion {
        pub handle: String,
        pub title: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct QuerySuggestion {
        pub text: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct PredictiveSearchResult {
        #[serde(default)]
        pub products: Vec<ProductSuggestion>,
        #[serde(default)]
        pub collections: Vec<CollectionSuggestion>,
        #[serde(default)]
        pub queries: Vec<QuerySuggestion>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub predictive_search: Option<PredictiveSearchResult>,
    }
}
graphql_operation!(PredictiveSearch, predictive_search);

// =============================================================================
// Content
// =============================================================================

pub mod get_page {
    use super::{Deserialize, Serialize, fragments::SeoNode};

    pub const OPERATION_NAME: &str = "GetPage";
    pub const QUERY: &str = "query GetPage($handle: String!) { page(handle: $handle) { \
        id handle title body bodySummary seo { title description } } }";

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub handle: String,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PageNode {
        pub id: String,
        pub handle: String,
        pub title: String,
        pub body: String,
        pub body_summary: String,
        pub seo: Option<SeoNode>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub page: Option<PageNode>,
    }
}
graphql_operation!(GetPage, get_page);

pub mod get_shop_policies {
    use super::{Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "GetShopPolicies";
    pub const QUERY: &str = "query GetShopPolicies { shop { \
        privacyPolicy { handle title body url } \
        refundPolicy { handle title body url } \
        shippingPolicy { handle title body url } \
        termsOfService { handle title body url } } }";

    #[derive(Debug, Serialize)]
    pub struct Variables {}

    #[derive(Debug, Clone, Deserialize)]
    pub struct PolicyNode {
        pub handle: String,
        pub title: String,
        pub body: String,
        pub url: String,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ShopNode {
        pub privacy_policy: Option<PolicyNode>,
        pub refund_policy: Option<PolicyNode>,
        pub shipping_policy: Option<PolicyNode>,
        pub terms_of_service: Option<PolicyNode>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub shop: ShopNode,
    }
}
graphql_operation!(GetShopPolicies, get_shop_policies);

// =============================================================================
// Customers (newsletter)
// =============================================================================

pub mod create_customer {
    use super::{Deserialize, Serialize, fragments::UserErrorNode};

    pub const OPERATION_NAME: &str = "CreateCustomer";
    pub const QUERY: &str = "mutation CreateCustomer($input: CustomerCreateInput!) { \
        customerCreate(input: $input) { customer { id email } \
        customerUserErrors { code field message } } }";

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CustomerCreateInput {
        pub email: String,
        pub password: String,
        pub accepts_marketing: bool,
    }

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub input: CustomerCreateInput,
    }

    #[derive(Debug, Deserialize)]
    pub struct CustomerNode {
        pub id: String,
        pub email: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub customer: Option<CustomerNode>,
        #[serde(default)]
        pub customer_user_errors: Vec<UserErrorNode>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub customer_create: Option<Payload>,
    }
}
graphql_operation!(CreateCustomer, create_customer);

// =============================================================================
// Cart
// =============================================================================

pub mod get_cart {
    use super::{Deserialize, Serialize, fragments::CartNode};

    pub const OPERATION_NAME: &str = "GetCart";
    pub const QUERY: &str = concat!(
        "query GetCart($cartId: ID!) { cart(id: $cartId) { ",
        cart_fields!(),
        " } }"
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub cart: Option<CartNode>,
    }
}
graphql_operation!(GetCart, get_cart);

pub mod create_cart {
    use super::{
        CartBuyerIdentityInput, CartLineInput, Deserialize, Serialize,
        fragments::CartMutationPayload,
    };

    pub const OPERATION_NAME: &str = "CreateCart";
    pub const QUERY: &str = concat!(
        "mutation CreateCart($input: CartInput!) { cartCreate(input: $input) ",
        cart_mutation_payload!(),
        " }"
    );

    #[derive(Debug, Default, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartInput {
        pub lines: Vec<CartLineInput>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub note: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub buyer_identity: Option<CartBuyerIdentityInput>,
    }

    #[derive(Debug, Serialize)]
    pub struct Variables {
        pub input: CartInput,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<CartMutationPayload>,
    }
}
graphql_operation!(CreateCart, create_cart);

pub mod add_to_cart {
    use super::{CartLineInput, Deserialize, Serialize, fragments::CartMutationPayload};

    pub const OPERATION_NAME: &str = "AddToCart";
    pub const QUERY: &str = concat!(
        "mutation AddToCart($cartId: ID!, $lines: [CartLineInput!]!) { ",
        "cartLinesAdd(cartId: $cartId, lines: $lines) ",
        cart_mutation_payload!(),
        " }"
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_add: Option<CartMutationPayload>,
    }
}
graphql_operation!(AddToCart, add_to_cart);

pub mod update_cart_lines {
    use super::{CartLineUpdateInput, Deserialize, Serialize, fragments::CartMutationPayload};

    pub const OPERATION_NAME: &str = "UpdateCartLines";
    pub const QUERY: &str = concat!(
        "mutation UpdateCartLines($cartId: ID!, $lines: [CartLineUpdateInput!]!) { ",
        "cartLinesUpdate(cartId: $cartId, lines: $lines) ",
        cart_mutation_payload!(),
        " }"
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineUpdateInput>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_update: Option<CartMutationPayload>,
    }
}
graphql_operation!(UpdateCartLines, update_cart_lines);

pub mod remove_from_cart {
    use super::{Deserialize, Serialize, fragments::CartMutationPayload};

    pub const OPERATION_NAME: &str = "RemoveFromCart";
    pub const QUERY: &str = concat!(
        "mutation RemoveFromCart($cartId: ID!, $lineIds: [ID!]!) { ",
        "cartLinesRemove(cartId: $cartId, lineIds: $lineIds) ",
        cart_mutation_payload!(),
        " }"
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub line_ids: Vec<String>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_remove: Option<CartMutationPayload>,
    }
}
graphql_operation!(RemoveFromCart, remove_from_cart);

pub mod update_cart_discount_codes {
    use super::{Deserialize, Serialize, fragments::CartMutationPayload};

    pub const OPERATION_NAME: &str = "UpdateCartDiscountCodes";
    pub const QUERY: &str = concat!(
        "mutation UpdateCartDiscountCodes($cartId: ID!, $discountCodes: [String!]) { ",
        "cartDiscountCodesUpdate(cartId: $cartId, discountCodes: $discountCodes) ",
        cart_mutation_payload!(),
        " }"
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub discount_codes: Vec<String>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_discount_codes_update: Option<CartMutationPayload>,
    }
}
graphql_operation!(UpdateCartDiscountCodes, update_cart_discount_codes);

pub mod update_cart_gift_card_codes {
    use super::{Deserialize, Serialize, fragments::CartMutationPayload};

    pub const OPERATION_NAME: &str = "UpdateCartGiftCardCodes";
    pub const QUERY: &str = concat!(
        "mutation UpdateCartGiftCardCodes($cartId: ID!, $giftCardCodes: [String!]!) { ",
        "cartGiftCardCodesUpdate(cartId: $cartId, giftCardCodes: $giftCardCodes) ",
        cart_mutation_payload!(),
        " }"
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub gift_card_codes: Vec<String>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_gift_card_codes_update: Option<CartMutationPayload>,
    }
}
graphql_operation!(UpdateCartGiftCardCodes, update_cart_gift_card_codes);

pub mod update_cart_buyer_identity {
    use super::{CartBuyerIdentityInput, Deserialize, Serialize, fragments::CartMutationPayload};

    pub const OPERATION_NAME: &str = "UpdateCartBuyerIdentity";
    pub const QUERY: &str = concat!(
        "mutation UpdateCartBuyerIdentity($cartId: ID!, $buyerIdentity: CartBuyerIdentityInput!) { ",
        "cartBuyerIdentityUpdate(cartId: $cartId, buyerIdentity: $buyerIdentity) ",
        cart_mutation_payload!(),
        " }"
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub buyer_identity: CartBuyerIdentityInput,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_buyer_identity_update: Option<CartMutationPayload>,
    }
}
graphql_operation!(UpdateCartBuyerIdentity, update_cart_buyer_identity);

pub mod update_cart_note {
    use super::{Deserialize, Serialize, fragments::CartMutationPayload};

    pub const OPERATION_NAME: &str = "UpdateCartNote";
    pub const QUERY: &str = concat!(
        "mutation UpdateCartNote($cartId: ID!, $note: String!) { ",
        "cartNoteUpdate(cartId: $cartId, note: $note) ",
        cart_mutation_payload!(),
        " }"
    );

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub note: String,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_note_update: Option<CartMutationPayload>,
    }
}
graphql_operation!(UpdateCartNote, update_cart_note);
