//! Cache types for Storefront API responses.

use crate::shopify::types::{
    Collection, CollectionConnection, Page, Product, ProductConnection, ShopPolicy,
};

/// Cached value types.
///
/// Keys are plain strings of the form `kind:handle[:cursor:sort]`; carts are
/// never cached.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(ProductConnection),
    Collection(Box<Collection>),
    Collections(CollectionConnection),
    Page(Box<Page>),
    Policy(Box<ShopPolicy>),
}
