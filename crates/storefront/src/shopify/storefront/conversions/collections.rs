//! Collection conversions.

use crate::shopify::types::{Collection, CollectionConnection, PageInfo, Seo};

use super::super::queries::fragments::{CollectionSummaryNode, Connection};
use super::super::queries::get_collection_by_handle::CollectionNode;
use super::products::convert_product;
use super::{convert_image, convert_page_info, convert_seo};

pub fn convert_collection(collection: CollectionNode) -> Collection {
    Collection {
        id: collection.id,
        handle: collection.handle,
        title: collection.title,
        description: collection.description,
        description_html: collection.description_html,
        seo: convert_seo(collection.seo),
        image: collection.image.map(convert_image),
        products: collection
            .products
            .nodes
            .into_iter()
            .map(convert_product)
            .collect(),
        page_info: convert_page_info(collection.products.page_info),
    }
}

fn convert_collection_summary(collection: CollectionSummaryNode) -> Collection {
    Collection {
        id: collection.id,
        handle: collection.handle,
        title: collection.title,
        description: collection.description,
        description_html: String::new(),
        seo: Seo::default(),
        image: collection.image.map(convert_image),
        products: Vec::new(),
        page_info: PageInfo::default(),
    }
}

pub fn convert_collection_connection(
    connection: Connection<CollectionSummaryNode>,
) -> CollectionConnection {
    CollectionConnection {
        collections: connection
            .nodes
            .into_iter()
            .map(convert_collection_summary)
            .collect(),
        page_info: convert_page_info(connection.page_info),
    }
}
