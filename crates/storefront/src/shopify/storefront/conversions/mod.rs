//! Conversions from Storefront API wire types to domain types.

mod cart;
mod collections;
mod content;
mod products;

pub use cart::{convert_cart, format_user_errors};
pub use collections::{convert_collection, convert_collection_connection};
pub use content::{convert_page, convert_policy};
pub use products::{
    convert_predictive_search, convert_product, convert_product_connection, convert_search,
};

use crate::shopify::types::{Image, Money, PageInfo, Seo, SelectedOption};

use super::queries::fragments::{ImageNode, MoneyV2, PageInfoNode, SelectedOptionNode, SeoNode};

fn convert_money(money: MoneyV2) -> Money {
    Money::from(money)
}

fn convert_image(image: ImageNode) -> Image {
    Image {
        url: image.url,
        alt_text: image.alt_text,
        width: image.width,
        height: image.height,
    }
}

fn convert_page_info(info: PageInfoNode) -> PageInfo {
    PageInfo {
        has_next_page: info.has_next_page,
        has_previous_page: info.has_previous_page,
        start_cursor: info.start_cursor,
        end_cursor: info.end_cursor,
    }
}

fn convert_seo(seo: Option<SeoNode>) -> Seo {
    seo.map_or_else(Seo::default, |seo| Seo {
        title: seo.title.filter(|t| !t.is_empty()),
        description: seo.description.filter(|d| !d.is_empty()),
    })
}

fn convert_selected_options(options: Vec<SelectedOptionNode>) -> Vec<SelectedOption> {
    options
        .into_iter()
        .map(|o| SelectedOption {
            name: o.name,
            value: o.value,
        })
        .collect()
}
