//! Page and policy conversions.

use crate::shopify::types::{Page, ShopPolicy};

use super::super::queries::get_page::PageNode;
use super::super::queries::get_shop_policies::PolicyNode;
use super::convert_seo;

pub fn convert_page(page: PageNode) -> Page {
    Page {
        id: page.id,
        handle: page.handle,
        title: page.title,
        body: page.body,
        body_summary: page.body_summary,
        seo: convert_seo(page.seo),
    }
}

pub fn convert_policy(policy: PolicyNode) -> ShopPolicy {
    ShopPolicy {
        handle: policy.handle,
        title: policy.title,
        body: policy.body,
        url: policy.url,
    }
}
