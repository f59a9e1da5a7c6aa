//! CMS page and shop policy route handlers.
//!
//! Page and policy bodies are HTML authored in the Shopify admin and rendered
//! unescaped.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::Layout;
use crate::shopify::types::PolicyKind;
use crate::state::AppState;

/// Content page template, shared by pages and policies.
#[derive(Template, WebTemplate)]
#[template(path = "pages/content.html")]
pub struct ContentPageTemplate {
    pub layout: Layout,
    pub title: String,
    pub description: String,
    pub body_html: String,
}

/// Display a CMS page.
///
/// # Errors
///
/// Returns 404 if the page doesn't exist.
#[instrument(skip(state, layout))]
pub async fn page(
    State(state): State<AppState>,
    layout: Layout,
    Path(handle): Path<String>,
) -> Result<impl IntoResponse> {
    let page = state.storefront().get_page_by_handle(&handle).await?;

    Ok(ContentPageTemplate {
        layout,
        description: page
            .seo
            .description
            .unwrap_or_else(|| page.body_summary.clone()),
        title: page.seo.title.unwrap_or(page.title),
        body_html: page.body,
    })
}

/// Display a shop policy.
///
/// # Errors
///
/// Returns 404 for unknown policy handles or policies the shop hasn't set.
#[instrument(skip(state, layout))]
pub async fn policy(
    State(state): State<AppState>,
    layout: Layout,
    Path(handle): Path<String>,
) -> Result<impl IntoResponse> {
    let kind = PolicyKind::from_handle(&handle)
        .ok_or_else(|| AppError::NotFound(format!("Policy: {handle}")))?;
    let policy = state.storefront().get_shop_policy(kind).await?;

    Ok(ContentPageTemplate {
        layout,
        description: policy.title.clone(),
        title: policy.title,
        body_html: policy.body,
    })
}
