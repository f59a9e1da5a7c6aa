//! Search route handlers.
//!
//! Search runs on Shopify; the storefront only renders results.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{instrument, warn};

use super::products::PAGE_SIZE;
use super::views::{Pagination, ProductCard, SortChoice, cards, sort_choices};
use crate::error::Result;
use crate::filters;
use crate::middleware::Layout;
use crate::shopify::types::{PredictiveSearch, SortOption};
use crate::state::AppState;

/// Longest query forwarded to Shopify.
const MAX_QUERY_CHARS: usize = 200;

/// Suggestions per type in predictive search.
const PREDICTIVE_LIMIT: i64 = 6;

/// Full search page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub after: Option<String>,
    pub sort: Option<String>,
}

/// Predictive search query parameters.
#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub q: String,
}

/// Trimmed and length-capped search term.
fn normalize_query(q: &str) -> String {
    q.trim().chars().take(MAX_QUERY_CHARS).collect()
}

/// Search results page template.
#[derive(Template, WebTemplate)]
#[template(path = "search/index.html")]
pub struct SearchTemplate {
    pub layout: Layout,
    pub query: String,
    pub total_count: i64,
    pub products: Vec<ProductCard>,
    pub sort_options: Vec<SortChoice>,
    pub pagination: Pagination,
}

/// Display search results.
#[instrument(skip(state, layout))]
pub async fn search(
    State(state): State<AppState>,
    layout: Layout,
    Query(params): Query<SearchQuery>,
) -> Result<impl IntoResponse> {
    let query = normalize_query(&params.q);
    let sort = SortOption::from_param(params.sort.as_deref());

    if query.is_empty() {
        return Ok(SearchTemplate {
            layout,
            query,
            total_count: 0,
            products: Vec::new(),
            sort_options: sort_choices(sort),
            pagination: Pagination::default(),
        });
    }

    let cursor = params.after.filter(|c| !c.is_empty());
    let on_first_page = cursor.is_none();
    let results = state
        .storefront()
        .search_products(&query, PAGE_SIZE, cursor, sort)
        .await?;

    let sort_param = if sort == SortOption::default() {
        ""
    } else {
        sort.param()
    };
    let pagination = Pagination::new(
        "/search",
        &results.products.page_info,
        on_first_page,
        &[("q", &query), ("sort", sort_param)],
    );

    Ok(SearchTemplate {
        layout,
        total_count: results.total_count,
        products: cards(&results.products.products),
        sort_options: sort_choices(sort),
        pagination,
        query,
    })
}

/// Predictive search suggestions as JSON.
///
/// Failures return empty suggestions; the search box keeps working.
#[instrument(skip(state))]
pub async fn predictive(
    State(state): State<AppState>,
    Query(params): Query<SuggestQuery>,
) -> Json<PredictiveSearch> {
    let query = normalize_query(&params.q);
    if query.is_empty() {
        return Json(PredictiveSearch::default());
    }

    match state
        .storefront()
        .predictive_search(&query, PREDICTIVE_LIMIT)
        .await
    {
        Ok(results) => Json(results),
        Err(e) => {
            warn!(error = %e, "Predictive search failed");
            Json(PredictiveSearch::default())
        }
    }
}
