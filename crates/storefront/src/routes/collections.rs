//! Collection route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use super::products::{ListingQuery, PAGE_SIZE};
use super::views::{ImageView, Pagination, ProductCard, SortChoice, cards, sort_choices};
use crate::error::Result;
use crate::filters;
use crate::middleware::Layout;
use crate::shopify::types::{Collection, SortOption};
use crate::state::AppState;

/// Collection display data for templates.
#[derive(Debug, Clone)]
pub struct CollectionView {
    pub handle: String,
    pub title: String,
    pub description_html: String,
    pub image: Option<ImageView>,
}

impl From<&Collection> for CollectionView {
    fn from(collection: &Collection) -> Self {
        Self {
            handle: collection.handle.clone(),
            title: collection.title.clone(),
            description_html: collection.description_html.clone(),
            image: collection
                .image
                .as_ref()
                .map(|image| ImageView::sized(image, 800, &collection.title)),
        }
    }
}

/// Collection listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/index.html")]
pub struct CollectionsIndexTemplate {
    pub layout: Layout,
    pub collections: Vec<CollectionView>,
    pub pagination: Pagination,
}

/// Collection detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/show.html")]
pub struct CollectionShowTemplate {
    pub layout: Layout,
    pub collection: CollectionView,
    pub products: Vec<ProductCard>,
    pub sort_options: Vec<SortChoice>,
    pub pagination: Pagination,
}

/// Display collection listing page.
#[instrument(skip(state, layout))]
pub async fn index(
    State(state): State<AppState>,
    layout: Layout,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse> {
    let cursor = query.cursor();
    let on_first_page = cursor.is_none();
    let connection = state.storefront().get_collections(PAGE_SIZE, cursor).await?;

    Ok(CollectionsIndexTemplate {
        layout,
        collections: connection.collections.iter().map(CollectionView::from).collect(),
        pagination: Pagination::new("/collections", &connection.page_info, on_first_page, &[]),
    })
}

/// Display collection detail page.
///
/// # Errors
///
/// Returns 404 if the collection doesn't exist.
#[instrument(skip(state, layout))]
pub async fn show(
    State(state): State<AppState>,
    layout: Layout,
    Path(handle): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse> {
    let sort = query.sort_option();
    let cursor = query.cursor();
    let on_first_page = cursor.is_none();

    let collection = state
        .storefront()
        .get_collection_by_handle(&handle, PAGE_SIZE, cursor, sort)
        .await?;

    let sort_param = if sort == SortOption::default() {
        ""
    } else {
        sort.param()
    };

    Ok(CollectionShowTemplate {
        layout,
        pagination: Pagination::new(
            &format!("/collections/{}", collection.handle),
            &collection.page_info,
            on_first_page,
            &[("sort", sort_param)],
        ),
        products: cards(&collection.products),
        collection: CollectionView::from(&collection),
        sort_options: sort_choices(sort),
    })
}
