//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::{instrument, warn};

use super::views::{ProductCard, cards};
use crate::filters;
use crate::middleware::Layout;
use crate::shopify::types::SortOption;
use crate::state::AppState;

/// Products shown in each home page section.
const SECTION_SIZE: i64 = 8;

/// A single slide in the hero carousel.
#[derive(Debug, Clone)]
pub struct HeroSlide {
    pub title: String,
    pub subtitle: String,
    pub button_text: String,
    pub button_url: String,
    pub image_path: String,
    pub image_alt: String,
}

/// Hero carousel slides. Static content, not managed in Shopify.
#[must_use]
pub fn hero_slides(featured_collection: &str) -> Vec<HeroSlide> {
    vec![
        HeroSlide {
            title: "Made for the shoreline".to_string(),
            subtitle: "Everyday goods shaped by salt, sand and slow mornings.".to_string(),
            button_text: "Shop the collection".to_string(),
            button_url: format!("/collections/{featured_collection}"),
            image_path: "/static/images/hero/shoreline.svg".to_string(),
            image_alt: "Driftwood and ceramics on a sandy table".to_string(),
        },
        HeroSlide {
            title: "Design your own print".to_string(),
            subtitle: "Describe a scene and we will render it for you.".to_string(),
            button_text: "Start creating".to_string(),
            button_url: "/pages/studio".to_string(),
            image_path: "/static/images/hero/studio.svg".to_string(),
            image_alt: "Framed prints leaning against a wall".to_string(),
        },
    ]
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub hero: Vec<HeroSlide>,
    pub featured_title: String,
    pub featured_handle: String,
    pub featured: Vec<ProductCard>,
    pub best_sellers: Vec<ProductCard>,
}

/// Display the home page.
///
/// Both product sections are optional: a failed load leaves the section
/// empty.
#[instrument(skip(state, layout))]
pub async fn home(State(state): State<AppState>, layout: Layout) -> impl IntoResponse {
    let featured_handle = state.config().theme.featured_collection.clone();
    let storefront = state.storefront();

    let (featured, best_sellers) = tokio::join!(
        storefront.get_collection_by_handle(
            &featured_handle,
            SECTION_SIZE,
            None,
            SortOption::Featured,
        ),
        storefront.get_products(SECTION_SIZE, None, SortOption::BestSelling),
    );

    let (featured_title, featured) = match featured {
        Ok(collection) => (collection.title.clone(), cards(&collection.products)),
        Err(e) => {
            warn!(handle = %featured_handle, error = %e, "Failed to load featured collection");
            (String::new(), Vec::new())
        }
    };

    let best_sellers = match best_sellers {
        Ok(connection) => cards(&connection.products),
        Err(e) => {
            warn!(error = %e, "Failed to load best sellers");
            Vec::new()
        }
    };

    HomeTemplate {
        hero: hero_slides(&featured_handle),
        layout,
        featured_title,
        featured_handle,
        featured,
        best_sellers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hero_links_featured_collection() {
        let slides = hero_slides("summer");
        assert_eq!(slides[0].button_url, "/collections/summer");
        assert!(slides.iter().all(|s| s.image_path.starts_with("/static/")));
    }
}
