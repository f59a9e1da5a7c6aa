//! Newsletter subscription route handlers.
//!
//! Subscribers are Shopify customers with marketing consent. Existing
//! customers are treated as subscribed.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, response::IntoResponse};
use rand::{Rng, distr::Alphanumeric};
use serde::Deserialize;
use tidepool_core::Email;
use tracing::{info, instrument, warn};

use crate::shopify::ShopifyError;
use crate::state::AppState;

/// Newsletter subscription form data.
#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    #[serde(default)]
    pub email: String,
}

/// Success fragment template (replaces the form via HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "newsletter/subscribe_success.html")]
pub struct SubscribeSuccessTemplate {
    pub email: String,
}

/// Error fragment template (replaces the form via HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "newsletter/subscribe_error.html")]
pub struct SubscribeErrorTemplate {
    pub message: String,
    pub email: String,
}

/// Subscribe to newsletter (HTMX).
#[instrument(skip_all)]
pub async fn subscribe(
    State(state): State<AppState>,
    Form(form): Form<SubscribeForm>,
) -> impl IntoResponse {
    let Ok(email) = Email::parse(&form.email) else {
        return SubscribeErrorTemplate {
            message: "Please enter a valid email address.".to_string(),
            email: form.email.trim().to_string(),
        }
        .into_response();
    };

    // Newsletter-only customers never sign in with this password.
    let password = random_password();

    match state
        .storefront()
        .create_customer(email.as_str(), &password, true)
        .await
    {
        Ok(_) => {
            info!(domain = %email.domain(), "Newsletter subscription created");
            SubscribeSuccessTemplate {
                email: email.into_inner(),
            }
            .into_response()
        }
        Err(e) if is_existing_customer(&e) => {
            info!(domain = %email.domain(), "Newsletter subscriber already exists");
            SubscribeSuccessTemplate {
                email: email.into_inner(),
            }
            .into_response()
        }
        Err(e) => {
            warn!(error = %e, "Newsletter subscription failed");
            SubscribeErrorTemplate {
                message: "Something went wrong. Please try again.".to_string(),
                email: email.into_inner(),
            }
            .into_response()
        }
    }
}

/// Shopify reports duplicates as "Email has already been taken".
fn is_existing_customer(err: &ShopifyError) -> bool {
    match err {
        ShopifyError::UserError(message) => {
            let message = message.to_lowercase();
            message.contains("already been taken") || message.contains("already exists")
        }
        _ => false,
    }
}

fn random_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_existing_customer() {
        assert!(is_existing_customer(&ShopifyError::UserError(
            "Email has already been taken".to_string()
        )));
        assert!(!is_existing_customer(&ShopifyError::UserError(
            "Password is too short".to_string()
        )));
        assert!(!is_existing_customer(&ShopifyError::NotFound(
            "already been taken".to_string()
        )));
    }

    #[test]
    fn test_random_password() {
        let first = random_password();
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, random_password());
    }
}
