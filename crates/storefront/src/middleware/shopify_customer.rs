//! Shopify Customer authentication extractors.
//!
//! Customer Account API tokens live in the session. [`RequireShopifyCustomer`]
//! refreshes an expired access token before the handler runs; when the
//! refresh fails the customer is signed out and sent to the login page.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, Uri, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::{info, warn};

use super::session::keys;
use crate::shopify::customer::CustomerAccessToken;
use crate::state::AppState;

/// Extractor that requires a signed-in customer.
///
/// ```rust,ignore
/// async fn orders(
///     State(state): State<AppState>,
///     RequireShopifyCustomer(token): RequireShopifyCustomer,
/// ) -> Result<impl IntoResponse> {
///     let page = state.customer().get_orders(&token.access_token, 10, None).await?;
///     // ...
/// }
/// ```
pub struct RequireShopifyCustomer(pub CustomerAccessToken);

/// Error returned when a signed-in customer is required but absent.
pub enum ShopifyCustomerRejection {
    /// Send HTML requests to the login page, then back to `return_to`.
    RedirectToLogin { return_to: String },
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for ShopifyCustomerRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { return_to } => Redirect::to(&format!(
                "/auth/login?return_to={}",
                urlencoding::encode(&return_to)
            ))
            .into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl ShopifyCustomerRejection {
    fn for_request(parts: &Parts) -> Self {
        let uri: &Uri = parts
            .extensions
            .get::<OriginalUri>()
            .map_or(&parts.uri, |OriginalUri(uri)| uri);
        if uri.path().starts_with("/api/") {
            return Self::Unauthorized;
        }
        let return_to = uri
            .path_and_query()
            .map_or("/account", |pq| pq.as_str())
            .to_string();
        Self::RedirectToLogin { return_to }
    }
}

impl FromRequestParts<AppState> for RequireShopifyCustomer {
    type Rejection = ShopifyCustomerRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(ShopifyCustomerRejection::Unauthorized)?;

        let token: CustomerAccessToken = session
            .get(keys::CUSTOMER_TOKEN)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| ShopifyCustomerRejection::for_request(parts))?;

        if !token.is_expired() {
            return Ok(Self(token));
        }

        let Some(refresh_token) = token.refresh_token.as_deref() else {
            info!("Customer token expired without refresh token");
            let _ = clear_shopify_customer_token(&session).await;
            return Err(ShopifyCustomerRejection::for_request(parts));
        };

        match state.customer().refresh_token(refresh_token).await {
            Ok(mut refreshed) => {
                if refreshed.id_token.is_none() {
                    refreshed.id_token = token.id_token;
                }
                if let Err(e) = set_shopify_customer_token(&session, &refreshed).await {
                    warn!(error = %e, "Failed to store refreshed customer token");
                }
                Ok(Self(refreshed))
            }
            Err(e) => {
                warn!(error = %e, "Customer token refresh failed, signing out");
                let _ = clear_shopify_customer_token(&session).await;
                Err(ShopifyCustomerRejection::for_request(parts))
            }
        }
    }
}

/// Extractor that optionally gets the customer token, for header links.
/// Expired tokens are left to [`RequireShopifyCustomer`] to refresh.
pub struct OptionalShopifyCustomer(pub Option<CustomerAccessToken>);

impl<S> FromRequestParts<S> for OptionalShopifyCustomer
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CustomerAccessToken>(keys::CUSTOMER_TOKEN)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(token))
    }
}

/// Store the customer's tokens in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_shopify_customer_token(
    session: &Session,
    token: &CustomerAccessToken,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CUSTOMER_TOKEN, token).await
}

/// Remove the customer's tokens from the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_shopify_customer_token(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CustomerAccessToken>(keys::CUSTOMER_TOKEN)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, header::LOCATION};

    fn parts(uri: &str) -> Parts {
        let (parts, ()) = Request::builder()
            .uri(uri)
            .body(())
            .unwrap_or_default()
            .into_parts();
        parts
    }

    #[test]
    fn test_html_requests_redirect_with_return_path() {
        let rejection = ShopifyCustomerRejection::for_request(&parts("/account/orders?after=abc"));
        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[LOCATION],
            "/auth/login?return_to=%2Faccount%2Forders%3Fafter%3Dabc"
        );
    }

    #[test]
    fn test_api_requests_get_unauthorized() {
        let rejection = ShopifyCustomerRejection::for_request(&parts("/api/media/uploads"));
        assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
