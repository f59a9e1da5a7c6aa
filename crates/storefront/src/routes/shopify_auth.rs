//! Shopify Customer Account OAuth route handlers.
//!
//! Sign-in is delegated to Shopify: `/auth/login` stores a CSRF state and an
//! OpenID nonce in the session and redirects to the authorization page,
//! `/auth/callback` checks the state and exchanges the code for tokens.

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use rand::{Rng, distr::Alphanumeric};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{error, info, instrument, warn};

use super::views::local_path;
use crate::error::{AppError, Result, clear_sentry_user};
use crate::middleware::session::keys;
use crate::middleware::{
    OptionalShopifyCustomer, clear_shopify_customer_token, set_shopify_customer_token,
};
use crate::state::AppState;

/// Where customers land after signing in without a `return_to`.
const DEFAULT_RETURN_TO: &str = "/account";

/// Query parameters for starting a sign-in.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub return_to: Option<String>,
}

/// Query parameters from Shopify OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    /// CSRF state echoed back by Shopify.
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Random alphanumeric string for OAuth state and nonce values.
fn random_token(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

fn redirect_uri(state: &AppState) -> String {
    format!("{}/auth/callback", state.config().base_url)
}

fn session_error(e: &tower_sessions::session::Error) -> AppError {
    error!(error = %e, "Session store failed");
    AppError::Internal("session unavailable".to_string())
}

/// Start Shopify Customer Account sign-in.
///
/// # Errors
///
/// Returns 500 if the session cannot be written.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    OptionalShopifyCustomer(customer): OptionalShopifyCustomer,
    Query(query): Query<LoginQuery>,
) -> Result<Redirect> {
    let return_to = query
        .return_to
        .as_deref()
        .and_then(local_path)
        .unwrap_or(DEFAULT_RETURN_TO)
        .to_string();

    if customer.is_some() {
        return Ok(Redirect::to(&return_to));
    }

    let oauth_state = random_token(32);
    let nonce = random_token(32);

    session
        .insert(keys::OAUTH_STATE, &oauth_state)
        .await
        .map_err(|e| session_error(&e))?;
    session
        .insert(keys::OAUTH_NONCE, &nonce)
        .await
        .map_err(|e| session_error(&e))?;
    session
        .insert(keys::OAUTH_RETURN_TO, &return_to)
        .await
        .map_err(|e| session_error(&e))?;

    let auth_url = state
        .customer()
        .authorization_url(&redirect_uri(&state), &oauth_state, &nonce);

    Ok(Redirect::to(&auth_url))
}

/// Handle Shopify OAuth callback.
///
/// # Errors
///
/// Returns 401 when the customer declined, 400 for a missing code or a state
/// mismatch, and 500 when the token exchange fails.
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect> {
    if let Some(error) = query.error {
        warn!(
            error = %error,
            description = query.error_description.as_deref().unwrap_or_default(),
            "Shopify sign-in was not completed"
        );
        return Err(AppError::Unauthorized("Sign-in was not completed".to_string()));
    }

    let (Some(code), Some(returned_state)) = (query.code, query.state) else {
        return Err(AppError::BadRequest("Missing authorization code".to_string()));
    };

    let stored_state = session
        .remove::<String>(keys::OAUTH_STATE)
        .await
        .map_err(|e| session_error(&e))?;
    // Nonce is single use whether or not the state matches.
    let _ = session.remove::<String>(keys::OAUTH_NONCE).await;

    if stored_state.as_deref() != Some(returned_state.as_str()) {
        warn!("Shopify OAuth state mismatch");
        return Err(AppError::BadRequest("Sign-in link expired, please try again".to_string()));
    }

    let token = state
        .customer()
        .exchange_code(&code, &redirect_uri(&state))
        .await?;

    set_shopify_customer_token(&session, &token)
        .await
        .map_err(|e| session_error(&e))?;
    // New privilege level, new session ID.
    session.cycle_id().await.map_err(|e| session_error(&e))?;

    let return_to = session
        .remove::<String>(keys::OAUTH_RETURN_TO)
        .await
        .ok()
        .flatten()
        .filter(|path| local_path(path).is_some())
        .unwrap_or_else(|| DEFAULT_RETURN_TO.to_string());

    info!("Customer signed in");
    Ok(Redirect::to(&return_to))
}

/// Sign out, ending the Shopify session too when an ID token is available.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalShopifyCustomer(customer): OptionalShopifyCustomer,
) -> Redirect {
    if let Err(e) = clear_shopify_customer_token(&session).await {
        error!(error = %e, "Failed to clear customer token");
    }
    clear_sentry_user();

    if let Some(id_token) = customer.and_then(|token| token.id_token) {
        let post_logout_uri = format!("{}/", state.config().base_url);
        return Redirect::to(&state.customer().logout_url(&id_token, &post_logout_uri));
    }

    Redirect::to("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_token() {
        let token = random_token(32);
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, random_token(32));
    }
}
