//! Cart route handlers.
//!
//! Every cart change goes through one form endpoint, `POST /cart`, with an
//! `action` field naming the mutation. HTMX requests get the cart items
//! fragment back; plain form posts are redirected. Cart IDs live in the
//! session.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use thiserror::Error;
use tidepool_core::{Email, GiftPolicy, Money, VariantGid};
use tower_sessions::Session;
use tracing::{error, instrument, warn};

use super::views::{ImageView, local_path};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{Layout, session};
use crate::services::gift::reconcile_gift;
use crate::shopify::types::{
    Cart, CartBuyerIdentityInput, CartLine, CartLineInput, CartLineUpdateInput,
};
use crate::shopify::{ShopifyError, StorefrontClient};
use crate::state::AppState;

/// Quantities accepted when adding a line.
const ADD_QUANTITY: RangeInclusive<i64> = 1..=99;

/// Quantities accepted when updating a line. Zero removes it.
const UPDATE_QUANTITY: RangeInclusive<i64> = 0..=99;

/// Where plain form posts land when no `redirect_to` is given.
const DEFAULT_REDIRECT: &str = "/cart";

// =============================================================================
// Actions
// =============================================================================

/// Errors from parsing a cart form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartActionError {
    #[error("{0} cart action is not defined")]
    UnknownAction(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("quantity must be between {} and {}", .range.start(), .range.end())]
    QuantityOutOfRange { range: RangeInclusive<i64> },

    #[error("{0} is not a product variant")]
    InvalidMerchandise(String),

    #[error("invalid email address")]
    InvalidEmail,

    #[error("country code must be two letters")]
    InvalidCountryCode,

    #[error("the free gift is limited to one per order")]
    GiftQuantityLocked,
}

/// A cart mutation requested by a form post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    LinesAdd {
        merchandise_id: VariantGid,
        quantity: i64,
        selling_plan_id: Option<String>,
    },
    LinesUpdate {
        line_id: String,
        quantity: i64,
    },
    LinesRemove {
        line_id: String,
    },
    /// An empty list clears the codes.
    DiscountCodesUpdate {
        codes: Vec<String>,
    },
    GiftCardCodesUpdate {
        codes: Vec<String>,
    },
    BuyerIdentityUpdate {
        email: Option<String>,
        country_code: Option<String>,
    },
    NoteUpdate {
        note: String,
    },
}

impl CartAction {
    /// The form's `action` value for this mutation.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LinesAdd { .. } => "LinesAdd",
            Self::LinesUpdate { .. } => "LinesUpdate",
            Self::LinesRemove { .. } => "LinesRemove",
            Self::DiscountCodesUpdate { .. } => "DiscountCodesUpdate",
            Self::GiftCardCodesUpdate { .. } => "GiftCardCodesUpdate",
            Self::BuyerIdentityUpdate { .. } => "BuyerIdentityUpdate",
            Self::NoteUpdate { .. } => "NoteUpdate",
        }
    }

    /// Parse the action and its fields from a submitted form.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown or missing `action`, a missing
    /// required field, or a value outside its accepted range.
    pub fn from_form(form: &HashMap<String, String>) -> std::result::Result<Self, CartActionError> {
        let action = field(form, "action").unwrap_or("undefined");

        match action {
            "LinesAdd" => {
                let raw_id = required(form, "merchandise_id")?;
                let merchandise_id = parse_variant(raw_id)
                    .ok_or_else(|| CartActionError::InvalidMerchandise(raw_id.to_string()))?;
                Ok(Self::LinesAdd {
                    merchandise_id,
                    quantity: parse_quantity(field(form, "quantity"), Some(1), ADD_QUANTITY)?,
                    selling_plan_id: field(form, "selling_plan_id").map(str::to_string),
                })
            }
            "LinesUpdate" => Ok(Self::LinesUpdate {
                line_id: required(form, "line_id")?.to_string(),
                quantity: parse_quantity(field(form, "quantity"), None, UPDATE_QUANTITY)?,
            }),
            "LinesRemove" => Ok(Self::LinesRemove {
                line_id: required(form, "line_id")?.to_string(),
            }),
            "DiscountCodesUpdate" => Ok(Self::DiscountCodesUpdate {
                codes: field(form, "discount_code")
                    .map(|code| vec![code.to_string()])
                    .unwrap_or_default(),
            }),
            "GiftCardCodesUpdate" => Ok(Self::GiftCardCodesUpdate {
                codes: vec![required(form, "gift_card_code")?.to_string()],
            }),
            "BuyerIdentityUpdate" => {
                let email = field(form, "email")
                    .map(|raw| {
                        Email::parse(raw)
                            .map(Email::into_inner)
                            .map_err(|_| CartActionError::InvalidEmail)
                    })
                    .transpose()?;
                let country_code = field(form, "country_code")
                    .map(|raw| {
                        if raw.len() == 2 && raw.chars().all(|c| c.is_ascii_alphabetic()) {
                            Ok(raw.to_ascii_uppercase())
                        } else {
                            Err(CartActionError::InvalidCountryCode)
                        }
                    })
                    .transpose()?;
                Ok(Self::BuyerIdentityUpdate {
                    email,
                    country_code,
                })
            }
            "NoteUpdate" => Ok(Self::NoteUpdate {
                note: form
                    .get("note")
                    .map(|note| note.trim().to_string())
                    .ok_or(CartActionError::MissingField("note"))?,
            }),
            other => Err(CartActionError::UnknownAction(other.to_string())),
        }
    }
}

/// A trimmed, non-empty form value.
fn field<'a>(form: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    form.get(name).map(|value| value.trim()).filter(|value| !value.is_empty())
}

fn required<'a>(
    form: &'a HashMap<String, String>,
    name: &'static str,
) -> std::result::Result<&'a str, CartActionError> {
    field(form, name).ok_or(CartActionError::MissingField(name))
}

fn parse_quantity(
    raw: Option<&str>,
    default: Option<i64>,
    range: RangeInclusive<i64>,
) -> std::result::Result<i64, CartActionError> {
    let quantity = match raw {
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| CartActionError::QuantityOutOfRange {
                range: range.clone(),
            })?,
        None => default.ok_or(CartActionError::MissingField("quantity"))?,
    };

    if range.contains(&quantity) {
        Ok(quantity)
    } else {
        Err(CartActionError::QuantityOutOfRange { range })
    }
}

/// Accept either a variant global ID or its bare numeric ID.
fn parse_variant(raw: &str) -> Option<VariantGid> {
    VariantGid::parse(raw)
        .ok()
        .or_else(|| raw.parse::<u64>().ok().map(VariantGid::from_numeric))
}

/// Reject raising the quantity of the gift line. The promotion only ever
/// adds or removes whole gift lines, so extra units would stay free.
///
/// # Errors
///
/// Returns [`CartActionError::GiftQuantityLocked`] when `action` sets the gift
/// line above one unit.
pub fn check_gift_quantity(cart: &Cart, action: &CartAction) -> std::result::Result<(), CartActionError> {
    match action {
        CartAction::LinesUpdate { line_id, quantity }
            if *quantity > 1
                && cart
                    .lines
                    .iter()
                    .any(|line| &line.id == line_id && line.is_gift()) =>
        {
            Err(CartActionError::GiftQuantityLocked)
        }
        _ => Ok(()),
    }
}

/// Only same-site paths are followed; anything else goes to the cart.
#[must_use]
pub fn safe_redirect(target: Option<&str>) -> &str {
    target.and_then(local_path).unwrap_or(DEFAULT_REDIRECT)
}

/// Parse a cart permalink such as `40000000001:2,40000000002:1`.
///
/// # Errors
///
/// Returns an error for a malformed segment, an unknown variant or an out of
/// range quantity.
pub fn parse_permalink(lines: &str) -> std::result::Result<Vec<CartLineInput>, CartActionError> {
    let parsed = lines
        .split(',')
        .filter(|segment| !segment.trim().is_empty())
        .map(|segment| {
            let (raw_id, raw_quantity) = segment
                .split_once(':')
                .map_or((segment, None), |(id, quantity)| (id, Some(quantity)));
            let merchandise_id = parse_variant(raw_id.trim())
                .ok_or_else(|| CartActionError::InvalidMerchandise(raw_id.to_string()))?;
            let quantity = parse_quantity(raw_quantity.map(str::trim), Some(1), ADD_QUANTITY)?;
            Ok(CartLineInput {
                merchandise_id: merchandise_id.to_string(),
                quantity,
                attributes: None,
                selling_plan_id: None,
            })
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if parsed.is_empty() {
        return Err(CartActionError::MissingField("lines"));
    }
    Ok(parsed)
}

impl From<CartActionError> for AppError {
    fn from(err: CartActionError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

// =============================================================================
// View Models
// =============================================================================

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub variant_title: Option<String>,
    pub quantity: i64,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub line_price: String,
    pub image: Option<ImageView>,
    pub is_gift: bool,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        let merchandise = &line.merchandise;
        Self {
            id: line.id.clone(),
            handle: merchandise.product.handle.clone(),
            title: merchandise.product.title.clone(),
            variant_title: (merchandise.title != "Default Title")
                .then(|| merchandise.title.clone()),
            quantity: line.quantity,
            price: line.cost.amount_per_quantity.to_string(),
            compare_at_price: line
                .cost
                .compare_at_amount_per_quantity
                .filter(|compare| compare.amount > line.cost.amount_per_quantity.amount)
                .map(|compare| compare.to_string()),
            line_price: line.cost.total_amount.to_string(),
            image: merchandise
                .image
                .as_ref()
                .or(merchandise.product.featured_image.as_ref())
                .map(|image| ImageView::sized(image, 160, &merchandise.product.title)),
            is_gift: line.is_gift(),
        }
    }
}

/// Progress towards the free gift.
#[derive(Debug, Clone)]
pub struct GiftProgress {
    pub unlocked: bool,
    pub threshold: String,
    pub remaining: String,
}

/// Discount code display data.
#[derive(Debug, Clone)]
pub struct DiscountCodeView {
    pub code: String,
    pub applicable: bool,
}

/// Cart display data for templates.
#[derive(Debug, Clone, Default)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: i64,
    pub subtotal: String,
    pub total: String,
    pub tax: Option<String>,
    pub note: String,
    pub email: String,
    pub discount_codes: Vec<DiscountCodeView>,
    pub gift_cards: Vec<String>,
    pub gift: Option<GiftProgress>,
}

impl CartView {
    #[must_use]
    pub fn build(cart: &Cart, policy: Option<&GiftPolicy>) -> Self {
        Self {
            lines: cart.lines.iter().map(CartLineView::from).collect(),
            item_count: cart.total_quantity,
            subtotal: cart.cost.subtotal.to_string(),
            total: cart.cost.total.to_string(),
            tax: cart.cost.total_tax.filter(|tax| !tax.is_zero()).map(|tax| tax.to_string()),
            note: cart.note.clone().unwrap_or_default(),
            email: cart.buyer_identity.email.clone().unwrap_or_default(),
            discount_codes: cart
                .discount_codes
                .iter()
                .map(|code| DiscountCodeView {
                    code: code.code.clone(),
                    applicable: code.applicable,
                })
                .collect(),
            gift_cards: cart
                .applied_gift_cards
                .iter()
                .map(|card| format!("•••• {}", card.last_characters))
                .collect(),
            gift: policy.map(|policy| {
                let remaining = cart.gift_remaining(policy);
                GiftProgress {
                    unlocked: remaining.is_none(),
                    threshold: policy.threshold.to_string(),
                    remaining: remaining.map(|left| left.to_string()).unwrap_or_default(),
                }
            }),
        }
    }

    /// Cart view for visitors without a cart.
    #[must_use]
    pub fn empty(policy: Option<&GiftPolicy>) -> Self {
        let zero = policy
            .map(|policy| Money::zero(policy.threshold.currency_code).to_string())
            .unwrap_or_default();
        Self {
            subtotal: zero.clone(),
            total: zero,
            gift: policy.map(|policy| GiftProgress {
                unlocked: false,
                threshold: policy.threshold.to_string(),
                remaining: policy.threshold.to_string(),
            }),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: i64,
}

// =============================================================================
// Helpers
// =============================================================================

/// Load the session's cart. Expired carts are dropped from the session.
async fn load_cart(state: &AppState, session: &Session) -> Option<Cart> {
    let cart_id = session::cart_id(session).await?;

    match state.storefront().get_cart(&cart_id).await {
        Ok(cart) => Some(cart),
        Err(ShopifyError::NotFound(_)) => {
            if let Err(e) = session::clear_cart_id(session).await {
                error!(error = %e, "Failed to clear cart ID from session");
            }
            None
        }
        Err(e) => {
            warn!(cart_id = %cart_id, error = %e, "Failed to fetch cart");
            None
        }
    }
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("HX-Request")
        .is_some_and(|value| value.as_bytes() == b"true")
}

/// Run one action against the cart. `Ok(None)` means there was no cart to
/// change.
async fn apply_action(
    client: &StorefrontClient,
    cart_id: Option<&str>,
    action: CartAction,
) -> std::result::Result<Option<Cart>, ShopifyError> {
    let Some(cart_id) = cart_id else {
        return match action {
            CartAction::LinesAdd {
                merchandise_id,
                quantity,
                selling_plan_id,
            } => client
                .create_cart(
                    vec![line_input(&merchandise_id, quantity, selling_plan_id)],
                    None,
                )
                .await
                .map(Some),
            _ => Ok(None),
        };
    };

    let cart = match action {
        CartAction::LinesAdd {
            merchandise_id,
            quantity,
            selling_plan_id,
        } => {
            let line = line_input(&merchandise_id, quantity, selling_plan_id);
            match client.add_to_cart(cart_id, vec![line.clone()]).await {
                Err(ShopifyError::NotFound(_)) => client.create_cart(vec![line], None).await?,
                result => result?,
            }
        }
        CartAction::LinesUpdate { line_id, quantity } => {
            client
                .update_cart(
                    cart_id,
                    vec![CartLineUpdateInput {
                        id: line_id,
                        quantity: Some(quantity),
                    }],
                )
                .await?
        }
        CartAction::LinesRemove { line_id } => {
            client.remove_from_cart(cart_id, vec![line_id]).await?
        }
        CartAction::DiscountCodesUpdate { codes } => {
            client.update_discount_codes(cart_id, codes).await?
        }
        CartAction::GiftCardCodesUpdate { codes } => {
            client.update_gift_card_codes(cart_id, codes).await?
        }
        CartAction::BuyerIdentityUpdate {
            email,
            country_code,
        } => {
            client
                .update_buyer_identity(
                    cart_id,
                    CartBuyerIdentityInput {
                        email,
                        country_code,
                    },
                )
                .await?
        }
        CartAction::NoteUpdate { note } => client.update_cart_note(cart_id, &note).await?,
    };

    Ok(Some(cart))
}

fn line_input(
    merchandise_id: &VariantGid,
    quantity: i64,
    selling_plan_id: Option<String>,
) -> CartLineInput {
    CartLineInput {
        merchandise_id: merchandise_id.to_string(),
        quantity,
        attributes: None,
        selling_plan_id,
    }
}

/// Apply the gift promotion and remember the cart.
async fn finish_mutation(state: &AppState, session: &Session, cart: Cart) -> Cart {
    let cart = match state.config().gift.as_ref() {
        Some(policy) => reconcile_gift(state.storefront(), policy, cart).await,
        None => cart,
    };

    if let Err(e) = session::set_cart_id(session, &cart.id).await {
        error!(error = %e, "Failed to save cart ID to session");
    }
    cart
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session, layout))]
pub async fn show(State(state): State<AppState>, session: Session, layout: Layout) -> impl IntoResponse {
    let policy = state.config().gift.as_ref();
    let cart = load_cart(&state, &session)
        .await
        .map_or_else(|| CartView::empty(policy), |cart| CartView::build(&cart, policy));

    CartShowTemplate { layout, cart }
}

/// Apply a cart action from a form post.
///
/// # Errors
///
/// Returns 400 for malformed forms and rejected mutations, 500 when Shopify
/// fails.
#[instrument(skip_all)]
pub async fn dispatch(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response> {
    let action = CartAction::from_form(&form)?;
    let redirect_to = safe_redirect(form.get("redirect_to").map(String::as_str)).to_string();
    let cart_id = session::cart_id(&session).await;

    if let (CartAction::LinesUpdate { quantity: 2.., .. }, Some(id)) =
        (&action, cart_id.as_deref())
    {
        match state.storefront().get_cart(id).await {
            Ok(current) => check_gift_quantity(&current, &action)?,
            Err(ShopifyError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    let name = action.name();
    let cart = match apply_action(state.storefront(), cart_id.as_deref(), action).await? {
        Some(cart) => {
            add_breadcrumb("cart", "Cart updated", Some(&[("action", name)]));
            Some(finish_mutation(&state, &session, cart).await)
        }
        None => None,
    };

    if is_htmx(&headers) {
        let policy = state.config().gift.as_ref();
        let cart = cart.map_or_else(|| CartView::empty(policy), |cart| CartView::build(&cart, policy));
        return Ok((
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartItemsTemplate { cart },
        )
            .into_response());
    }

    Ok(Redirect::to(&redirect_to).into_response())
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let count = load_cart(&state, &session)
        .await
        .map_or(0, |cart| cart.total_quantity);

    CartCountTemplate { count }
}

/// Redirect to Shopify checkout.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Redirect {
    match load_cart(&state, &session).await {
        Some(cart) if !cart.lines.is_empty() => Redirect::to(&cart.checkout_url),
        _ => Redirect::to(DEFAULT_REDIRECT),
    }
}

/// Build a fresh cart from a permalink and go straight to checkout.
///
/// # Errors
///
/// Returns 400 for a malformed permalink.
#[instrument(skip(state, session))]
pub async fn permalink(
    State(state): State<AppState>,
    session: Session,
    Path(lines): Path<String>,
) -> Result<Redirect> {
    let lines = parse_permalink(&lines)?;
    let cart = state.storefront().create_cart(lines, None).await?;
    let cart = finish_mutation(&state, &session, cart).await;

    Ok(Redirect::to(&cart.checkout_url))
}
