//! Gift-with-purchase eligibility.
//!
//! When the qualifying cart subtotal reaches the configured threshold, one
//! free gift line is added to the cart; when it drops below, the gift line is
//! taken out again. [`evaluate`] only decides; the storefront applies the
//! decision with a cart mutation.
//!
//! Gift lines are recognised by the [`GIFT_ATTRIBUTE_KEY`] line attribute, so
//! a customer who buys the gift product on purpose keeps their own line.

use core::cmp::Ordering;

use crate::types::{Money, MoneyError, VariantGid};

/// Line attribute that marks the automatically added gift line.
pub const GIFT_ATTRIBUTE_KEY: &str = "_gift_with_purchase";

/// Value stored under [`GIFT_ATTRIBUTE_KEY`].
pub const GIFT_ATTRIBUTE_VALUE: &str = "true";

/// Threshold and gift product for the promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftPolicy {
    /// Variant added as the gift.
    pub variant_id: VariantGid,
    /// Minimum qualifying subtotal, inclusive.
    pub threshold: Money,
}

/// The parts of a cart line the eligibility check looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftLine {
    pub line_id: String,
    pub merchandise_id: String,
    pub quantity: u32,
    /// Line total before order-level discounts.
    pub line_total: Money,
    /// Line carries the gift attribute.
    pub is_gift: bool,
}

/// What the cart needs for the promotion to hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GiftDecision {
    /// Eligible and no gift line yet.
    Add,
    /// Gift lines that must go: all of them when ineligible, the
    /// duplicates when eligible.
    Remove { line_ids: Vec<String> },
    /// Cart already matches the promotion.
    NoChange,
}

impl GiftPolicy {
    /// True when `subtotal` reaches the threshold.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::CurrencyMismatch`] if the subtotal is in another
    /// currency than the threshold.
    pub fn is_met_by(&self, subtotal: &Money) -> Result<bool, MoneyError> {
        Ok(subtotal.try_cmp(&self.threshold)? != Ordering::Less)
    }

    /// How much more the customer has to spend, or `None` once eligible.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::CurrencyMismatch`] on a currency mismatch.
    pub fn remaining(&self, lines: &[GiftLine]) -> Result<Option<Money>, MoneyError> {
        let subtotal = qualifying_subtotal(self, lines)?;
        if self.is_met_by(&subtotal)? {
            return Ok(None);
        }
        Ok(Some(Money::new(
            self.threshold.amount - subtotal.amount,
            self.threshold.currency_code,
        )))
    }
}

/// Sum of all non-gift line totals, in the policy currency.
///
/// # Errors
///
/// Returns [`MoneyError::CurrencyMismatch`] if a line is priced in another
/// currency than the threshold.
pub fn qualifying_subtotal(policy: &GiftPolicy, lines: &[GiftLine]) -> Result<Money, MoneyError> {
    lines
        .iter()
        .filter(|line| !line.is_gift)
        .try_fold(Money::zero(policy.threshold.currency_code), |sum, line| {
            sum.checked_add(line.line_total)
        })
}

/// Decide whether the gift line has to be added or removed.
///
/// Applying the returned decision and evaluating again yields
/// [`GiftDecision::NoChange`].
///
/// # Errors
///
/// Returns [`MoneyError::CurrencyMismatch`] if a non-gift line is priced in
/// another currency than the threshold.
pub fn evaluate(policy: &GiftPolicy, lines: &[GiftLine]) -> Result<GiftDecision, MoneyError> {
    let subtotal = qualifying_subtotal(policy, lines)?;
    let has_paid_lines = lines.iter().any(|line| !line.is_gift);
    let eligible = has_paid_lines && policy.is_met_by(&subtotal)?;
    let gift_lines: Vec<&GiftLine> = lines.iter().filter(|line| line.is_gift).collect();

    let decision = match (eligible, gift_lines.as_slice()) {
        (true, []) => GiftDecision::Add,
        (true, [_keep, extra @ ..]) if !extra.is_empty() => GiftDecision::Remove {
            line_ids: extra.iter().map(|line| line.line_id.clone()).collect(),
        },
        (false, gifts) if !gifts.is_empty() => GiftDecision::Remove {
            line_ids: gifts.iter().map(|line| line.line_id.clone()).collect(),
        },
        _ => GiftDecision::NoChange,
    };
    Ok(decision)
}
