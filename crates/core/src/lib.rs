//! Tidepool Core - Shared domain types and pure storefront rules.
//!
//! This crate is used by the `storefront` binary and the integration tests.
//! It contains only types and pure functions - no I/O, no HTTP clients, no
//! session state. Everything here can be exercised with plain unit tests.
//!
//! # Modules
//!
//! - [`types`] - Money, platform global IDs, emails and order statuses
//! - [`gift`] - Gift-with-purchase eligibility
//! - [`reviews`] - Deterministic review metadata for product cards

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod gift;
pub mod reviews;
pub mod types;

pub use gift::{GiftDecision, GiftLine, GiftPolicy};
pub use reviews::ReviewSummary;
pub use types::*;
