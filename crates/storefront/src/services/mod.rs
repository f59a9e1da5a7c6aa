//! Integrations that sit beside the Shopify clients.
//!
//! - [`gift`] - Applies the gift-with-purchase promotion after cart changes
//! - [`media`] - AI image generation relay
//! - [`cdn`] - Signed image uploads

pub mod cdn;
pub mod gift;
pub mod media;
