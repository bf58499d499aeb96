//! Offer content module.
//!
//! This module provides:
//! - OfferService: assembles offer pages from sections, links and items
//! - Page lookups: section by type, cards by kind, FAQ entries
//! - Pricing: display strings for item pricing payloads

mod offer_service;
mod page_vm;
pub mod pricing;

pub use offer_service::{OfferService, assemble};
pub use page_vm::FaqEntry;
pub use pricing::{PricingFormatted, format_addon_pricing, format_pricing, format_pricing_detailed};
