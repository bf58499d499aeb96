//! Offer page records.
//!
//! Four flat tables make up an offer page: `offer_pages`, their
//! `offer_page_sections`, the ordered `offer_page_section_items` links, and
//! the shared `offer_items` catalogue.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const OFFER_PAGES: &str = "offer_pages";
pub const OFFER_PAGE_SECTIONS: &str = "offer_page_sections";
pub const OFFER_PAGE_SECTION_ITEMS: &str = "offer_page_section_items";
pub const OFFER_ITEMS: &str = "offer_items";

/// Audience an offer page targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OfferPageType {
    Individual,
    Business,
    Institution,
    Event,
}

/// Layout of a page section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OfferSectionType {
    Hero,
    Highlights,
    Cards,
    PricingTable,
    Timeline,
    Faq,
    SeoText,
    Cta,
}

/// Category of an offer item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OfferItemKind {
    Core,
    Addon,
    Material,
    Other,
}

/// Offer page record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OfferPage {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(rename = "type")]
    pub page_type: OfferPageType,
    #[serde(default)]
    pub seo: Value,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_test: bool,
}

/// Section of an offer page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OfferPageSection {
    pub id: String,
    pub offer_page_id: String,
    #[serde(rename = "type")]
    pub section_type: OfferSectionType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Restricts a cards section to one item kind.
    #[serde(default)]
    pub item_kind: Option<OfferItemKind>,
    /// Free-form layout payload (FAQ entries, CTA targets, ...).
    #[serde(default)]
    pub display: Value,
    pub position: i32,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_test: bool,
}

/// Catalogue entry shown inside sections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OfferItem {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub kind: OfferItemKind,
    #[serde(default)]
    pub lead: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub meta: Value,
    #[serde(default)]
    pub pricing: Value,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_test: bool,
}

/// Ordered link between a section and an item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OfferSectionItem {
    pub id: String,
    pub section_id: String,
    pub offer_item_id: i64,
    pub position: i32,
}

/// A section with its resolved items, in link order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfferSectionVm {
    #[serde(flatten)]
    pub section: OfferPageSection,
    pub items: Vec<OfferItem>,
}

/// Fully assembled offer page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfferPageVm {
    pub page: OfferPage,
    pub sections: Vec<OfferSectionVm>,
}
