//! Guildhall test utilities.
//!
//! Fixture builders for offer pages, sections, section-item links and
//! items. Builders emit rows in the remote (snake_case) form so they can be
//! seeded straight into a [`MemoryClient`].

use std::sync::Arc;

use guildhall_kernel::MemoryClient;
use guildhall_kernel::models::offer::{
    OFFER_ITEMS, OFFER_PAGE_SECTION_ITEMS, OFFER_PAGE_SECTIONS, OFFER_PAGES,
};
use serde_json::{Value as JsonValue, json};
use uuid::Uuid;

/// Create a test offer page with default values.
pub fn test_page(id: &str, slug: &str) -> TestPage {
    TestPage {
        id: id.to_string(),
        slug: slug.to_string(),
        title: format!("Oferta {slug}"),
        page_type: "individual".to_string(),
        position: None,
        is_active: true,
        is_test: false,
    }
}

/// An offer page builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestPage {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub page_type: String,
    pub position: Option<i32>,
    pub is_active: bool,
    pub is_test: bool,
}

impl TestPage {
    /// Set the page type (`individual`, `business`, `institution`, `event`).
    pub fn of_type(mut self, page_type: &str) -> Self {
        self.page_type = page_type.to_string();
        self
    }

    /// Set as inactive.
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Remote row.
    pub fn to_row(&self) -> JsonValue {
        json!({
            "id": self.id,
            "slug": self.slug,
            "title": self.title,
            "subtitle": null,
            "position": self.position,
            "type": self.page_type,
            "seo": { "title": self.title },
            "is_active": self.is_active,
            "is_test": self.is_test,
        })
    }
}

/// Create a test section on `page_id` with a generated id.
pub fn test_section(page_id: &str, position: i32) -> TestSection {
    TestSection {
        id: Uuid::now_v7().to_string(),
        offer_page_id: page_id.to_string(),
        section_type: "cards".to_string(),
        title: None,
        item_kind: None,
        display: json!({}),
        position,
        is_active: true,
    }
}

/// A section builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestSection {
    pub id: String,
    pub offer_page_id: String,
    pub section_type: String,
    pub title: Option<String>,
    pub item_kind: Option<String>,
    pub display: JsonValue,
    pub position: i32,
    pub is_active: bool,
}

impl TestSection {
    /// Set a custom ID.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Set the section type (`hero`, `cards`, `faq`, ...).
    pub fn of_type(mut self, section_type: &str) -> Self {
        self.section_type = section_type.to_string();
        self
    }

    /// Restrict to an item kind.
    pub fn with_item_kind(mut self, kind: &str) -> Self {
        self.item_kind = Some(kind.to_string());
        self
    }

    /// Set the display payload.
    pub fn with_display(mut self, display: JsonValue) -> Self {
        self.display = display;
        self
    }

    /// Set as inactive.
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Remote row.
    pub fn to_row(&self) -> JsonValue {
        json!({
            "id": self.id,
            "offer_page_id": self.offer_page_id,
            "type": self.section_type,
            "title": self.title,
            "subtitle": null,
            "item_kind": self.item_kind,
            "display": self.display,
            "position": self.position,
            "is_active": self.is_active,
            "is_test": false,
        })
    }
}

/// Create a link placing `item_id` at `position` in `section_id`.
pub fn test_link(section_id: &str, item_id: i64, position: i32) -> JsonValue {
    json!({
        "id": Uuid::now_v7().to_string(),
        "section_id": section_id,
        "offer_item_id": item_id,
        "position": position,
    })
}

/// Create a test item with default values.
pub fn test_item(id: i64, title: &str) -> TestItem {
    TestItem {
        id,
        title: title.to_string(),
        kind: "core".to_string(),
        pricing: json!({}),
        position: 0,
    }
}

/// An item builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestItem {
    pub id: i64,
    pub title: String,
    pub kind: String,
    pub pricing: JsonValue,
    pub position: i32,
}

impl TestItem {
    /// Set the kind (`core`, `addon`, `material`, `other`).
    pub fn kind(mut self, kind: &str) -> Self {
        self.kind = kind.to_string();
        self
    }

    /// Set the pricing payload (remote, snake_case keys).
    pub fn with_pricing(mut self, pricing: JsonValue) -> Self {
        self.pricing = pricing;
        self
    }

    /// Remote row.
    pub fn to_row(&self) -> JsonValue {
        json!({
            "id": self.id,
            "title": self.title,
            "slug": null,
            "kind": self.kind,
            "lead": null,
            "body": null,
            "meta": {},
            "pricing": self.pricing,
            "position": self.position,
            "is_active": true,
            "is_test": false,
        })
    }
}

/// Collects offer rows and seeds them into a [`MemoryClient`].
#[derive(Debug, Default)]
pub struct OfferFixture {
    pages: Vec<JsonValue>,
    sections: Vec<JsonValue>,
    links: Vec<JsonValue>,
    items: Vec<JsonValue>,
}

impl OfferFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: TestPage) -> Self {
        self.pages.push(page.to_row());
        self
    }

    pub fn section(mut self, section: TestSection) -> Self {
        self.sections.push(section.to_row());
        self
    }

    pub fn link(mut self, section_id: &str, item_id: i64, position: i32) -> Self {
        self.links.push(test_link(section_id, item_id, position));
        self
    }

    pub fn item(mut self, item: TestItem) -> Self {
        self.items.push(item.to_row());
        self
    }

    /// Seed every collected row into a fresh client.
    pub fn into_client(self) -> Arc<MemoryClient> {
        let client = Arc::new(MemoryClient::new());
        client.seed(OFFER_PAGES, self.pages);
        client.seed(OFFER_PAGE_SECTIONS, self.sections);
        client.seed(OFFER_PAGE_SECTION_ITEMS, self.links);
        client.seed(OFFER_ITEMS, self.items);
        client
    }
}
