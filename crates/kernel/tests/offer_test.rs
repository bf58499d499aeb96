#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Offer page assembly integration tests.
//!
//! Runs OfferService against the in-memory client seeded with fixtures.

use guildhall_kernel::backend::{Backend, TableAction};
use guildhall_kernel::content::OfferService;
use guildhall_kernel::models::offer::{
    OFFER_ITEMS, OFFER_PAGE_SECTION_ITEMS, OFFER_PAGE_SECTIONS, OFFER_PAGES,
};
use guildhall_kernel::models::{OfferItemKind, OfferSectionType};
use guildhall_kernel::query::FilterOperator;
use guildhall_kernel::{BackendError, MemoryClient};
use guildhall_test_utils::{OfferFixture, test_item, test_page, test_section};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn service(client: &Arc<MemoryClient>) -> OfferService {
    OfferService::new(Backend::new(client.clone()))
}

fn section_ids(vm: &guildhall_kernel::models::OfferPageVm) -> Vec<&str> {
    vm.sections.iter().map(|s| s.section.id.as_str()).collect()
}

fn item_ids(vm: &guildhall_kernel::models::OfferPageVm, section: &str) -> Vec<i64> {
    vm.sections
        .iter()
        .find(|s| s.section.id == section)
        .map(|s| s.items.iter().map(|i| i.id).collect())
        .unwrap_or_default()
}

// -------------------------------------------------------------------------
// End-to-end assembly
// -------------------------------------------------------------------------

#[tokio::test]
async fn assembles_sections_and_items_in_position_order() {
    let client = OfferFixture::new()
        .page(test_page("P1", "a"))
        .section(test_section("P1", 2).with_id("S1"))
        .section(test_section("P1", 1).with_id("S2"))
        .link("S2", 10, 1)
        .link("S1", 20, 1)
        .link("S1", 99, 2)
        .item(test_item(10, "Sesja one-shot"))
        .item(test_item(20, "Kampania"))
        .into_client();

    let vm = service(&client).page_vm_by_slug("a").await.unwrap().unwrap();

    assert_eq!(vm.page.id, "P1");
    assert_eq!(section_ids(&vm), vec!["S2", "S1"]);
    assert_eq!(item_ids(&vm, "S2"), vec![10]);
    // link to 99 has no item and is dropped
    assert_eq!(item_ids(&vm, "S1"), vec![20]);
    assert_eq!(client.calls(), 4);
}

#[tokio::test]
async fn issues_one_batched_query_per_step() {
    let client = OfferFixture::new()
        .page(test_page("P1", "a"))
        .section(test_section("P1", 1).with_id("S1"))
        .section(test_section("P1", 2).with_id("S2"))
        .link("S1", 10, 1)
        .link("S2", 10, 1)
        .link("S2", 20, 2)
        .item(test_item(10, "Sesja"))
        .item(test_item(20, "Kości"))
        .into_client();

    service(&client).page_vm_by_slug("a").await.unwrap().unwrap();

    let requests = client.requests();
    let tables: Vec<&str> = requests.iter().map(|r| r.spec.table.as_str()).collect();
    assert_eq!(
        tables,
        vec![OFFER_PAGES, OFFER_PAGE_SECTIONS, OFFER_PAGE_SECTION_ITEMS, OFFER_ITEMS]
    );
    assert!(requests.iter().all(|r| r.action == TableAction::Select));

    let links = &requests[2].spec.predicates[0];
    assert_eq!(links.column, "section_id");
    assert_eq!(links.operator, FilterOperator::In);
    assert_eq!(links.value, json!(["S1", "S2"]));

    // item 10 is linked twice but requested once
    let items = &requests[3].spec.predicates[0];
    assert_eq!(items.value, json!([10, 20]));
}

#[tokio::test]
async fn items_follow_link_order_not_fetch_order() {
    let client = OfferFixture::new()
        .page(test_page("P1", "a"))
        .section(test_section("P1", 1).with_id("S1"))
        .link("S1", 3, 3)
        .link("S1", 1, 1)
        .link("S1", 2, 2)
        .item(test_item(3, "c"))
        .item(test_item(2, "b"))
        .item(test_item(1, "a"))
        .into_client();

    let vm = service(&client).page_vm_by_slug("a").await.unwrap().unwrap();
    assert_eq!(item_ids(&vm, "S1"), vec![1, 2, 3]);
}

#[tokio::test]
async fn equal_positions_keep_fetch_order() {
    let client = OfferFixture::new()
        .page(test_page("P1", "a"))
        .section(test_section("P1", 1).with_id("first"))
        .section(test_section("P1", 1).with_id("second"))
        .into_client();

    let vm = service(&client).page_vm_by_slug("a").await.unwrap().unwrap();
    assert_eq!(section_ids(&vm), vec!["first", "second"]);
}

// -------------------------------------------------------------------------
// Short circuits
// -------------------------------------------------------------------------

#[tokio::test]
async fn unknown_slug_is_none() {
    let client = OfferFixture::new().page(test_page("P1", "a")).into_client();

    let vm = service(&client).page_vm_by_slug("missing").await.unwrap();
    assert!(vm.is_none());
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn page_without_sections_has_empty_list() {
    let client = OfferFixture::new().page(test_page("P1", "a")).into_client();

    let vm = service(&client).page_vm_by_slug("a").await.unwrap().unwrap();
    assert_eq!(vm.page.slug, "a");
    assert!(vm.sections.is_empty());
    assert_eq!(client.calls(), 2);
}

#[tokio::test]
async fn inactive_and_foreign_sections_are_excluded() {
    let client = OfferFixture::new()
        .page(test_page("P1", "a"))
        .page(test_page("P2", "b"))
        .section(test_section("P1", 1).with_id("S1"))
        .section(test_section("P1", 2).with_id("hidden").inactive())
        .section(test_section("P2", 1).with_id("other"))
        .into_client();

    let vm = service(&client).page_vm_by_slug("a").await.unwrap().unwrap();
    assert_eq!(section_ids(&vm), vec!["S1"]);
}

#[tokio::test]
async fn sections_without_links_skip_item_fetch() {
    let client = OfferFixture::new()
        .page(test_page("P1", "a"))
        .section(test_section("P1", 2).with_id("S1"))
        .section(test_section("P1", 1).with_id("S2"))
        .into_client();

    let vm = service(&client).page_vm_by_slug("a").await.unwrap().unwrap();
    assert_eq!(section_ids(&vm), vec!["S2", "S1"]);
    assert!(vm.sections.iter().all(|s| s.items.is_empty()));
    assert_eq!(client.calls(), 3);
}

#[tokio::test]
async fn all_items_missing_leaves_sections_empty() {
    let client = OfferFixture::new()
        .page(test_page("P1", "a"))
        .section(test_section("P1", 1).with_id("S1"))
        .link("S1", 404, 1)
        .into_client();

    let vm = service(&client).page_vm_by_slug("a").await.unwrap().unwrap();
    assert_eq!(section_ids(&vm), vec!["S1"]);
    assert!(vm.sections[0].items.is_empty());
}

// -------------------------------------------------------------------------
// Failures
// -------------------------------------------------------------------------

#[tokio::test]
async fn fetch_errors_abort_assembly() {
    for table in [OFFER_PAGES, OFFER_PAGE_SECTIONS, OFFER_PAGE_SECTION_ITEMS, OFFER_ITEMS] {
        let client = OfferFixture::new()
            .page(test_page("P1", "a"))
            .section(test_section("P1", 1).with_id("S1"))
            .link("S1", 10, 1)
            .item(test_item(10, "Sesja"))
            .into_client();
        client.fail_table(table, format!("{table} unavailable"));

        let err = service(&client).page_vm_by_slug("a").await.unwrap_err();
        assert!(matches!(err, BackendError::Remote { .. }));
        assert_eq!(err.to_string(), format!("{table} unavailable"));
    }
}

// -------------------------------------------------------------------------
// Page lookups
// -------------------------------------------------------------------------

#[tokio::test]
async fn assembled_page_supports_section_lookups() {
    let client = OfferFixture::new()
        .page(test_page("P1", "a").of_type("business"))
        .section(test_section("P1", 1).with_id("hero").of_type("hero"))
        .section(test_section("P1", 2).with_id("addons").with_item_kind("addon"))
        .section(
            test_section("P1", 3)
                .with_id("faq")
                .of_type("faq")
                .with_display(json!({ "items": [{ "h": "Dla kogo?", "a": "Dla firm" }] })),
        )
        .link("addons", 7, 1)
        .item(test_item(7, "Mapa").kind("addon").with_pricing(json!({ "unit": 40, "unit_label": "szt." })))
        .into_client();

    let vm = service(&client).page_vm_by_slug("a").await.unwrap().unwrap();

    assert_eq!(vm.section_by_type(OfferSectionType::Hero).unwrap().section.id, "hero");
    let addons = vm.cards_by_kind(OfferItemKind::Addon).unwrap();
    assert_eq!(addons.items[0].kind, OfferItemKind::Addon);
    // pricing keys are camelCased on the way in
    assert_eq!(
        guildhall_kernel::content::format_addon_pricing(&addons.items[0].pricing)
            .unwrap()
            .value,
        "+40 PLN / szt."
    );
    assert_eq!(vm.faq_entries().len(), 1);
}
