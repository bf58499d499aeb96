//! Offer page assembly.
//!
//! Builds an [`OfferPageVm`] from four dependent fetches:
//! page by slug, active sections, section-item links, items.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::{Backend, FetchOptions};
use crate::error::BackendResult;
use crate::models::offer::{OFFER_ITEMS, OFFER_PAGE_SECTION_ITEMS, OFFER_PAGE_SECTIONS, OFFER_PAGES};
use crate::models::{OfferItem, OfferPage, OfferPageSection, OfferPageVm, OfferSectionItem, OfferSectionVm};
use crate::query::{FilterSet, SortDirection};

/// Read-side service for offer pages.
#[derive(Clone)]
pub struct OfferService {
    backend: Backend,
}

impl OfferService {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Assemble the offer page for `slug`.
    ///
    /// Returns `Ok(None)` when no page has that slug. Sections are ordered
    /// by position; each section's items follow their link positions. Links
    /// pointing at items that no longer exist are left out. Any fetch error
    /// aborts the whole assembly.
    pub async fn page_vm_by_slug(&self, slug: &str) -> BackendResult<Option<OfferPageVm>> {
        let Some(page) = self
            .backend
            .get_by_slug::<OfferPage>(OFFER_PAGES, slug)
            .await?
        else {
            debug!(slug, "offer page not found");
            return Ok(None);
        };

        let sections: Vec<OfferPageSection> = self
            .backend
            .get_all(
                OFFER_PAGE_SECTIONS,
                &FetchOptions::filtered(
                    FilterSet::new()
                        .eq("offerPageId", page.id.clone())
                        .eq("isActive", true),
                )
                .sorted("position", SortDirection::Asc),
            )
            .await?;

        if sections.is_empty() {
            return Ok(Some(OfferPageVm {
                page,
                sections: Vec::new(),
            }));
        }

        let section_ids: Vec<Value> = sections.iter().map(|s| Value::from(s.id.clone())).collect();
        let links: Vec<OfferSectionItem> = self
            .backend
            .get_all(
                OFFER_PAGE_SECTION_ITEMS,
                &FetchOptions::filtered(FilterSet::new().is_in("sectionId", section_ids))
                    .sorted("position", SortDirection::Asc),
            )
            .await?;

        let mut seen = HashSet::new();
        let item_ids: Vec<i64> = links
            .iter()
            .map(|l| l.offer_item_id)
            .filter(|id| seen.insert(*id))
            .collect();

        if item_ids.is_empty() {
            let sections = sort_sections(sections)
                .into_iter()
                .map(|section| OfferSectionVm {
                    section,
                    items: Vec::new(),
                })
                .collect();
            return Ok(Some(OfferPageVm { page, sections }));
        }

        let items: Vec<OfferItem> = self.backend.get_by_ids(OFFER_ITEMS, &item_ids).await?;

        Ok(Some(assemble(page, sections, links, items)))
    }
}

/// Join sections, links and items into a view model.
///
/// Pure: callers supply the three fetched lists in any order.
pub fn assemble(
    page: OfferPage,
    sections: Vec<OfferPageSection>,
    links: Vec<OfferSectionItem>,
    items: Vec<OfferItem>,
) -> OfferPageVm {
    let items_by_id: HashMap<i64, OfferItem> = items.into_iter().map(|it| (it.id, it)).collect();

    let mut links_by_section: HashMap<String, Vec<OfferSectionItem>> = HashMap::new();
    for link in links {
        links_by_section
            .entry(link.section_id.clone())
            .or_default()
            .push(link);
    }

    let mut dangling = 0usize;
    let sections = sort_sections(sections)
        .into_iter()
        .map(|section| {
            let mut section_links = links_by_section.remove(&section.id).unwrap_or_default();
            section_links.sort_by_key(|l| l.position);

            let items = section_links
                .iter()
                .filter_map(|link| {
                    let item = items_by_id.get(&link.offer_item_id).cloned();
                    if item.is_none() {
                        dangling += 1;
                    }
                    item
                })
                .collect();

            OfferSectionVm { section, items }
        })
        .collect();

    if dangling > 0 {
        warn!(
            page = %page.slug,
            dangling,
            "offer page links reference missing items; omitted"
        );
    }

    OfferPageVm { page, sections }
}

/// Stable sort by position; ties keep fetch order.
fn sort_sections(mut sections: Vec<OfferPageSection>) -> Vec<OfferPageSection> {
    sections.sort_by_key(|s| s.position);
    sections
}
