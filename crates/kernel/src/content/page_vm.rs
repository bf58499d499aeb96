//! Lookups over an assembled offer page.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{OfferItemKind, OfferPageVm, OfferSectionType, OfferSectionVm};

/// One question/answer pair from a FAQ section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FaqEntry {
    pub h: String,
    pub a: String,
}

impl OfferPageVm {
    /// First section of the given type.
    pub fn section_by_type(&self, section_type: OfferSectionType) -> Option<&OfferSectionVm> {
        self.sections
            .iter()
            .find(|s| s.section.section_type == section_type)
    }

    /// First cards section restricted to `kind`.
    pub fn cards_by_kind(&self, kind: OfferItemKind) -> Option<&OfferSectionVm> {
        self.sections.iter().find(|s| {
            s.section.section_type == OfferSectionType::Cards && s.section.item_kind == Some(kind)
        })
    }

    /// Entries of the FAQ section's `display.items`.
    ///
    /// Accepts a list or an object keyed by position; anything else yields
    /// no entries. Malformed entries are skipped.
    pub fn faq_entries(&self) -> Vec<FaqEntry> {
        self.section_by_type(OfferSectionType::Faq)
            .and_then(|s| s.section.display.get("items"))
            .map(normalize_faq_items)
            .unwrap_or_default()
    }
}

fn normalize_faq_items(items: &Value) -> Vec<FaqEntry> {
    let entries: Vec<&Value> = match items {
        Value::Array(list) => list.iter().collect(),
        Value::Object(map) => {
            let mut keyed: Vec<(&String, &Value)> = map.iter().collect();
            keyed.sort_by_key(|(k, _)| k.parse::<i64>().unwrap_or(i64::MAX));
            keyed.into_iter().map(|(_, v)| v).collect()
        }
        _ => Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|v| serde_json::from_value(v.clone()).ok())
        .collect()
}
