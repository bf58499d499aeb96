//! Content models.

pub mod offer;

pub use offer::{
    OfferItem, OfferItemKind, OfferPage, OfferPageSection, OfferPageType, OfferPageVm,
    OfferSectionItem, OfferSectionType, OfferSectionVm,
};
