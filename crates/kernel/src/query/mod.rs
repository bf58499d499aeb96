//! Declarative query module.
//!
//! This module provides:
//! - Types: FilterOperator, Filter, FilterSet, Pagination, RowRange, SortDirection
//! - QuerySpec: immutable description of a remote fetch, encoded to
//!   PostgREST parameters only at execution time

mod query_builder;
pub mod types;

pub use query_builder::{CountMode, OrderBy, Predicate, QuerySpec};
pub use types::{Filter, FilterOperator, FilterSet, Pagination, RowRange, SortDirection};
