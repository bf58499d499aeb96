//! Filter and paging types for backend queries.
//!
//! Provides the declarative pieces a caller hands to the backend:
//! - FilterOperator: comparison operators understood by the remote store
//! - Filter / FilterSet: per-field constraints, keyed by camelCase field name
//! - SortDirection, RowRange, Pagination: ordering and windowing

use std::fmt;
use std::str::FromStr;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::QueryError;

/// Comparison operators for filtering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum FilterOperator {
    /// Exact match.
    Equals,
    /// Not equal.
    NotEquals,
    /// Greater than.
    GreaterThan,
    /// Greater than or equal.
    GreaterOrEqual,
    /// Less than.
    LessThan,
    /// Less than or equal.
    LessOrEqual,
    /// SQL LIKE pattern (`%` and `_` wildcards).
    Like,
    /// Value in list.
    In,
    /// Identity test against `null`, `true` or `false`.
    Is,
    /// Field is NULL.
    IsNull,
    /// Field is not NULL.
    IsNotNull,
}

impl FilterOperator {
    /// Wire token for this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "eq",
            Self::NotEquals => "neq",
            Self::GreaterThan => "gt",
            Self::GreaterOrEqual => "gte",
            Self::LessThan => "lt",
            Self::LessOrEqual => "lte",
            Self::Like => "like",
            Self::In => "in",
            Self::Is => "is",
            Self::IsNull => "is_null",
            Self::IsNotNull => "not_null",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(Self::Equals),
            "neq" => Ok(Self::NotEquals),
            "gt" => Ok(Self::GreaterThan),
            "gte" => Ok(Self::GreaterOrEqual),
            "lt" => Ok(Self::LessThan),
            "lte" => Ok(Self::LessOrEqual),
            "like" => Ok(Self::Like),
            "in" => Ok(Self::In),
            "is" => Ok(Self::Is),
            "is_null" => Ok(Self::IsNull),
            "not_null" => Ok(Self::IsNotNull),
            other => Err(QueryError::UnsupportedOperator(other.to_string())),
        }
    }
}

impl TryFrom<String> for FilterOperator {
    type Error = QueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FilterOperator> for String {
    fn from(op: FilterOperator) -> Self {
        op.as_str().to_string()
    }
}

/// A single field constraint.
///
/// `value: None` means the constraint is undefined and is skipped when the
/// filter set is applied. `Some(Value::Null)` is an explicit null. On the
/// wire an undefined value is an absent `value` key and an explicit null is
/// `"value": null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Filter {
    pub operator: FilterOperator,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_value"
    )]
    pub value: Option<Value>,
}

/// A present `value` key is always defined, even when it holds `null`.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Filter {
    /// Create a filter with a defined value.
    pub fn new(operator: FilterOperator, value: impl Into<Value>) -> Self {
        Self {
            operator,
            value: Some(value.into()),
        }
    }

    /// Create a filter from an optional value; `None` imposes no constraint.
    pub fn optional<V: Into<Value>>(operator: FilterOperator, value: Option<V>) -> Self {
        Self {
            operator,
            value: value.map(Into::into),
        }
    }

    /// Whether this filter constrains the query.
    pub fn is_defined(&self) -> bool {
        self.value.is_some() || matches!(self.operator, FilterOperator::IsNull | FilterOperator::IsNotNull)
    }
}

/// Insertion-ordered mapping of camelCase field name to filter.
///
/// Inserting a field that is already present replaces its filter but keeps
/// its original position. Serializes as a JSON object keyed by field name;
/// deserializes from that object (entries kept in document order) or from
/// a list of `[field, filter]` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    entries: Vec<(String, Filter)>,
}

impl FilterSet {
    /// Create an empty filter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the filter for `field`.
    pub fn insert(&mut self, field: impl Into<String>, filter: Filter) {
        let field = field.into();
        if let Some(slot) = self.entries.iter_mut().find(|(f, _)| *f == field) {
            slot.1 = filter;
        } else {
            self.entries.push((field, filter));
        }
    }

    /// Builder form of [`FilterSet::insert`].
    pub fn with(mut self, field: impl Into<String>, filter: Filter) -> Self {
        self.insert(field, filter);
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Filter::new(FilterOperator::Equals, value))
    }

    pub fn neq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Filter::new(FilterOperator::NotEquals, value))
    }

    pub fn gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Filter::new(FilterOperator::GreaterThan, value))
    }

    pub fn gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Filter::new(FilterOperator::GreaterOrEqual, value))
    }

    pub fn lt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Filter::new(FilterOperator::LessThan, value))
    }

    pub fn lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Filter::new(FilterOperator::LessOrEqual, value))
    }

    pub fn like(self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.with(field, Filter::new(FilterOperator::Like, pattern.into()))
    }

    pub fn is_in<V: Into<Value>>(self, field: impl Into<String>, values: Vec<V>) -> Self {
        let list: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.with(field, Filter::new(FilterOperator::In, list))
    }

    pub fn is_null(self, field: impl Into<String>) -> Self {
        self.with(field, Filter::new(FilterOperator::IsNull, Value::Null))
    }

    pub fn is_not_null(self, field: impl Into<String>) -> Self {
        self.with(field, Filter::new(FilterOperator::IsNotNull, Value::Null))
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Filter)> {
        self.entries.iter().map(|(f, filter)| (f.as_str(), filter))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<(String, Filter)>> for FilterSet {
    fn from(entries: Vec<(String, Filter)>) -> Self {
        let mut set = Self::new();
        for (field, filter) in entries {
            set.insert(field, filter);
        }
        set
    }
}

impl From<FilterSet> for Vec<(String, Filter)> {
    fn from(set: FilterSet) -> Self {
        set.entries
    }
}

impl Serialize for FilterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, filter) in &self.entries {
            map.serialize_entry(field, filter)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FilterSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FilterSetVisitor)
    }
}

struct FilterSetVisitor;

impl<'de> Visitor<'de> for FilterSetVisitor {
    type Value = FilterSet;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of field filters or a list of [field, filter] pairs")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FilterSet, A::Error> {
        let mut set = FilterSet::new();
        while let Some((field, filter)) = access.next_entry::<String, Filter>()? {
            set.insert(field, filter);
        }
        Ok(set)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<FilterSet, A::Error> {
        let mut set = FilterSet::new();
        while let Some((field, filter)) = access.next_element::<(String, Filter)>()? {
            set.insert(field, filter);
        }
        Ok(set)
    }

    fn visit_unit<E: de::Error>(self) -> Result<FilterSet, E> {
        Ok(FilterSet::new())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Inclusive row window, zero-based.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowRange {
    pub from: u64,
    pub to: u64,
}

impl RowRange {
    pub fn new(from: u64, to: u64) -> Self {
        Self { from, to }
    }

    /// Number of rows covered by the window; saturates instead of overflowing.
    pub fn limit(&self) -> u64 {
        self.to.saturating_sub(self.from).saturating_add(1)
    }

    /// Reject windows that are reversed or whose row count does not fit in a `u64`.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.from > self.to {
            return Err(QueryError::InvalidRange(format!(
                "start {} is after end {}",
                self.from, self.to
            )));
        }
        if self.from == 0 && self.to == u64::MAX {
            return Err(QueryError::InvalidRange(
                "window covers more rows than can be counted".to_string(),
            ));
        }
        Ok(())
    }
}

/// Page-based windowing plus filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// 1-indexed page number.
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    #[serde(default)]
    pub filters: FilterSet,
}

impl Pagination {
    /// Pagination that only carries filters.
    pub fn filtered(filters: FilterSet) -> Self {
        Self {
            page: None,
            page_size: None,
            filters,
        }
    }

    /// Row window for the requested page, when both page and size are set.
    ///
    /// Fails when the window would start or end past `u64::MAX`.
    pub fn range(&self) -> Result<Option<RowRange>, QueryError> {
        let (Some(page), Some(size)) = (self.page, self.page_size) else {
            return Ok(None);
        };
        if size == 0 {
            return Ok(None);
        }
        let overflow =
            || QueryError::InvalidRange(format!("page {page} of size {size} is out of range"));
        let from = page.saturating_sub(1).checked_mul(size).ok_or_else(overflow)?;
        let to = from.checked_add(size - 1).ok_or_else(overflow)?;
        Ok(Some(RowRange::new(from, to)))
    }
}
