//! Immutable query specification.
//!
//! A [`QuerySpec`] records everything about a fetch (table, projection,
//! predicates, ordering, row window, count mode) as plain data. Nothing is
//! sent anywhere until a [`TableClient`](crate::backend::TableClient)
//! executes it, so specs can be built and inspected without a backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{FilterOperator, FilterSet, RowRange, SortDirection};
use crate::error::QueryError;
use crate::naming::to_snake_key;

/// A single column predicate; the column is already in remote (snake_case) form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub operator: FilterOperator,
    pub value: Value,
}

/// Ordering on one remote column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

/// Row-count mode requested alongside a select.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CountMode {
    Exact,
}

/// Complete description of one remote fetch against a single table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuerySpec {
    pub table: String,
    /// Projection, in the remote select syntax (`*`, `*, perks(*)`).
    pub select: String,
    pub predicates: Vec<Predicate>,
    pub order: Option<OrderBy>,
    pub range: Option<RowRange>,
    pub count: Option<CountMode>,
    /// Only the count is wanted; no rows are transferred.
    pub head: bool,
}

impl QuerySpec {
    /// Select every column of `table`.
    pub fn from_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select: "*".to_string(),
            predicates: Vec::new(),
            order: None,
            range: None,
            count: None,
            head: false,
        }
    }

    /// Embed related tables in each row, e.g. `membership_perks(*)`.
    pub fn embed(mut self, joins: &str) -> Self {
        let joins = joins.trim();
        if !joins.is_empty() {
            self.select = format!("*, {joins}");
        }
        self
    }

    /// Add a predicate on a column already in remote form.
    pub fn filter(mut self, column: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        self.predicates.push(Predicate {
            column: column.into(),
            operator,
            value,
        });
        self
    }

    /// Equality on a remote column.
    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOperator::Equals, value.into())
    }

    /// Membership on a remote column.
    pub fn is_in(self, column: impl Into<String>, values: Vec<Value>) -> Self {
        self.filter(column, FilterOperator::In, Value::Array(values))
    }

    /// Apply a camelCase filter set.
    ///
    /// Entries are visited in insertion order. Undefined values are skipped,
    /// field names are converted to the remote convention, and value shapes
    /// are checked against the operator.
    pub fn with_filters(mut self, filters: &FilterSet) -> Result<Self, QueryError> {
        for (field, filter) in filters.iter() {
            if !filter.is_defined() {
                continue;
            }
            let column = to_snake_key(field);
            let value = filter.value.clone().unwrap_or(Value::Null);
            let value = match filter.operator {
                FilterOperator::IsNull | FilterOperator::IsNotNull => Value::Null,
                FilterOperator::In => {
                    if !value.is_array() {
                        return Err(invalid(field, "`in` requires a list of values"));
                    }
                    value
                }
                FilterOperator::Is => {
                    if !(value.is_null() || value.is_boolean()) {
                        return Err(invalid(field, "`is` accepts only null, true or false"));
                    }
                    value
                }
                FilterOperator::Like => {
                    if !value.is_string() {
                        return Err(invalid(field, "`like` requires a string pattern"));
                    }
                    value
                }
                _ => value,
            };
            self.predicates.push(Predicate {
                column,
                operator: filter.operator,
                value,
            });
        }
        Ok(self)
    }

    /// Order by a camelCase field.
    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.order = Some(OrderBy {
            column: to_snake_key(field),
            direction,
        });
        self
    }

    /// Restrict to an inclusive row window.
    pub fn range(mut self, range: RowRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Request an exact row count without row data.
    pub fn count_only(mut self) -> Self {
        self.count = Some(CountMode::Exact);
        self.head = true;
        self
    }

    /// Encode as PostgREST query parameters.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.select.clone())];

        for p in &self.predicates {
            pairs.push((p.column.clone(), encode_predicate(p)));
        }

        if let Some(order) = &self.order {
            let dir = match order.direction {
                SortDirection::Asc => "asc",
                SortDirection::Desc => "desc",
            };
            pairs.push(("order".to_string(), format!("{}.{dir}", order.column)));
        }

        if let Some(range) = &self.range {
            pairs.push(("offset".to_string(), range.from.to_string()));
            pairs.push(("limit".to_string(), range.limit().to_string()));
        }

        pairs
    }
}

fn invalid(field: &str, reason: &str) -> QueryError {
    QueryError::InvalidFilterValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn encode_predicate(p: &Predicate) -> String {
    match p.operator {
        FilterOperator::IsNull => "is.null".to_string(),
        FilterOperator::IsNotNull => "not.is.null".to_string(),
        FilterOperator::In => {
            let items: Vec<String> = p
                .value
                .as_array()
                .map(|values| values.iter().map(encode_list_item).collect())
                .unwrap_or_default();
            format!("in.({})", items.join(","))
        }
        op => format!("{}.{}", op.as_str(), encode_scalar(&p.value)),
    }
}

fn encode_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Quote list items containing PostgREST reserved characters.
fn encode_list_item(value: &Value) -> String {
    let raw = encode_scalar(value);
    let reserved = raw
        .chars()
        .any(|c| matches!(c, ',' | '(' | ')' | '"' | '\\' | ':') || c.is_whitespace());
    if reserved {
        format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        raw
    }
}
