//! Remote tabular client abstraction.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BackendResult;
use crate::query::QuerySpec;

/// What to do with the rows a [`QuerySpec`] selects.
#[derive(Debug, Clone, PartialEq)]
pub enum TableAction {
    Select,
    /// Insert rows (snake_case keys) and echo them back.
    Insert(Vec<Value>),
    /// Patch every matching row and echo the result.
    Update(Value),
    /// Insert or merge on the given conflict column(s).
    Upsert { rows: Vec<Value>, on_conflict: String },
    Delete,
}

impl TableAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert(_) => "insert",
            Self::Update(_) => "update",
            Self::Upsert { .. } => "upsert",
            Self::Delete => "delete",
        }
    }
}

/// One request against a named table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRequest {
    pub spec: QuerySpec,
    pub action: TableAction,
}

impl TableRequest {
    pub fn select(spec: QuerySpec) -> Self {
        Self {
            spec,
            action: TableAction::Select,
        }
    }

    pub fn new(spec: QuerySpec, action: TableAction) -> Self {
        Self { spec, action }
    }
}

/// Successful outcome of a table request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableResponse {
    /// Rows in remote (snake_case) form.
    pub rows: Vec<Value>,
    /// Total matching rows, when a count was requested.
    pub count: Option<u64>,
}

/// Remote tabular data source.
///
/// Implementations translate a [`TableRequest`] into provider calls and
/// report provider failures as [`BackendError::Remote`](crate::error::BackendError::Remote).
#[async_trait]
pub trait TableClient: Send + Sync {
    async fn execute(&self, request: TableRequest) -> BackendResult<TableResponse>;
}
