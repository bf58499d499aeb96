//! Generic table access with naming translation.
//!
//! [`Backend`] is the only place records cross between the camelCase
//! in-memory model and the snake_case remote store. Callers work with typed
//! records and camelCase filter sets; every request leaves here as a
//! [`QuerySpec`] with remote column names.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::client::{TableAction, TableClient, TableRequest, TableResponse};
use crate::error::{BackendError, BackendResult};
use crate::naming::{to_camel_case, to_snake_case, to_snake_key};
use crate::query::{FilterSet, Pagination, QuerySpec, RowRange, SortDirection};

/// Rows fetched when a list query carries no explicit window.
pub const DEFAULT_ROW_LIMIT: u64 = 1000;

/// Tunables for [`Backend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendConfig {
    /// Size of the implicit `0..limit` window applied to unpaged list queries.
    pub default_row_limit: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            default_row_limit: DEFAULT_ROW_LIMIT,
        }
    }
}

/// Options for [`Backend::get_all`].
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Embedded relations, e.g. `membership_perks(*)`.
    pub joins: Option<String>,
    /// camelCase field to order by.
    pub sort_by: Option<String>,
    pub sort_order: SortDirection,
    pub pagination: Option<Pagination>,
    /// Explicit row window; takes precedence over page/page_size.
    pub range: Option<RowRange>,
}

impl FetchOptions {
    /// Options with only filters set.
    pub fn filtered(filters: FilterSet) -> Self {
        Self {
            pagination: Some(Pagination::filtered(filters)),
            ..Default::default()
        }
    }

    pub fn sorted(mut self, field: impl Into<String>, order: SortDirection) -> Self {
        self.sort_by = Some(field.into());
        self.sort_order = order;
        self
    }

    pub fn with_joins(mut self, joins: impl Into<String>) -> Self {
        self.joins = Some(joins.into());
        self
    }

    pub fn with_range(mut self, range: RowRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_page(mut self, page: u64, page_size: u64) -> Self {
        let pagination = self.pagination.get_or_insert_with(Pagination::default);
        pagination.page = Some(page);
        pagination.page_size = Some(page_size);
        self
    }
}

/// Target of a delete.
#[derive(Debug, Clone)]
pub enum DeleteTarget {
    /// Remove the row with this id.
    Id(Value),
    /// Remove every row matching the filters.
    Filters(FilterSet),
}

/// Typed CRUD access to named tables.
#[derive(Clone)]
pub struct Backend {
    client: Arc<dyn TableClient>,
    config: BackendConfig,
}

impl Backend {
    /// Create a backend with default settings.
    pub fn new(client: Arc<dyn TableClient>) -> Self {
        Self::with_config(client, BackendConfig::default())
    }

    pub fn with_config(client: Arc<dyn TableClient>, config: BackendConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    // ==========================
    // READ
    // ==========================

    /// Fetch a list of records.
    ///
    /// Windowing: `range` if given, otherwise page/page_size from the
    /// pagination, otherwise the first `default_row_limit` rows.
    pub async fn get_all<T: DeserializeOwned>(
        &self,
        table: &str,
        options: &FetchOptions,
    ) -> BackendResult<Vec<T>> {
        let mut spec = QuerySpec::from_table(table);
        if let Some(joins) = &options.joins {
            spec = spec.embed(joins);
        }
        if let Some(filters) = options.pagination.as_ref().map(|p| &p.filters) {
            spec = spec.with_filters(filters)?;
        }
        if let Some(sort_by) = &options.sort_by {
            spec = spec.order_by(sort_by, options.sort_order);
        }

        let window = match (options.range, &options.pagination) {
            (Some(range), _) => range,
            (None, Some(pagination)) => pagination.range()?.unwrap_or_else(|| self.default_range()),
            (None, None) => self.default_range(),
        };
        window.validate()?;
        spec = spec.range(window);

        let response = self.run(TableRequest::select(spec)).await?;
        decode_rows(response.rows)
    }

    /// Fetch one record by `id`, or `None` if absent.
    pub async fn get_by_id<T: DeserializeOwned>(
        &self,
        table: &str,
        id: impl Into<Value>,
    ) -> BackendResult<Option<T>> {
        self.maybe_single(QuerySpec::from_table(table).eq("id", id))
            .await
    }

    /// Fetch one record by `slug`, or `None` if absent.
    pub async fn get_by_slug<T: DeserializeOwned>(
        &self,
        table: &str,
        slug: &str,
    ) -> BackendResult<Option<T>> {
        self.maybe_single(QuerySpec::from_table(table).eq("slug", slug))
            .await
    }

    /// Fetch one record matching every camelCase field by equality.
    pub async fn get_one_by_fields<T: DeserializeOwned>(
        &self,
        table: &str,
        fields: &[(&str, Value)],
    ) -> BackendResult<Option<T>> {
        let spec = fields
            .iter()
            .fold(QuerySpec::from_table(table), |spec, (field, value)| {
                spec.eq(to_snake_key(field), value.clone())
            });
        self.maybe_single(spec).await
    }

    /// Count rows matching `filters` without transferring them.
    pub async fn get_count(&self, table: &str, filters: Option<&FilterSet>) -> BackendResult<u64> {
        let mut spec = QuerySpec::from_table(table).count_only();
        if let Some(filters) = filters {
            spec = spec.with_filters(filters)?;
        }
        let response = self.run(TableRequest::select(spec)).await?;
        Ok(response.count.unwrap_or(0))
    }

    /// Fetch every record whose `id` is in `ids`. An empty set makes no call.
    pub async fn get_by_ids<T, I>(&self, table: &str, ids: &[I]) -> BackendResult<Vec<T>>
    where
        T: DeserializeOwned,
        I: Clone + Into<Value>,
    {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Value> = ids.iter().cloned().map(Into::into).collect();
        let response = self
            .run(TableRequest::select(QuerySpec::from_table(table).is_in("id", ids)))
            .await?;
        decode_rows(response.rows)
    }

    // ==========================
    // WRITE
    // ==========================

    /// Insert one record and return the stored version.
    pub async fn create<T: Serialize + DeserializeOwned>(&self, table: &str, data: &T) -> BackendResult<T> {
        let row = encode_row(data)?;
        let response = self
            .run(TableRequest::new(
                QuerySpec::from_table(table),
                TableAction::Insert(vec![row]),
            ))
            .await?;
        single(table, response)
    }

    /// Insert many records. An empty batch makes no call.
    pub async fn create_many<T: Serialize + DeserializeOwned>(
        &self,
        table: &str,
        data: &[T],
    ) -> BackendResult<Vec<T>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }
        let rows = data.iter().map(encode_row).collect::<BackendResult<Vec<_>>>()?;
        let response = self
            .run(TableRequest::new(
                QuerySpec::from_table(table),
                TableAction::Insert(rows),
            ))
            .await?;
        decode_rows(response.rows)
    }

    /// Patch the record with `id` and return the stored version.
    ///
    /// `patch` is any serializable partial record with camelCase keys.
    pub async fn update<T, P>(&self, table: &str, id: impl Into<Value>, patch: &P) -> BackendResult<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let patch = encode_row(patch)?;
        let response = self
            .run(TableRequest::new(
                QuerySpec::from_table(table).eq("id", id),
                TableAction::Update(patch),
            ))
            .await?;
        single(table, response)
    }

    /// Insert or merge one record on `conflict_target` (remote column list).
    pub async fn upsert<T: Serialize + DeserializeOwned>(
        &self,
        table: &str,
        data: &T,
        conflict_target: &str,
    ) -> BackendResult<T> {
        let row = encode_row(data)?;
        let response = self
            .run(TableRequest::new(
                QuerySpec::from_table(table),
                TableAction::Upsert {
                    rows: vec![row],
                    on_conflict: conflict_target.to_string(),
                },
            ))
            .await?;
        single(table, response)
    }

    /// Insert or merge many records. An empty batch makes no call.
    pub async fn upsert_many<T: Serialize + DeserializeOwned>(
        &self,
        table: &str,
        data: &[T],
        conflict_target: &str,
    ) -> BackendResult<Vec<T>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }
        let rows = data.iter().map(encode_row).collect::<BackendResult<Vec<_>>>()?;
        let response = self
            .run(TableRequest::new(
                QuerySpec::from_table(table),
                TableAction::Upsert {
                    rows,
                    on_conflict: conflict_target.to_string(),
                },
            ))
            .await?;
        decode_rows(response.rows)
    }

    /// Delete by id or by filters.
    pub async fn delete(&self, table: &str, target: DeleteTarget) -> BackendResult<()> {
        let spec = match target {
            DeleteTarget::Id(id) => QuerySpec::from_table(table).eq("id", id),
            DeleteTarget::Filters(filters) => QuerySpec::from_table(table).with_filters(&filters)?,
        };
        self.run(TableRequest::new(spec, TableAction::Delete)).await?;
        Ok(())
    }

    fn default_range(&self) -> RowRange {
        RowRange::new(0, self.config.default_row_limit.saturating_sub(1))
    }

    async fn maybe_single<T: DeserializeOwned>(&self, spec: QuerySpec) -> BackendResult<Option<T>> {
        let table = spec.table.clone();
        let response = self.run(TableRequest::select(spec)).await?;
        let mut rows = response.rows.into_iter();
        match (rows.next(), rows.next()) {
            (None, _) => Ok(None),
            (Some(row), None) => Ok(Some(decode_row(row)?)),
            (Some(_), Some(_)) => Err(BackendError::MultipleRows { table }),
        }
    }

    async fn run(&self, request: TableRequest) -> BackendResult<TableResponse> {
        let table = request.spec.table.clone();
        let action = request.action.name();
        let response = self.client.execute(request).await?;
        debug!(%table, action, rows = response.rows.len(), "backend response");
        Ok(response)
    }
}

fn encode_row<T: Serialize + ?Sized>(record: &T) -> BackendResult<Value> {
    Ok(to_snake_case(serde_json::to_value(record)?))
}

fn decode_row<T: DeserializeOwned>(row: Value) -> BackendResult<T> {
    Ok(serde_json::from_value(to_camel_case(row))?)
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> BackendResult<Vec<T>> {
    rows.into_iter().map(decode_row).collect()
}

fn single<T: DeserializeOwned>(table: &str, response: TableResponse) -> BackendResult<T> {
    let mut rows = response.rows.into_iter();
    match (rows.next(), rows.next()) {
        (Some(row), None) => decode_row(row),
        (None, _) => Err(BackendError::MissingRow {
            table: table.to_string(),
        }),
        (Some(_), Some(_)) => Err(BackendError::MultipleRows {
            table: table.to_string(),
        }),
    }
}
