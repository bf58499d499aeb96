//! In-process table client.
//!
//! Evaluates [`QuerySpec`]s against rows held in memory, with the same
//! operator semantics as the remote store: comparisons against NULL never
//! match, LIKE supports `%` and `_`, sorts are stable. Every request is
//! recorded so tests can assert how many remote calls an operation made.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use super::client::{TableAction, TableClient, TableRequest, TableResponse};
use crate::error::{BackendError, BackendResult};
use crate::query::{FilterOperator, Predicate, QuerySpec, SortDirection};

type Row = Map<String, Value>;

/// In-memory implementation of [`TableClient`].
#[derive(Default)]
pub struct MemoryClient {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    requests: Mutex<Vec<TableRequest>>,
    next_failure: Mutex<Option<String>>,
    failing_tables: Mutex<HashMap<String, String>>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rows (remote, snake_case form) to `table`. Non-object values are ignored.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        let mut tables = self.tables.write();
        let stored = tables.entry(table.to_string()).or_default();
        stored.extend(rows.into_iter().filter_map(|row| match row {
            Value::Object(map) => Some(map),
            _ => None,
        }));
    }

    /// Current rows of `table`.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .read()
            .get(table)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    /// Make the next request fail with a remote error carrying `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        *self.next_failure.lock() = Some(message.into());
    }

    /// Make every request against `table` fail with a remote error.
    pub fn fail_table(&self, table: &str, message: impl Into<String>) {
        self.failing_tables
            .lock()
            .insert(table.to_string(), message.into());
    }

    /// Number of requests executed so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    /// Every request executed so far, in order.
    pub fn requests(&self) -> Vec<TableRequest> {
        self.requests.lock().clone()
    }

    fn select(&self, spec: &QuerySpec) -> TableResponse {
        let tables = self.tables.read();
        let mut matched: Vec<Row> = tables
            .get(&spec.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches_all(row, &spec.predicates))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &spec.order {
            matched.sort_by(|a, b| {
                let ord = compare_nullable(a.get(&order.column), b.get(&order.column));
                match order.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }

        let total = matched.len() as u64;
        if let Some(range) = &spec.range {
            let from = usize::try_from(range.from).unwrap_or(usize::MAX);
            let limit = usize::try_from(range.limit()).unwrap_or(usize::MAX);
            matched = matched.into_iter().skip(from).take(limit).collect();
        }

        TableResponse {
            rows: if spec.head {
                Vec::new()
            } else {
                matched.into_iter().map(Value::Object).collect()
            },
            count: spec.count.map(|_| total),
        }
    }

    fn insert(&self, table: &str, rows: &[Value]) -> BackendResult<TableResponse> {
        let mut tables = self.tables.write();
        let stored = tables.entry(table.to_string()).or_default();
        let mut echoed = Vec::with_capacity(rows.len());
        for row in rows {
            let mut row = as_row(row)?;
            if !row.contains_key("id") {
                row.insert("id".to_string(), Value::from(next_serial(stored)));
            }
            stored.push(row.clone());
            echoed.push(Value::Object(row));
        }
        Ok(TableResponse {
            rows: echoed,
            count: None,
        })
    }

    fn update(&self, spec: &QuerySpec, patch: &Value) -> BackendResult<TableResponse> {
        let patch = as_row(patch)?;
        let mut tables = self.tables.write();
        let mut echoed = Vec::new();
        if let Some(rows) = tables.get_mut(&spec.table) {
            for row in rows.iter_mut().filter(|row| matches_all(row, &spec.predicates)) {
                for (k, v) in &patch {
                    row.insert(k.clone(), v.clone());
                }
                echoed.push(Value::Object(row.clone()));
            }
        }
        Ok(TableResponse {
            rows: echoed,
            count: None,
        })
    }

    fn upsert(&self, table: &str, rows: &[Value], on_conflict: &str) -> BackendResult<TableResponse> {
        let keys: Vec<&str> = on_conflict.split(',').map(str::trim).collect();
        let mut tables = self.tables.write();
        let stored = tables.entry(table.to_string()).or_default();
        let mut echoed = Vec::with_capacity(rows.len());
        for row in rows {
            let incoming = as_row(row)?;
            let existing = stored.iter_mut().find(|candidate| {
                keys.iter().all(|k| {
                    matches!(
                        (candidate.get(*k), incoming.get(*k)),
                        (Some(a), Some(b)) if compare(a, b) == Some(Ordering::Equal)
                    )
                })
            });
            match existing {
                Some(target) => {
                    for (k, v) in &incoming {
                        target.insert(k.clone(), v.clone());
                    }
                    echoed.push(Value::Object(target.clone()));
                }
                None => {
                    let mut fresh = incoming;
                    if !fresh.contains_key("id") {
                        fresh.insert("id".to_string(), Value::from(next_serial(stored)));
                    }
                    stored.push(fresh.clone());
                    echoed.push(Value::Object(fresh));
                }
            }
        }
        Ok(TableResponse {
            rows: echoed,
            count: None,
        })
    }

    fn delete(&self, spec: &QuerySpec) -> TableResponse {
        let mut tables = self.tables.write();
        if let Some(rows) = tables.get_mut(&spec.table) {
            rows.retain(|row| !matches_all(row, &spec.predicates));
        }
        TableResponse::default()
    }
}

#[async_trait]
impl TableClient for MemoryClient {
    async fn execute(&self, request: TableRequest) -> BackendResult<TableResponse> {
        debug!(table = %request.spec.table, action = request.action.name(), "memory request");
        self.requests.lock().push(request.clone());

        if let Some(message) = self.next_failure.lock().take() {
            return Err(BackendError::remote(message));
        }
        if let Some(message) = self.failing_tables.lock().get(&request.spec.table) {
            return Err(BackendError::remote(message.clone()));
        }

        let TableRequest { spec, action } = request;
        match &action {
            TableAction::Select => Ok(self.select(&spec)),
            TableAction::Insert(rows) => self.insert(&spec.table, rows),
            TableAction::Update(patch) => self.update(&spec, patch),
            TableAction::Upsert { rows, on_conflict } => self.upsert(&spec.table, rows, on_conflict),
            TableAction::Delete => Ok(self.delete(&spec)),
        }
    }
}

fn as_row(value: &Value) -> BackendResult<Row> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        other => Err(BackendError::remote(format!(
            "expected a JSON object row, got {other}"
        ))),
    }
}

fn next_serial(rows: &[Row]) -> i64 {
    rows.iter()
        .filter_map(|row| row.get("id").and_then(Value::as_i64))
        .max()
        .unwrap_or(0)
        + 1
}

fn matches_all(row: &Row, predicates: &[Predicate]) -> bool {
    predicates.iter().all(|p| matches(row, p))
}

fn matches(row: &Row, predicate: &Predicate) -> bool {
    let field = row.get(&predicate.column).unwrap_or(&Value::Null);
    let target = &predicate.value;
    match predicate.operator {
        FilterOperator::Equals => compare(field, target) == Some(Ordering::Equal),
        FilterOperator::NotEquals => matches!(compare(field, target), Some(o) if o != Ordering::Equal),
        FilterOperator::GreaterThan => compare(field, target) == Some(Ordering::Greater),
        FilterOperator::GreaterOrEqual => {
            matches!(compare(field, target), Some(Ordering::Greater | Ordering::Equal))
        }
        FilterOperator::LessThan => compare(field, target) == Some(Ordering::Less),
        FilterOperator::LessOrEqual => {
            matches!(compare(field, target), Some(Ordering::Less | Ordering::Equal))
        }
        FilterOperator::Like => match (field.as_str(), target.as_str()) {
            (Some(text), Some(pattern)) => like_regex(pattern).is_some_and(|re| re.is_match(text)),
            _ => false,
        },
        FilterOperator::In => target
            .as_array()
            .is_some_and(|values| values.iter().any(|v| compare(field, v) == Some(Ordering::Equal))),
        FilterOperator::Is => match target {
            Value::Null => field.is_null(),
            Value::Bool(b) => field.as_bool() == Some(*b),
            _ => false,
        },
        FilterOperator::IsNull => field.is_null(),
        FilterOperator::IsNotNull => !field.is_null(),
    }
}

/// Compare two JSON scalars the way a typed column would; NULL compares to nothing.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::String(y)) => x.as_f64()?.partial_cmp(&y.parse::<f64>().ok()?),
        (Value::String(x), Value::Number(y)) => x.parse::<f64>().ok()?.partial_cmp(&y.as_f64()?),
        (Value::Bool(x), Value::String(y)) => Some(x.cmp(&y.parse::<bool>().ok()?)),
        (Value::String(x), Value::Bool(y)) => Some(x.parse::<bool>().ok()?.cmp(y)),
        (x, y) if x == y => Some(Ordering::Equal),
        _ => None,
    }
}

/// Ordering for sorts: NULLs last, incomparable values keep their order.
fn compare_nullable(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare(a, b).unwrap_or(Ordering::Equal),
    }
}

fn like_regex(pattern: &str) -> Option<Regex> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    for ch in pattern.chars() {
        match ch {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::query::{FilterSet, RowRange};
    use serde_json::json;

    fn client() -> MemoryClient {
        let client = MemoryClient::new();
        client.seed(
            "offer_items",
            vec![
                json!({ "id": 1, "title": "Sesja one-shot", "kind": "core", "position": 2, "slug": null }),
                json!({ "id": 2, "title": "Kości", "kind": "material", "position": 1, "slug": "kosci" }),
                json!({ "id": 3, "title": "Sesja kampanii", "kind": "core", "position": 1, "slug": "kampania" }),
            ],
        );
        client
    }

    async fn select(client: &MemoryClient, spec: QuerySpec) -> Vec<i64> {
        client
            .execute(TableRequest::select(spec))
            .await
            .unwrap()
            .rows
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn filters_and_stable_sort() {
        let client = client();
        let spec = QuerySpec::from_table("offer_items")
            .with_filters(&FilterSet::new().eq("kind", "core"))
            .unwrap()
            .order_by("position", SortDirection::Asc);
        assert_eq!(select(&client, spec).await, vec![3, 1]);

        let spec = QuerySpec::from_table("offer_items").order_by("position", SortDirection::Asc);
        assert_eq!(select(&client, spec).await, vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn like_in_and_null_operators() {
        let client = client();
        let like = QuerySpec::from_table("offer_items")
            .with_filters(&FilterSet::new().like("title", "Sesja%"))
            .unwrap();
        assert_eq!(select(&client, like).await, vec![1, 3]);

        let within = QuerySpec::from_table("offer_items").is_in("id", vec![json!(3), json!("2")]);
        assert_eq!(select(&client, within).await, vec![2, 3]);

        let null_slug = QuerySpec::from_table("offer_items")
            .with_filters(&FilterSet::new().is_null("slug"))
            .unwrap();
        assert_eq!(select(&client, null_slug).await, vec![1]);

        let neq = QuerySpec::from_table("offer_items")
            .with_filters(&FilterSet::new().neq("slug", "kosci"))
            .unwrap();
        // NULL slug never satisfies a comparison
        assert_eq!(select(&client, neq).await, vec![3]);
    }

    #[tokio::test]
    async fn range_and_count() {
        let client = client();
        let spec = QuerySpec::from_table("offer_items")
            .order_by("id", SortDirection::Desc)
            .range(RowRange::new(1, 5));
        assert_eq!(select(&client, spec).await, vec![2, 1]);

        let count = client
            .execute(TableRequest::select(
                QuerySpec::from_table("offer_items").count_only(),
            ))
            .await
            .unwrap();
        assert!(count.rows.is_empty());
        assert_eq!(count.count, Some(3));
    }

    #[tokio::test]
    async fn insert_assigns_serial_ids() {
        let client = client();
        let response = client
            .execute(TableRequest::new(
                QuerySpec::from_table("offer_items"),
                TableAction::Insert(vec![json!({ "title": "Mapa" })]),
            ))
            .await
            .unwrap();
        assert_eq!(response.rows[0]["id"], json!(4));
        assert_eq!(client.rows("offer_items").len(), 4);
    }

    #[tokio::test]
    async fn upsert_merges_on_conflict() {
        let client = client();
        client
            .execute(TableRequest::new(
                QuerySpec::from_table("offer_items"),
                TableAction::Upsert {
                    rows: vec![json!({ "slug": "kosci", "title": "Kości K20" })],
                    on_conflict: "slug".to_string(),
                },
            ))
            .await
            .unwrap();
        let rows = client.rows("offer_items");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1]["title"], json!("Kości K20"));
        assert_eq!(rows[1]["kind"], json!("material"));
    }

    #[tokio::test]
    async fn injected_failure_is_reported_once() {
        let client = client();
        client.fail_next("permission denied for table offer_items");
        let err = client
            .execute(TableRequest::select(QuerySpec::from_table("offer_items")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "permission denied for table offer_items");

        assert!(
            client
                .execute(TableRequest::select(QuerySpec::from_table("offer_items")))
                .await
                .is_ok()
        );
        assert_eq!(client.calls(), 2);
    }

    #[test]
    fn like_pattern_escapes_regex_syntax() {
        let re = like_regex("a.b_%").unwrap();
        assert!(re.is_match("a.bX tail"));
        assert!(!re.is_match("aXbX"));
    }
}
