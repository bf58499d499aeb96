//! PostgREST client over HTTP.
//!
//! Talks to the `/rest/v1` endpoint of a hosted Postgres service (Supabase
//! dialect) using the publishable API key.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_RANGE, HeaderMap};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::client::{TableAction, TableClient, TableRequest, TableResponse};
use crate::error::{BackendError, BackendResult};

/// HTTP implementation of [`TableClient`].
#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl RestClient {
    /// Create a client for the project at `base_url`.
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> BackendResult<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| BackendError::Config(format!("invalid backend URL {base_url}: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join("rest/v1/")
            .map_err(|e| BackendError::Config(format!("invalid backend URL {base_url}: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BackendError::Http)?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
        })
    }

    fn table_url(&self, table: &str) -> BackendResult<Url> {
        self.endpoint
            .join(table)
            .map_err(|e| BackendError::Config(format!("invalid table name {table}: {e}")))
    }
}

#[async_trait]
impl TableClient for RestClient {
    async fn execute(&self, request: TableRequest) -> BackendResult<TableResponse> {
        let TableRequest { spec, action } = request;
        let url = self.table_url(&spec.table)?;
        let mut params = spec.to_query_pairs();
        let mut prefer: Vec<&str> = Vec::new();

        if spec.count.is_some() {
            prefer.push("count=exact");
        }

        let builder = match &action {
            TableAction::Select if spec.head => self.client.head(url),
            TableAction::Select => self.client.get(url),
            TableAction::Insert(rows) => {
                prefer.push("return=representation");
                self.client.post(url).json(rows)
            }
            TableAction::Update(patch) => {
                prefer.push("return=representation");
                self.client.patch(url).json(patch)
            }
            TableAction::Upsert { rows, on_conflict } => {
                params.push(("on_conflict".to_string(), on_conflict.clone()));
                prefer.push("resolution=merge-duplicates");
                prefer.push("return=representation");
                self.client.post(url).json(rows)
            }
            TableAction::Delete => self.client.delete(url),
        };

        let mut builder = builder
            .query(&params)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key);
        if !prefer.is_empty() {
            builder = builder.header("Prefer", prefer.join(","));
        }

        debug!(table = %spec.table, action = action.name(), "backend request");

        let response = builder.send().await?;
        let status = response.status();
        let count = parse_content_range(response.headers());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::remote(error_message(status, &body)));
        }

        if spec.head || status == StatusCode::NO_CONTENT {
            return Ok(TableResponse {
                rows: Vec::new(),
                count,
            });
        }

        let body = response.text().await?;
        let rows = if body.trim().is_empty() {
            Vec::new()
        } else {
            match serde_json::from_str::<Value>(&body)? {
                Value::Array(rows) => rows,
                Value::Null => Vec::new(),
                single => vec![single],
            }
        };

        Ok(TableResponse { rows, count })
    }
}

/// Total from a `Content-Range: 0-24/3573` header; `*` totals are unknown.
fn parse_content_range(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(CONTENT_RANGE)?.to_str().ok()?;
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}

/// Prefer the `message` field of a PostgREST error body.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("request failed with status {status}")
            } else {
                body.trim().to_string()
            }
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn endpoint_appends_rest_path() {
        let client = RestClient::new("https://abc.supabase.co", "key", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.table_url("offer_pages").unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/offer_pages"
        );

        let client = RestClient::new("http://localhost:54321/proxy", "key", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.table_url("offer_items").unwrap().as_str(),
            "http://localhost:54321/proxy/rest/v1/offer_items"
        );
    }

    #[test]
    fn invalid_url_is_config_error() {
        let err = RestClient::new("not a url", "key", Duration::from_secs(5))
            .err()
            .unwrap();
        assert!(matches!(err, BackendError::Config(_)));
    }

    #[test]
    fn content_range_totals() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_RANGE, HeaderValue::from_static("0-24/3573"));
        assert_eq!(parse_content_range(&headers), Some(3573));

        headers.insert(CONTENT_RANGE, HeaderValue::from_static("*/0"));
        assert_eq!(parse_content_range(&headers), Some(0));

        headers.insert(CONTENT_RANGE, HeaderValue::from_static("0-9/*"));
        assert_eq!(parse_content_range(&headers), None);
    }

    #[test]
    fn error_message_prefers_message_field() {
        let body = r#"{"code":"42P01","message":"relation \"nope\" does not exist"}"#;
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, body),
            "relation \"nope\" does not exist"
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, ""),
            "request failed with status 502 Bad Gateway"
        );
    }
}
