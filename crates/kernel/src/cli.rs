//! Operator command line.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::backend::{Backend, FetchOptions, RestClient};
use crate::config::Config;
use crate::content::OfferService;
use crate::error::QueryError;
use crate::query::{Filter, FilterOperator, FilterSet, Pagination, SortDirection};

/// Guildhall content tools.
#[derive(Debug, Parser)]
#[command(name = "guildhall", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the assembled offer page for a slug as JSON.
    OfferPage { slug: String },

    /// List rows of a table as JSON.
    List {
        table: String,

        /// camelCase field to sort by.
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending.
        #[arg(long)]
        desc: bool,

        /// 1-indexed page.
        #[arg(long, requires = "page_size")]
        page: Option<u64>,

        #[arg(long, requires = "page")]
        page_size: Option<u64>,

        /// Embedded relations, e.g. `membership_perks(*)`.
        #[arg(long)]
        joins: Option<String>,

        /// Filter as `field=op:value`, e.g. `isActive=eq:true`.
        #[arg(long = "filter", value_parser = parse_filter_arg)]
        filters: Vec<(String, Filter)>,
    },

    /// Count rows of a table.
    Count {
        table: String,

        #[arg(long = "filter", value_parser = parse_filter_arg)]
        filters: Vec<(String, Filter)>,
    },
}

/// Parse `field=op:value` (or `field=op` for the null operators).
///
/// The value is read as JSON when it parses, otherwise as a plain string.
pub fn parse_filter_arg(arg: &str) -> Result<(String, Filter), QueryError> {
    let malformed = || QueryError::InvalidFilterValue {
        field: arg.to_string(),
        reason: "expected field=op:value".to_string(),
    };

    let (field, rest) = arg.split_once('=').ok_or_else(malformed)?;
    if field.trim().is_empty() {
        return Err(malformed());
    }
    let (op, raw) = match rest.split_once(':') {
        Some((op, raw)) => (op, Some(raw)),
        None => (rest, None),
    };
    let operator: FilterOperator = op.trim().parse()?;

    let value = match (operator, raw) {
        (FilterOperator::IsNull | FilterOperator::IsNotNull, _) => Some(Value::Null),
        (_, None) => return Err(malformed()),
        (_, Some(raw)) => Some(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))),
    };

    Ok((field.trim().to_string(), Filter { operator, value }))
}

fn filter_set(entries: Vec<(String, Filter)>) -> FilterSet {
    FilterSet::from(entries)
}

/// Execute `cli` against the configured backend.
pub async fn run(cli: Cli, config: &Config) -> Result<()> {
    let client = RestClient::new(
        &config.supabase_url,
        config.supabase_publishable_key.clone(),
        config.timeout(),
    )
    .context("failed to create backend client")?;
    let backend = Backend::with_config(Arc::new(client), config.backend());

    let output = match cli.command {
        Command::OfferPage { slug } => {
            let vm = OfferService::new(backend)
                .page_vm_by_slug(&slug)
                .await
                .with_context(|| format!("failed to load offer page {slug}"))?;
            serde_json::to_value(vm)?
        }
        Command::List {
            table,
            sort,
            desc,
            page,
            page_size,
            joins,
            filters,
        } => {
            let options = FetchOptions {
                joins,
                sort_by: sort,
                sort_order: if desc { SortDirection::Desc } else { SortDirection::Asc },
                pagination: Some(Pagination {
                    page,
                    page_size,
                    filters: filter_set(filters),
                }),
                range: None,
            };
            let rows: Vec<Value> = backend
                .get_all(&table, &options)
                .await
                .with_context(|| format!("failed to list {table}"))?;
            Value::Array(rows)
        }
        Command::Count { table, filters } => {
            let count = backend
                .get_count(&table, Some(&filter_set(filters)))
                .await
                .with_context(|| format!("failed to count {table}"))?;
            Value::from(count)
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
