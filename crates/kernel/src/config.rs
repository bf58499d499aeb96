//! Configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::backend::{BackendConfig, DEFAULT_ROW_LIMIT};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted Postgres project.
    pub supabase_url: String,

    /// Publishable (anon) API key.
    pub supabase_publishable_key: String,

    /// Rows fetched by unpaged list queries (default: 1000).
    pub default_row_limit: u64,

    /// HTTP request timeout in seconds (default: 30).
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let supabase_url =
            env::var("SUPABASE_URL").context("SUPABASE_URL environment variable is required")?;

        let supabase_publishable_key = env::var("SUPABASE_PUBLISHABLE_KEY")
            .context("SUPABASE_PUBLISHABLE_KEY environment variable is required")?;

        let default_row_limit = env::var("BACKEND_DEFAULT_ROW_LIMIT")
            .unwrap_or_else(|_| DEFAULT_ROW_LIMIT.to_string())
            .parse()
            .context("BACKEND_DEFAULT_ROW_LIMIT must be a valid u64")?;
        if default_row_limit == 0 {
            anyhow::bail!("BACKEND_DEFAULT_ROW_LIMIT must be greater than zero");
        }

        let timeout_secs = env::var("BACKEND_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("BACKEND_TIMEOUT_SECS must be a valid u64")?;

        Ok(Self {
            supabase_url,
            supabase_publishable_key,
            default_row_limit,
            timeout_secs,
        })
    }

    pub fn backend(&self) -> BackendConfig {
        BackendConfig {
            default_row_limit: self.default_row_limit,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
