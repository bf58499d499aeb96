//! Guildhall content kernel.
//!
//! Filtered queries over a hosted Postgres REST backend and assembly of
//! offer pages from their flat tables. The `guildhall` binary wraps this
//! library in an operator CLI.

pub mod backend;
pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod models;
pub mod naming;
pub mod query;

pub use backend::{Backend, BackendConfig, FetchOptions, MemoryClient, RestClient, TableClient};
pub use config::Config;
pub use content::OfferService;
pub use error::{BackendError, BackendResult, QueryError};
