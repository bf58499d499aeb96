//! Remote data access.
//!
//! This module provides:
//! - TableClient: capability trait for a remote tabular store
//! - RestClient: PostgREST implementation over HTTP
//! - MemoryClient: in-process implementation for tests and local runs
//! - Backend: typed CRUD with camelCase/snake_case translation

mod client;
mod memory;
mod rest;
mod service;

pub use client::{TableAction, TableClient, TableRequest, TableResponse};
pub use memory::MemoryClient;
pub use rest::RestClient;
pub use service::{Backend, BackendConfig, DEFAULT_ROW_LIMIT, DeleteTarget, FetchOptions};
