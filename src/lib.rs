//! Spotle - REST API for artist listener statistics
//!
//! This library exposes CRUD operations on artists over HTTP. Handlers
//! translate requests into parameterized SQL against a `DuckDB` table and
//! answer with JSON.

/// HTTP handlers, routing and server bootstrap
pub mod api;
/// Runtime configuration from the environment and CLI overrides
pub mod config;
/// Error types and result aliases
pub mod errors;
/// Artist storage using `DuckDB`
pub mod storage;
