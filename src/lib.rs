//! Newsdesk - content management backend for articles and aggregated news
//!
//! The crate is organized in layers:
//! - `models`: entities, input types and query parameters
//! - `db`: connection pool, code-embedded migrations and repositories
//! - `services`: validation, tag resolution and the publication lifecycle
//! - `sync`: pull-based ingestion connectors (RSS, article feed)
//! - `response`: the uniform result envelope
//! - `config`: TOML configuration with environment overrides

pub mod config;
pub mod db;
pub mod models;
pub mod response;
pub mod services;
pub mod sync;
