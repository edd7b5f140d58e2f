//! Database layer
//!
//! Connection pool, embedded migrations and repositories.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool};
