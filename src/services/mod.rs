//! Business logic services
//!
//! Services sit between the repositories and the callers (the binary and the
//! ingestion connectors), owning validation, cross-entity rules and the
//! publication lifecycle.

pub mod category;
pub mod content;
pub mod tag;

pub use category::{CategoryService, CategoryServiceError};
pub use content::{generate_summary, ContentService, ContentServiceError, ContentStats};
pub use tag::{TagService, TagServiceError, TagStats};
