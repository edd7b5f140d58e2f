//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod category;
pub mod content;
pub mod tag;

pub use category::{CategoryDelete, CategoryRepository, SqlxCategoryRepository};
pub use content::{ContentRepository, ContentTable, SqlxContentRepository};
pub use tag::{SqlxTagRepository, TagRepository};
