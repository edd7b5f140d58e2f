//! Data models
//!
//! This module contains all data structures used throughout the backend.
//! Models represent:
//! - Database entities (ContentItem, Category, Tag)
//! - Query and pagination parameter types
//! - Internal data transfer objects

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

mod category;
mod content;
mod query;
mod tag;

pub use category::{Category, CategoryKind, CategoryNode, CreateCategoryInput, UpdateCategoryInput};
pub use content::{
    ArticleExt, ArticleKind, ContentItem, ContentKind, ContentStatus, CreateContentInput, NewsExt,
    NewsKind, SourceType, UpdateContentInput,
};
pub use query::{ContentQuery, PageQuery, PagedResult, SortField, SortOrder};
pub use tag::{CreateTagInput, Tag, TagKind, UpdateTagInput};

/// Enabled/disabled flag shared by categories and tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    /// Visible in enabled listings
    Active,
    /// Hidden from enabled listings but not deleted
    Inactive,
}

impl Default for EntityStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl EntityStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Active => "active",
            EntityStatus::Inactive => "inactive",
        }
    }

    /// Parse status from database string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(EntityStatus::Active),
            "inactive" => Some(EntityStatus::Inactive),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Human-readable labels for status codes, kept out of the enums themselves
/// so display text can change without touching persistence.
static STATUS_LABELS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("draft", "Draft"),
        ("published", "Published"),
        ("archived", "Archived"),
        ("active", "Active"),
        ("inactive", "Inactive"),
        ("manual", "Manual"),
        ("feed", "Feed"),
    ])
});

/// Look up the display label for a status code
pub fn status_label(code: &str) -> Option<&'static str> {
    STATUS_LABELS.get(code).copied()
}
