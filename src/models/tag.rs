//! Tag model
//!
//! This module defines the Tag entity and related types. Tags are reusable
//! labels resolved by get-or-create semantics; content rows carry tag names
//! denormalized, so a tag's usage count is a derived statistic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EntityStatus;

/// Tag entity representing a reusable content label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    /// Unique identifier
    pub id: i64,
    /// Tag name, unique within (name, kind) among live rows
    pub name: String,
    /// Tag description
    pub description: Option<String>,
    /// Namespace the tag belongs to
    pub kind: TagKind,
    /// Display color
    pub color: Option<String>,
    /// Number of content items carrying this tag (best-effort)
    pub usage_count: i64,
    /// Sort order in admin listings
    pub sort_order: i32,
    /// Active/inactive flag
    pub status: EntityStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Tag {
    /// Create a new Tag with the given name and kind.
    ///
    /// The ID will be set to 0 and should be assigned by the database.
    pub fn new(name: String, kind: TagKind) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            name,
            description: None,
            kind,
            color: None,
            usage_count: 0,
            sort_order: 0,
            status: EntityStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Tag namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    /// Tags for long-form articles
    Article,
    /// Tags for aggregated news
    News,
    /// Tags shared across both
    General,
}

impl TagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagKind::Article => "article",
            TagKind::News => "news",
            TagKind::General => "general",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "article" => Some(TagKind::Article),
            "news" => Some(TagKind::News),
            "general" => Some(TagKind::General),
            _ => None,
        }
    }
}

impl std::fmt::Display for TagKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for creating a new tag
#[derive(Debug, Clone)]
pub struct CreateTagInput {
    /// Tag name
    pub name: String,
    /// Tag description
    pub description: Option<String>,
    /// Namespace
    pub kind: TagKind,
    /// Display color
    pub color: Option<String>,
    /// Sort order (defaults to 0)
    pub sort_order: Option<i32>,
    /// Active/inactive flag (defaults to Active)
    pub status: Option<EntityStatus>,
}

impl CreateTagInput {
    /// Create a new CreateTagInput
    pub fn new(name: impl Into<String>, kind: TagKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            color: None,
            sort_order: None,
            status: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the display color
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Input for updating a tag
#[derive(Debug, Clone, Default)]
pub struct UpdateTagInput {
    /// New name (optional)
    pub name: Option<String>,
    /// New description (optional, inner None clears)
    pub description: Option<Option<String>>,
    /// New color (optional, inner None clears)
    pub color: Option<Option<String>>,
    /// New sort order (optional)
    pub sort_order: Option<i32>,
    /// New status (optional)
    pub status: Option<EntityStatus>,
}

impl UpdateTagInput {
    /// Create a new empty UpdateTagInput
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: EntityStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.description.is_some()
            || self.color.is_some()
            || self.sort_order.is_some()
            || self.status.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_new_defaults() {
        let tag = Tag::new("rust".to_string(), TagKind::Article);

        assert_eq!(tag.id, 0);
        assert_eq!(tag.usage_count, 0);
        assert_eq!(tag.sort_order, 0);
        assert_eq!(tag.status, EntityStatus::Active);
    }

    #[test]
    fn test_tag_kind_roundtrip() {
        for kind in [TagKind::Article, TagKind::News, TagKind::General] {
            assert_eq!(TagKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(TagKind::parse("unknown"), None);
    }
}
