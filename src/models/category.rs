//! Category model
//!
//! This module defines the Category entity and related types. Categories form
//! a single-parent tree per kind; article categories are referenced by id,
//! news categories double as free-text labels on ingested items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EntityStatus;

/// Category entity representing a hierarchical category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    /// Unique identifier
    pub id: i64,
    /// Category name, unique within (name, kind) among live rows
    pub name: String,
    /// Category description
    pub description: Option<String>,
    /// Which content kind this category organizes
    pub kind: CategoryKind,
    /// Parent category ID (for hierarchical structure)
    pub parent_id: Option<i64>,
    /// Sort order within parent
    pub sort_order: i32,
    /// Active/inactive flag
    pub status: EntityStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Create a new Category with the given parameters.
    ///
    /// The ID will be set to 0 and should be assigned by the database.
    pub fn new(name: String, kind: CategoryKind) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            name,
            description: None,
            kind,
            parent_id: None,
            sort_order: 0,
            status: EntityStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if this is a root category (no parent)
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Which content kind a category organizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Article categories, referenced by id
    Article,
    /// News categories, matched by label
    News,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Article => "article",
            CategoryKind::News => "news",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "article" => Some(CategoryKind::Article),
            "news" => Some(CategoryKind::News),
            _ => None,
        }
    }
}

impl std::fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category with its children for tree representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryNode {
    /// The category itself
    #[serde(flatten)]
    pub category: Category,
    /// Child categories
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    /// Create a new CategoryNode with no children
    pub fn new(category: Category) -> Self {
        Self {
            category,
            children: Vec::new(),
        }
    }

    /// Create a CategoryNode with children
    pub fn with_children(category: Category, children: Vec<CategoryNode>) -> Self {
        Self { category, children }
    }

    /// Get the total count of this category and all descendants
    pub fn total_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.total_count()).sum::<usize>()
    }

    /// Flatten the tree into a list of categories (depth-first)
    pub fn flatten(&self) -> Vec<&Category> {
        let mut result = vec![&self.category];
        for child in &self.children {
            result.extend(child.flatten());
        }
        result
    }

    /// Get all descendant IDs (not including self)
    pub fn descendant_ids(&self) -> Vec<i64> {
        let mut ids = Vec::new();
        for child in &self.children {
            ids.push(child.category.id);
            ids.extend(child.descendant_ids());
        }
        ids
    }
}

/// Input for creating a new category
#[derive(Debug, Clone)]
pub struct CreateCategoryInput {
    /// Category name
    pub name: String,
    /// Category description
    pub description: Option<String>,
    /// Content kind
    pub kind: CategoryKind,
    /// Parent category ID
    pub parent_id: Option<i64>,
    /// Sort order within parent (defaults to 0)
    pub sort_order: Option<i32>,
    /// Active/inactive flag (defaults to Active)
    pub status: Option<EntityStatus>,
}

impl CreateCategoryInput {
    /// Create a new CreateCategoryInput
    pub fn new(name: impl Into<String>, kind: CategoryKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            parent_id: None,
            sort_order: None,
            status: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the parent category
    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Set the sort order
    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = Some(sort_order);
        self
    }
}

/// Input for updating a category
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    /// New name (optional)
    pub name: Option<String>,
    /// New description (optional, inner None clears)
    pub description: Option<Option<String>>,
    /// New parent ID (optional, inner None moves to root)
    pub parent_id: Option<Option<i64>>,
    /// New sort order (optional)
    pub sort_order: Option<i32>,
    /// New status (optional)
    pub status: Option<EntityStatus>,
}

impl UpdateCategoryInput {
    /// Create a new empty UpdateCategoryInput
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the parent category (None moves to root)
    pub fn with_parent(mut self, parent_id: Option<i64>) -> Self {
        self.parent_id = Some(parent_id);
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
            || self.parent_id.is_some()
            || self.sort_order.is_some()
            || self.status.is_some()
    }
}
