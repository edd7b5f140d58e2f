//! Category service
//!
//! Business logic for hierarchical categories:
//! - Tree assembly from the flat parent_id list
//! - Parent validation on create and move (kind match, no cycles)
//! - Deletion guarded by live children and attached content

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::db::repositories::{CategoryDelete, CategoryRepository};
use crate::models::{
    Category, CategoryKind, CategoryNode, CreateCategoryInput, EntityStatus, UpdateCategoryInput,
};

const MAX_NAME_LEN: usize = 100;

/// Subtrees deeper than this are cut off rather than recursed into.
const MAX_TREE_DEPTH: usize = 32;

/// Error types for category service operations
#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    /// Category not found
    #[error("Category not found: {0}")]
    NotFound(String),

    /// Duplicate name within a kind
    #[error("Category name already exists: {0}")]
    DuplicateName(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Category service
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    /// Create a new category service
    pub fn new(repo: Arc<dyn CategoryRepository>) -> Self {
        Self { repo }
    }

    /// Get category by ID
    pub async fn get(&self, id: i64) -> Result<Category, CategoryServiceError> {
        self.repo
            .find_by_id(id)
            .await
            .context("Failed to get category")?
            .ok_or_else(|| CategoryServiceError::NotFound(format!("Category {} not found", id)))
    }

    /// Create a category from admin input
    pub async fn save(&self, input: CreateCategoryInput) -> Result<Category, CategoryServiceError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(CategoryServiceError::ValidationError(
                "Category name cannot be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(CategoryServiceError::ValidationError(format!(
                "Category name exceeds {} characters",
                MAX_NAME_LEN
            )));
        }

        if let Some(parent_id) = input.parent_id {
            let parent = self
                .repo
                .find_by_id(parent_id)
                .await
                .context("Failed to get parent category")?
                .ok_or_else(|| {
                    CategoryServiceError::ValidationError(format!(
                        "Parent category {} does not exist",
                        parent_id
                    ))
                })?;
            if parent.kind != input.kind {
                return Err(CategoryServiceError::ValidationError(
                    "Parent category belongs to a different content kind".to_string(),
                ));
            }
        }

        if self
            .repo
            .exists_by_name(&name, input.kind, None)
            .await
            .context("Failed to check category name")?
        {
            return Err(CategoryServiceError::DuplicateName(name));
        }

        let mut category = Category::new(name, input.kind);
        category.description = input.description;
        category.parent_id = input.parent_id;
        category.sort_order = input.sort_order.unwrap_or(0);
        category.status = input.status.unwrap_or(EntityStatus::Active);

        self.repo
            .insert(&category)
            .await
            .context("Failed to create category")
            .map_err(Into::into)
    }

    /// Update a category from admin input
    pub async fn update(
        &self,
        id: i64,
        input: UpdateCategoryInput,
    ) -> Result<Category, CategoryServiceError> {
        let mut category = self.get(id).await?;

        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(CategoryServiceError::ValidationError(
                    "Category name cannot be empty".to_string(),
                ));
            }
            if name != category.name
                && self
                    .repo
                    .exists_by_name(&name, category.kind, Some(id))
                    .await
                    .context("Failed to check category name")?
            {
                return Err(CategoryServiceError::DuplicateName(name));
            }
            category.name = name;
        }
        if let Some(parent_id) = input.parent_id {
            self.check_parent(&category, parent_id).await?;
            category.parent_id = parent_id;
        }
        if let Some(description) = input.description {
            category.description = description;
        }
        if let Some(sort_order) = input.sort_order {
            category.sort_order = sort_order;
        }
        if let Some(status) = input.status {
            category.status = status;
        }

        let updated = self
            .repo
            .update(&category)
            .await
            .context("Failed to update category")?;
        if !updated {
            return Err(CategoryServiceError::NotFound(format!(
                "Category {} not found",
                id
            )));
        }

        Ok(category)
    }

    /// Validate a parent move: the parent must exist, share the category's
    /// kind, and not sit below the category being moved.
    async fn check_parent(
        &self,
        category: &Category,
        new_parent: Option<i64>,
    ) -> Result<(), CategoryServiceError> {
        let Some(parent_id) = new_parent else {
            return Ok(());
        };
        if parent_id == category.id {
            return Err(CategoryServiceError::ValidationError(
                "Category cannot be its own parent".to_string(),
            ));
        }

        let mut cursor = parent_id;
        for _ in 0..MAX_TREE_DEPTH {
            let node = self
                .repo
                .find_by_id(cursor)
                .await
                .context("Failed to get parent category")?
                .ok_or_else(|| {
                    CategoryServiceError::ValidationError(format!(
                        "Parent category {} does not exist",
                        cursor
                    ))
                })?;
            if cursor == parent_id && node.kind != category.kind {
                return Err(CategoryServiceError::ValidationError(
                    "Parent category belongs to a different content kind".to_string(),
                ));
            }
            match node.parent_id {
                Some(ancestor) if ancestor == category.id => {
                    return Err(CategoryServiceError::ValidationError(
                        "Move would create a cycle in the category tree".to_string(),
                    ));
                }
                Some(ancestor) => cursor = ancestor,
                None => return Ok(()),
            }
        }

        Err(CategoryServiceError::ValidationError(
            "Category tree is too deep".to_string(),
        ))
    }

    /// Delete a category unless children or content block it.
    ///
    /// Returns `Ok(false)` with a warning when the delete is refused.
    pub async fn delete(&self, id: i64) -> Result<bool, CategoryServiceError> {
        match self
            .repo
            .delete_guarded(id)
            .await
            .context("Failed to delete category")?
        {
            CategoryDelete::Deleted => Ok(true),
            CategoryDelete::NotFound => Err(CategoryServiceError::NotFound(format!(
                "Category {} not found",
                id
            ))),
            CategoryDelete::HasChildren(n) => {
                tracing::warn!(
                    "Refusing to delete category {}: {} child categor(ies) exist",
                    id,
                    n
                );
                Ok(false)
            }
            CategoryDelete::HasContent(n) => {
                tracing::warn!(
                    "Refusing to delete category {}: {} content item(s) attached",
                    id,
                    n
                );
                Ok(false)
            }
        }
    }

    /// List live categories of a kind, active and inactive
    pub async fn list(&self, kind: CategoryKind) -> Result<Vec<Category>, CategoryServiceError> {
        self.repo
            .list(kind, false)
            .await
            .context("Failed to list categories")
            .map_err(Into::into)
    }

    /// List active categories of a kind
    pub async fn list_enabled(
        &self,
        kind: CategoryKind,
    ) -> Result<Vec<Category>, CategoryServiceError> {
        self.repo
            .list(kind, true)
            .await
            .context("Failed to list enabled categories")
            .map_err(Into::into)
    }

    /// List live children of a category
    pub async fn children(&self, parent_id: i64) -> Result<Vec<Category>, CategoryServiceError> {
        self.repo
            .children(parent_id)
            .await
            .context("Failed to list child categories")
            .map_err(Into::into)
    }

    /// Check (name, kind) uniqueness, optionally excluding one id
    pub async fn exists_by_name(
        &self,
        name: &str,
        kind: CategoryKind,
        exclude_id: Option<i64>,
    ) -> Result<bool, CategoryServiceError> {
        self.repo
            .exists_by_name(name.trim(), kind, exclude_id)
            .await
            .context("Failed to check category name")
            .map_err(Into::into)
    }

    /// Assemble the active categories of a kind into a forest.
    ///
    /// Runs one query and one pass over the result: rows are bucketed by
    /// parent_id, then attached from the roots down. A node whose parent is
    /// inactive or deleted is dropped with the rest of its subtree.
    pub async fn build_tree(
        &self,
        kind: CategoryKind,
    ) -> Result<Vec<CategoryNode>, CategoryServiceError> {
        let categories = self.list_enabled(kind).await?;
        Ok(build_forest(categories))
    }
}

fn build_forest(categories: Vec<Category>) -> Vec<CategoryNode> {
    let mut roots = Vec::new();
    let mut children_of: HashMap<i64, Vec<Category>> = HashMap::new();

    // Listing order (sort_order, created_at) is preserved within each bucket.
    for category in categories {
        match category.parent_id {
            None => roots.push(category),
            Some(parent_id) => children_of.entry(parent_id).or_default().push(category),
        }
    }

    roots
        .into_iter()
        .map(|root| attach_children(root, &mut children_of, 0))
        .collect()
}

fn attach_children(
    category: Category,
    children_of: &mut HashMap<i64, Vec<Category>>,
    depth: usize,
) -> CategoryNode {
    if depth >= MAX_TREE_DEPTH {
        tracing::warn!(
            "Category tree exceeds depth {}; truncating below category {}",
            MAX_TREE_DEPTH,
            category.id
        );
        return CategoryNode::new(category);
    }

    let children = children_of
        .remove(&category.id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| attach_children(child, children_of, depth + 1))
        .collect();

    CategoryNode::with_children(category, children)
}
