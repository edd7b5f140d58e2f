//! Tag service
//!
//! Business logic for tag management:
//! - Get-or-create resolution of free-text tag names
//! - Batch resolution with per-name failure tolerance
//! - Admin CRUD with deletion guarded by attached content

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::db::repositories::TagRepository;
use crate::models::{
    CreateTagInput, EntityStatus, PageQuery, PagedResult, Tag, TagKind, UpdateTagInput,
};

const MAX_NAME_LEN: usize = 100;

/// Error types for tag service operations
#[derive(Debug, thiserror::Error)]
pub enum TagServiceError {
    /// Tag not found
    #[error("Tag not found: {0}")]
    NotFound(String),

    /// Duplicate name within a kind
    #[error("Tag name already exists: {0}")]
    DuplicateName(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Aggregate tag counts
#[derive(Debug, Clone, Serialize)]
pub struct TagStats {
    pub total: i64,
    pub active: i64,
    pub article: i64,
    pub news: i64,
    pub general: i64,
}

/// Tag service
pub struct TagService {
    repo: Arc<dyn TagRepository>,
}

impl TagService {
    /// Create a new tag service
    pub fn new(repo: Arc<dyn TagRepository>) -> Self {
        Self { repo }
    }

    /// Resolve a tag name to its existing row, creating it when absent.
    ///
    /// The name is trimmed first; an empty result is a validation error
    /// surfaced before any store access. A concurrent creator is never an
    /// error: the winner's row is returned either way.
    pub async fn get_or_create(
        &self,
        name: &str,
        kind: TagKind,
    ) -> Result<Tag, TagServiceError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(TagServiceError::ValidationError(
                "Tag name cannot be empty".to_string(),
            ));
        }
        if trimmed.chars().count() > MAX_NAME_LEN {
            return Err(TagServiceError::ValidationError(format!(
                "Tag name exceeds {} characters",
                MAX_NAME_LEN
            )));
        }

        self.repo
            .get_or_create(trimmed, kind)
            .await
            .context("Failed to resolve tag")
            .map_err(Into::into)
    }

    /// Resolve a batch of tag names, preserving order.
    ///
    /// Blank names are skipped silently. A failure on one name is logged and
    /// swallowed so the batch never aborts mid-way. An empty input list is a
    /// validation error.
    pub async fn get_or_create_many(
        &self,
        names: &[String],
        kind: TagKind,
    ) -> Result<Vec<Tag>, TagServiceError> {
        if names.is_empty() {
            return Err(TagServiceError::ValidationError(
                "Tag name list cannot be empty".to_string(),
            ));
        }

        let mut tags = Vec::new();
        for name in names {
            if name.trim().is_empty() {
                continue;
            }
            match self.get_or_create(name, kind).await {
                Ok(tag) => tags.push(tag),
                Err(e) => {
                    tracing::warn!("Failed to resolve tag '{}': {}", name, e);
                }
            }
        }

        Ok(tags)
    }

    /// Get tag by ID
    pub async fn get(&self, id: i64) -> Result<Tag, TagServiceError> {
        self.repo
            .find_by_id(id)
            .await
            .context("Failed to get tag")?
            .ok_or_else(|| TagServiceError::NotFound(format!("Tag {} not found", id)))
    }

    /// Create a tag from admin input
    pub async fn save(&self, input: CreateTagInput) -> Result<Tag, TagServiceError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(TagServiceError::ValidationError(
                "Tag name cannot be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(TagServiceError::ValidationError(format!(
                "Tag name exceeds {} characters",
                MAX_NAME_LEN
            )));
        }

        if self
            .repo
            .exists_by_name(&name, input.kind, None)
            .await
            .context("Failed to check tag name")?
        {
            return Err(TagServiceError::DuplicateName(name));
        }

        let mut tag = Tag::new(name, input.kind);
        tag.description = input.description;
        tag.color = input.color;
        tag.sort_order = input.sort_order.unwrap_or(0);
        tag.status = input.status.unwrap_or(EntityStatus::Active);

        self.repo
            .insert(&tag)
            .await
            .context("Failed to create tag")
            .map_err(Into::into)
    }

    /// Update a tag from admin input
    pub async fn update(&self, id: i64, input: UpdateTagInput) -> Result<Tag, TagServiceError> {
        let mut tag = self.get(id).await?;

        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(TagServiceError::ValidationError(
                    "Tag name cannot be empty".to_string(),
                ));
            }
            if name != tag.name
                && self
                    .repo
                    .exists_by_name(&name, tag.kind, Some(id))
                    .await
                    .context("Failed to check tag name")?
            {
                return Err(TagServiceError::DuplicateName(name));
            }
            tag.name = name;
        }
        if let Some(description) = input.description {
            tag.description = description;
        }
        if let Some(color) = input.color {
            tag.color = color;
        }
        if let Some(sort_order) = input.sort_order {
            tag.sort_order = sort_order;
        }
        if let Some(status) = input.status {
            tag.status = status;
        }

        let updated = self
            .repo
            .update(&tag)
            .await
            .context("Failed to update tag")?;
        if !updated {
            return Err(TagServiceError::NotFound(format!("Tag {} not found", id)));
        }

        Ok(tag)
    }

    /// Delete a tag unless content still carries it.
    ///
    /// Returns `Ok(false)` with a warning when attached content blocks the
    /// delete.
    pub async fn delete(&self, id: i64) -> Result<bool, TagServiceError> {
        let tag = self.get(id).await?;

        let attached = self
            .repo
            .count_attached(&tag)
            .await
            .context("Failed to count attached content")?;
        if attached > 0 {
            tracing::warn!(
                "Refusing to delete tag '{}' ({}): {} content item(s) attached",
                tag.name,
                tag.id,
                attached
            );
            return Ok(false);
        }

        self.repo
            .soft_delete(id)
            .await
            .context("Failed to delete tag")
            .map_err(Into::into)
    }

    /// Delete a batch of tags, skipping any with attached content.
    ///
    /// Returns the number of tags actually deleted.
    pub async fn delete_many(&self, ids: &[i64]) -> Result<u64, TagServiceError> {
        let mut deletable = Vec::new();
        for &id in ids {
            let Some(tag) = self
                .repo
                .find_by_id(id)
                .await
                .context("Failed to get tag")?
            else {
                continue;
            };

            let attached = self
                .repo
                .count_attached(&tag)
                .await
                .context("Failed to count attached content")?;
            if attached > 0 {
                tracing::warn!(
                    "Skipping delete of tag '{}' ({}): {} content item(s) attached",
                    tag.name,
                    tag.id,
                    attached
                );
                continue;
            }
            deletable.push(id);
        }

        self.repo
            .soft_delete_many(&deletable)
            .await
            .context("Failed to batch delete tags")
            .map_err(Into::into)
    }

    /// Paged admin listing
    pub async fn page(
        &self,
        page: &PageQuery,
        kind: Option<TagKind>,
    ) -> Result<PagedResult<Tag>, TagServiceError> {
        self.repo
            .page(page, kind)
            .await
            .context("Failed to page tags")
            .map_err(Into::into)
    }

    /// List live tags of a kind
    pub async fn list_by_kind(&self, kind: TagKind) -> Result<Vec<Tag>, TagServiceError> {
        self.repo
            .list_by_kind(kind)
            .await
            .context("Failed to list tags")
            .map_err(Into::into)
    }

    /// List active tags, optionally restricted to a kind
    pub async fn list_enabled(
        &self,
        kind: Option<TagKind>,
    ) -> Result<Vec<Tag>, TagServiceError> {
        self.repo
            .list_enabled(kind)
            .await
            .context("Failed to list enabled tags")
            .map_err(Into::into)
    }

    /// Keyword search over name and description
    pub async fn search(&self, keyword: &str, limit: i64) -> Result<Vec<Tag>, TagServiceError> {
        self.repo
            .search(keyword.trim(), limit)
            .await
            .context("Failed to search tags")
            .map_err(Into::into)
    }

    /// Tags in use, most used first
    pub async fn hot_tags(&self, limit: i64) -> Result<Vec<Tag>, TagServiceError> {
        self.repo
            .hot(limit)
            .await
            .context("Failed to list hot tags")
            .map_err(Into::into)
    }

    /// Check (name, kind) uniqueness, optionally excluding one id
    pub async fn exists_by_name(
        &self,
        name: &str,
        kind: TagKind,
        exclude_id: Option<i64>,
    ) -> Result<bool, TagServiceError> {
        self.repo
            .exists_by_name(name.trim(), kind, exclude_id)
            .await
            .context("Failed to check tag name")
            .map_err(Into::into)
    }

    /// Recompute usage counts from the denormalized tag lists
    pub async fn recount_usage(&self) -> Result<u64, TagServiceError> {
        self.repo
            .recount_usage()
            .await
            .context("Failed to recount tag usage")
            .map_err(Into::into)
    }

    /// Aggregate tag counts
    pub async fn stats(&self) -> Result<TagStats, TagServiceError> {
        let total = self.repo.count(None).await.context("Failed to count tags")?;
        let active = self
            .repo
            .count(Some(EntityStatus::Active))
            .await
            .context("Failed to count active tags")?;
        let article = self
            .repo
            .count_by_kind(TagKind::Article)
            .await
            .context("Failed to count article tags")?;
        let news = self
            .repo
            .count_by_kind(TagKind::News)
            .await
            .context("Failed to count news tags")?;
        let general = self
            .repo
            .count_by_kind(TagKind::General)
            .await
            .context("Failed to count general tags")?;

        Ok(TagStats {
            total,
            active,
            article,
            news,
            general,
        })
    }
}
