//! Tag repository
//!
//! Database operations for tags. Get-or-create rides on the partial unique
//! index over live (name, kind) rows: an insert that loses the race maps the
//! unique violation to a re-fetch of the winner.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::models::{EntityStatus, PageQuery, PagedResult, Tag, TagKind};

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Insert a new tag, returning it with its assigned id
    async fn insert(&self, tag: &Tag) -> Result<Tag>;

    /// Get a live tag by ID
    async fn find_by_id(&self, id: i64) -> Result<Option<Tag>>;

    /// Get a live tag by (name, kind)
    async fn find_by_name(&self, name: &str, kind: TagKind) -> Result<Option<Tag>>;

    /// Return the existing live tag or create it; never produces a duplicate
    async fn get_or_create(&self, name: &str, kind: TagKind) -> Result<Tag>;

    /// Overwrite a live tag's mutable columns
    async fn update(&self, tag: &Tag) -> Result<bool>;

    /// Soft-delete a tag
    async fn soft_delete(&self, id: i64) -> Result<bool>;

    /// Soft-delete a batch, returning the number of rows affected
    async fn soft_delete_many(&self, ids: &[i64]) -> Result<u64>;

    /// Paged admin listing (usage desc, sort asc, created desc)
    async fn page(&self, page: &PageQuery, kind: Option<TagKind>) -> Result<PagedResult<Tag>>;

    /// List live tags of a kind
    async fn list_by_kind(&self, kind: TagKind) -> Result<Vec<Tag>>;

    /// List active live tags, optionally restricted to a kind
    async fn list_enabled(&self, kind: Option<TagKind>) -> Result<Vec<Tag>>;

    /// Keyword search over name and description
    async fn search(&self, keyword: &str, limit: i64) -> Result<Vec<Tag>>;

    /// Tags actually in use, usage desc
    async fn hot(&self, limit: i64) -> Result<Vec<Tag>>;

    /// Check (name, kind) uniqueness among live rows, optionally excluding one id
    async fn exists_by_name(
        &self,
        name: &str,
        kind: TagKind,
        exclude_id: Option<i64>,
    ) -> Result<bool>;

    /// Count live content rows carrying this tag
    async fn count_attached(&self, tag: &Tag) -> Result<i64>;

    /// Recompute usage_count for every live tag from the denormalized lists
    async fn recount_usage(&self) -> Result<u64>;

    /// Count live tags, optionally restricted to one status
    async fn count(&self, status: Option<EntityStatus>) -> Result<i64>;

    /// Count live tags of a kind
    async fn count_by_kind(&self, kind: TagKind) -> Result<i64>;
}

/// SQLx-based tag repository implementation
pub struct SqlxTagRepository {
    pool: SqlitePool,
}

impl SqlxTagRepository {
    /// Create a new SQLx tag repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

const TAG_COLUMNS: &str =
    "id, name, description, kind, color, usage_count, sort_order, status, created_at, updated_at";

fn row_to_tag(row: &SqliteRow) -> Result<Tag> {
    let kind_raw: String = row.try_get("kind")?;
    let status_raw: String = row.try_get("status")?;

    Ok(Tag {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        kind: TagKind::parse(&kind_raw).ok_or_else(|| anyhow!("Unknown tag kind: {}", kind_raw))?,
        color: row.try_get("color")?,
        usage_count: row.try_get("usage_count")?,
        sort_order: row.try_get("sort_order")?,
        status: EntityStatus::parse(&status_raw)
            .ok_or_else(|| anyhow!("Unknown tag status: {}", status_raw))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map_or(false, |db| db.is_unique_violation())
}

/// JSON-array containment pattern for a tag name
fn tag_pattern(name: &str) -> String {
    format!("%\"{}\"%", name)
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn insert(&self, tag: &Tag) -> Result<Tag> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO tags
                (name, description, kind, color, usage_count, sort_order, status, created_at, updated_at, deleted)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(&tag.name)
        .bind(&tag.description)
        .bind(tag.kind.as_str())
        .bind(&tag.color)
        .bind(tag.usage_count)
        .bind(tag.sort_order)
        .bind(tag.status.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create tag")?;

        let mut created = tag.clone();
        created.id = result.last_insert_rowid();
        created.created_at = now;
        created.updated_at = now;
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Tag>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tags WHERE id = ? AND deleted = 0",
            TAG_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get tag by ID")?;

        match row {
            Some(row) => Ok(Some(row_to_tag(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_name(&self, name: &str, kind: TagKind) -> Result<Option<Tag>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tags WHERE name = ? AND kind = ? AND deleted = 0",
            TAG_COLUMNS
        ))
        .bind(name)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get tag by name")?;

        match row {
            Some(row) => Ok(Some(row_to_tag(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_or_create(&self, name: &str, kind: TagKind) -> Result<Tag> {
        if let Some(existing) = self.find_by_name(name, kind).await? {
            return Ok(existing);
        }

        let tag = Tag::new(name.to_string(), kind);
        match self.insert(&tag).await {
            Ok(created) => Ok(created),
            // Lost the check-then-create race; the winner's row is the result
            Err(e) if is_unique_violation(&e) => self
                .find_by_name(name, kind)
                .await?
                .ok_or_else(|| anyhow!("Tag disappeared after conflict: {}", name)),
            Err(e) => Err(e),
        }
    }

    async fn update(&self, tag: &Tag) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tags
            SET name = ?, description = ?, color = ?, sort_order = ?, status = ?, updated_at = ?
            WHERE id = ? AND deleted = 0
            "#,
        )
        .bind(&tag.name)
        .bind(&tag.description)
        .bind(&tag.color)
        .bind(tag.sort_order)
        .bind(tag.status.as_str())
        .bind(Utc::now())
        .bind(tag.id)
        .execute(&self.pool)
        .await
        .context("Failed to update tag")?;

        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let result =
            sqlx::query("UPDATE tags SET deleted = 1, updated_at = ? WHERE id = ? AND deleted = 0")
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await
                .context("Failed to delete tag")?;

        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete_many(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE tags SET deleted = 1, updated_at = ");
        builder.push_bind(Utc::now());
        builder.push(" WHERE deleted = 0 AND id IN (");
        {
            let mut separated = builder.separated(", ");
            for id in ids {
                separated.push_bind(*id);
            }
        }
        builder.push(")");

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .context("Failed to batch delete tags")?;

        Ok(result.rows_affected())
    }

    async fn page(&self, page: &PageQuery, kind: Option<TagKind>) -> Result<PagedResult<Tag>> {
        let mut count_sql = String::from("SELECT COUNT(*) FROM tags WHERE deleted = 0");
        let mut list_sql = format!("SELECT {} FROM tags WHERE deleted = 0", TAG_COLUMNS);
        if kind.is_some() {
            count_sql.push_str(" AND kind = ?");
            list_sql.push_str(" AND kind = ?");
        }
        list_sql.push_str(
            " ORDER BY usage_count DESC, sort_order ASC, created_at DESC LIMIT ? OFFSET ?",
        );

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(kind) = kind {
            count_query = count_query.bind(kind.as_str());
        }
        let total = count_query
            .fetch_one(&self.pool)
            .await
            .context("Failed to count tags")?;

        let mut list_query = sqlx::query(&list_sql);
        if let Some(kind) = kind {
            list_query = list_query.bind(kind.as_str());
        }
        let rows = list_query
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .context("Failed to page tags")?;

        let items = rows.iter().map(row_to_tag).collect::<Result<Vec<_>>>()?;
        Ok(PagedResult::new(items, total, page))
    }

    async fn list_by_kind(&self, kind: TagKind) -> Result<Vec<Tag>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tags WHERE kind = ? AND deleted = 0 \
             ORDER BY sort_order ASC, name ASC",
            TAG_COLUMNS
        ))
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list tags by kind")?;

        rows.iter().map(row_to_tag).collect()
    }

    async fn list_enabled(&self, kind: Option<TagKind>) -> Result<Vec<Tag>> {
        let mut sql = format!(
            "SELECT {} FROM tags WHERE deleted = 0 AND status = 'active'",
            TAG_COLUMNS
        );
        if kind.is_some() {
            sql.push_str(" AND kind = ?");
        }
        sql.push_str(" ORDER BY sort_order ASC, name ASC");

        let mut query = sqlx::query(&sql);
        if let Some(kind) = kind {
            query = query.bind(kind.as_str());
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list enabled tags")?;

        rows.iter().map(row_to_tag).collect()
    }

    async fn search(&self, keyword: &str, limit: i64) -> Result<Vec<Tag>> {
        let pattern = format!("%{}%", keyword.to_lowercase());

        let rows = sqlx::query(&format!(
            "SELECT {} FROM tags WHERE deleted = 0 \
             AND (LOWER(name) LIKE ? OR LOWER(COALESCE(description, '')) LIKE ?) \
             ORDER BY usage_count DESC, name ASC LIMIT ?",
            TAG_COLUMNS
        ))
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to search tags")?;

        rows.iter().map(row_to_tag).collect()
    }

    async fn hot(&self, limit: i64) -> Result<Vec<Tag>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tags WHERE deleted = 0 AND usage_count > 0 \
             ORDER BY usage_count DESC, name ASC LIMIT ?",
            TAG_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list hot tags")?;

        rows.iter().map(row_to_tag).collect()
    }

    async fn exists_by_name(
        &self,
        name: &str,
        kind: TagKind,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        let mut sql =
            String::from("SELECT COUNT(*) FROM tags WHERE name = ? AND kind = ? AND deleted = 0");
        if exclude_id.is_some() {
            sql.push_str(" AND id != ?");
        }

        let mut query = sqlx::query_scalar::<_, i64>(&sql)
            .bind(name)
            .bind(kind.as_str());
        if let Some(id) = exclude_id {
            query = query.bind(id);
        }

        let count = query
            .fetch_one(&self.pool)
            .await
            .context("Failed to check tag name")?;

        Ok(count > 0)
    }

    async fn count_attached(&self, tag: &Tag) -> Result<i64> {
        let pattern = tag_pattern(&tag.name);

        let articles: i64 = if matches!(tag.kind, TagKind::Article | TagKind::General) {
            sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE deleted = 0 AND tags LIKE ?")
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await
                .context("Failed to count tagged articles")?
        } else {
            0
        };

        let news: i64 = if matches!(tag.kind, TagKind::News | TagKind::General) {
            sqlx::query_scalar("SELECT COUNT(*) FROM news_items WHERE deleted = 0 AND tags LIKE ?")
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await
                .context("Failed to count tagged news")?
        } else {
            0
        };

        Ok(articles + news)
    }

    async fn recount_usage(&self) -> Result<u64> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tags WHERE deleted = 0",
            TAG_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list tags for recount")?;

        let tags = rows.iter().map(row_to_tag).collect::<Result<Vec<_>>>()?;

        let mut updated = 0;
        for tag in tags {
            let usage = self.count_attached(&tag).await?;
            if usage != tag.usage_count {
                sqlx::query("UPDATE tags SET usage_count = ? WHERE id = ?")
                    .bind(usage)
                    .bind(tag.id)
                    .execute(&self.pool)
                    .await
                    .context("Failed to update tag usage")?;
                updated += 1;
            }
        }

        Ok(updated)
    }

    async fn count(&self, status: Option<EntityStatus>) -> Result<i64> {
        let mut sql = String::from("SELECT COUNT(*) FROM tags WHERE deleted = 0");
        if status.is_some() {
            sql.push_str(" AND status = ?");
        }

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(status) = status {
            query = query.bind(status.as_str());
        }

        query.fetch_one(&self.pool).await.context("Failed to count tags")
    }

    async fn count_by_kind(&self, kind: TagKind) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tags WHERE deleted = 0 AND kind = ?")
            .bind(kind.as_str())
            .fetch_one(&self.pool)
            .await
            .context("Failed to count tags by kind")
    }
}
