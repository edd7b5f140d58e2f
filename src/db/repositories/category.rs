//! Category repository
//!
//! Database operations for hierarchical categories. Deletion runs its guard
//! queries and the soft delete inside one transaction so a child or content
//! row cannot slip in between check and write.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::models::{Category, CategoryKind, EntityStatus};

/// Outcome of a guarded category delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryDelete {
    /// Soft-deleted
    Deleted,
    /// No live category with that id
    NotFound,
    /// Refused: live children exist
    HasChildren(i64),
    /// Refused: live content is attached
    HasContent(i64),
}

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Insert a new category, returning it with its assigned id
    async fn insert(&self, category: &Category) -> Result<Category>;

    /// Get a live category by ID
    async fn find_by_id(&self, id: i64) -> Result<Option<Category>>;

    /// Overwrite a live category's mutable columns
    async fn update(&self, category: &Category) -> Result<bool>;

    /// List live categories of a kind, ordered (sort_order asc, created_at asc)
    async fn list(&self, kind: CategoryKind, only_active: bool) -> Result<Vec<Category>>;

    /// List live children of a parent, same ordering
    async fn children(&self, parent_id: i64) -> Result<Vec<Category>>;

    /// Check (name, kind) uniqueness among live rows, optionally excluding one id
    async fn exists_by_name(
        &self,
        name: &str,
        kind: CategoryKind,
        exclude_id: Option<i64>,
    ) -> Result<bool>;

    /// Soft-delete if no live children and no attached live content
    async fn delete_guarded(&self, id: i64) -> Result<CategoryDelete>;
}

/// SQLx-based category repository implementation
pub struct SqlxCategoryRepository {
    pool: SqlitePool,
}

impl SqlxCategoryRepository {
    /// Create a new SQLx category repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

const CATEGORY_COLUMNS: &str =
    "id, name, description, kind, parent_id, sort_order, status, created_at, updated_at";

fn row_to_category(row: &SqliteRow) -> Result<Category> {
    let kind_raw: String = row.try_get("kind")?;
    let status_raw: String = row.try_get("status")?;

    Ok(Category {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        kind: CategoryKind::parse(&kind_raw)
            .ok_or_else(|| anyhow!("Unknown category kind: {}", kind_raw))?,
        parent_id: row.try_get("parent_id")?,
        sort_order: row.try_get("sort_order")?,
        status: EntityStatus::parse(&status_raw)
            .ok_or_else(|| anyhow!("Unknown category status: {}", status_raw))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn insert(&self, category: &Category) -> Result<Category> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO categories
                (name, description, kind, parent_id, sort_order, status, created_at, updated_at, deleted)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.kind.as_str())
        .bind(category.parent_id)
        .bind(category.sort_order)
        .bind(category.status.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create category")?;

        let mut created = category.clone();
        created.id = result.last_insert_rowid();
        created.created_at = now;
        created.updated_at = now;
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM categories WHERE id = ? AND deleted = 0",
            CATEGORY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get category by ID")?;

        match row {
            Some(row) => Ok(Some(row_to_category(&row)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, category: &Category) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE categories
            SET name = ?, description = ?, parent_id = ?, sort_order = ?, status = ?, updated_at = ?
            WHERE id = ? AND deleted = 0
            "#,
        )
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.parent_id)
        .bind(category.sort_order)
        .bind(category.status.as_str())
        .bind(Utc::now())
        .bind(category.id)
        .execute(&self.pool)
        .await
        .context("Failed to update category")?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, kind: CategoryKind, only_active: bool) -> Result<Vec<Category>> {
        let mut sql = format!(
            "SELECT {} FROM categories WHERE kind = ? AND deleted = 0",
            CATEGORY_COLUMNS
        );
        if only_active {
            sql.push_str(" AND status = 'active'");
        }
        sql.push_str(" ORDER BY sort_order ASC, created_at ASC");

        let rows = sqlx::query(&sql)
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await
            .context("Failed to list categories")?;

        rows.iter().map(row_to_category).collect()
    }

    async fn children(&self, parent_id: i64) -> Result<Vec<Category>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM categories WHERE parent_id = ? AND deleted = 0 \
             ORDER BY sort_order ASC, created_at ASC",
            CATEGORY_COLUMNS
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list child categories")?;

        rows.iter().map(row_to_category).collect()
    }

    async fn exists_by_name(
        &self,
        name: &str,
        kind: CategoryKind,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        let mut sql = String::from(
            "SELECT COUNT(*) FROM categories WHERE name = ? AND kind = ? AND deleted = 0",
        );
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
            .context("Failed to check category name")?;

        Ok(count > 0)
    }

    async fn delete_guarded(&self, id: i64) -> Result<CategoryDelete> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let row = sqlx::query("SELECT name, kind FROM categories WHERE id = ? AND deleted = 0")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to load category")?;

        let Some(row) = row else {
            return Ok(CategoryDelete::NotFound);
        };
        let name: String = row.try_get("name")?;
        let kind_raw: String = row.try_get("kind")?;
        let kind = CategoryKind::parse(&kind_raw)
            .ok_or_else(|| anyhow!("Unknown category kind: {}", kind_raw))?;

        let children: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM categories WHERE parent_id = ? AND deleted = 0",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to count child categories")?;

        if children > 0 {
            return Ok(CategoryDelete::HasChildren(children));
        }

        // Article categories are referenced by id, news categories by label
        let attached: i64 = match kind {
            CategoryKind::Article => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM articles WHERE category_id = ? AND deleted = 0",
                )
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .context("Failed to count attached articles")?
            }
            CategoryKind::News => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM news_items WHERE category = ? AND deleted = 0",
                )
                .bind(&name)
                .fetch_one(&mut *tx)
                .await
                .context("Failed to count attached news")?
            }
        };

        if attached > 0 {
            return Ok(CategoryDelete::HasContent(attached));
        }

        sqlx::query("UPDATE categories SET deleted = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete category")?;

        tx.commit().await.context("Failed to commit delete")?;
        Ok(CategoryDelete::Deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};

    async fn setup() -> SqlxCategoryRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        SqlxCategoryRepository::new(pool)
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = setup().await;

        let created = repo
            .insert(&Category::new("Tech".to_string(), CategoryKind::Article))
            .await
            .expect("insert");
        assert!(created.id > 0);

        let found = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Tech");
        assert_eq!(found.kind, CategoryKind::Article);
    }

    #[tokio::test]
    async fn test_exists_by_name_excludes_own_id() {
        let repo = setup().await;

        let created = repo
            .insert(&Category::new("Tech".to_string(), CategoryKind::Article))
            .await
            .unwrap();

        assert!(repo
            .exists_by_name("Tech", CategoryKind::Article, None)
            .await
            .unwrap());
        // A row never conflicts with itself
        assert!(!repo
            .exists_by_name("Tech", CategoryKind::Article, Some(created.id))
            .await
            .unwrap());
        // Same name in the other kind namespace is free
        assert!(!repo
            .exists_by_name("Tech", CategoryKind::News, None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_list_ordering() {
        let repo = setup().await;

        let mut second = Category::new("Second".to_string(), CategoryKind::News);
        second.sort_order = 2;
        repo.insert(&second).await.unwrap();

        let mut first = Category::new("First".to_string(), CategoryKind::News);
        first.sort_order = 1;
        repo.insert(&first).await.unwrap();

        let list = repo.list(CategoryKind::News, false).await.unwrap();
        let names: Vec<&str> = list.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn test_list_only_active() {
        let repo = setup().await;

        repo.insert(&Category::new("Shown".to_string(), CategoryKind::Article))
            .await
            .unwrap();
        let mut hidden = Category::new("Hidden".to_string(), CategoryKind::Article);
        hidden.status = EntityStatus::Inactive;
        repo.insert(&hidden).await.unwrap();

        let active = repo.list(CategoryKind::Article, true).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Shown");
    }

    #[tokio::test]
    async fn test_delete_guarded_children() {
        let repo = setup().await;

        let parent = repo
            .insert(&Category::new("Parent".to_string(), CategoryKind::Article))
            .await
            .unwrap();
        let mut child = Category::new("Child".to_string(), CategoryKind::Article);
        child.parent_id = Some(parent.id);
        let child = repo.insert(&child).await.unwrap();

        assert_eq!(
            repo.delete_guarded(parent.id).await.unwrap(),
            CategoryDelete::HasChildren(1)
        );

        // Parent must still be live after the refused delete
        assert!(repo.find_by_id(parent.id).await.unwrap().is_some());

        assert_eq!(
            repo.delete_guarded(child.id).await.unwrap(),
            CategoryDelete::Deleted
        );
        assert_eq!(
            repo.delete_guarded(parent.id).await.unwrap(),
            CategoryDelete::Deleted
        );
        assert_eq!(
            repo.delete_guarded(parent.id).await.unwrap(),
            CategoryDelete::NotFound
        );
    }

    #[tokio::test]
    async fn test_delete_guarded_attached_news() {
        let repo = setup().await;
        let pool = repo.pool.clone();

        let cat = repo
            .insert(&Category::new("Tech".to_string(), CategoryKind::News))
            .await
            .unwrap();

        sqlx::query(
            "INSERT INTO news_items (title, content, category, status) \
             VALUES ('n', 'b', 'Tech', 'published')",
        )
        .execute(&pool)
        .await
        .unwrap();

        assert_eq!(
            repo.delete_guarded(cat.id).await.unwrap(),
            CategoryDelete::HasContent(1)
        );

        sqlx::query("UPDATE news_items SET deleted = 1")
            .execute(&pool)
            .await
            .unwrap();

        assert_eq!(
            repo.delete_guarded(cat.id).await.unwrap(),
            CategoryDelete::Deleted
        );
    }
}
