//! Content repository
//!
//! Database operations shared by articles and news items. The two kinds live
//! in separate tables with identical shared columns; `ContentTable` maps a
//! kind marker onto its table, flag column and extension columns so one
//! implementation serves both.

use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::models::{
    ArticleExt, ArticleKind, ContentItem, ContentKind, ContentQuery, ContentStatus, NewsExt,
    NewsKind, PagedResult, SourceType,
};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Storage mapping for a content kind.
///
/// Extension columns are bound and read in the order of `EXT_COLUMNS`.
pub trait ContentTable: ContentKind {
    /// Table holding this kind
    const TABLE: &'static str;
    /// Kind flag column (is_top / is_hot)
    const FLAG_COLUMN: &'static str;
    /// Extension columns, in binding order
    const EXT_COLUMNS: &'static [&'static str];

    /// Bind the extension fields in `EXT_COLUMNS` order
    fn bind_ext<'q>(query: SqliteQuery<'q>, ext: &'q Self::Ext) -> SqliteQuery<'q>;

    /// Read the extension fields from a row
    fn ext_from_row(row: &SqliteRow) -> Result<Self::Ext>;

    /// Append kind-specific filter clauses
    fn push_kind_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &ContentQuery);
}

impl ContentTable for ArticleKind {
    const TABLE: &'static str = "articles";
    const FLAG_COLUMN: &'static str = "is_top";
    const EXT_COLUMNS: &'static [&'static str] = &["category_id", "source_type", "is_top"];

    fn bind_ext<'q>(query: SqliteQuery<'q>, ext: &'q ArticleExt) -> SqliteQuery<'q> {
        query
            .bind(ext.category_id)
            .bind(ext.source_type.as_str())
            .bind(ext.is_top)
    }

    fn ext_from_row(row: &SqliteRow) -> Result<ArticleExt> {
        let source_raw: String = row.try_get("source_type")?;
        Ok(ArticleExt {
            category_id: row.try_get("category_id")?,
            source_type: SourceType::parse(&source_raw)
                .ok_or_else(|| anyhow!("Unknown source type: {}", source_raw))?,
            is_top: row.try_get("is_top")?,
        })
    }

    fn push_kind_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &ContentQuery) {
        if let Some(category_id) = query.category_id {
            builder.push(" AND category_id = ").push_bind(category_id);
        }
    }
}

impl ContentTable for NewsKind {
    const TABLE: &'static str = "news_items";
    const FLAG_COLUMN: &'static str = "is_hot";
    const EXT_COLUMNS: &'static [&'static str] = &["category", "source", "is_hot"];

    fn bind_ext<'q>(query: SqliteQuery<'q>, ext: &'q NewsExt) -> SqliteQuery<'q> {
        query
            .bind(ext.category.as_deref())
            .bind(ext.source.as_deref())
            .bind(ext.is_hot)
    }

    fn ext_from_row(row: &SqliteRow) -> Result<NewsExt> {
        Ok(NewsExt {
            category: row.try_get("category")?,
            source: row.try_get("source")?,
            is_hot: row.try_get("is_hot")?,
        })
    }

    fn push_kind_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &ContentQuery) {
        if let Some(category) = &query.category {
            builder.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(source) = &query.source {
            builder.push(" AND source = ").push_bind(source.clone());
        }
    }
}

/// Content repository trait
#[async_trait]
pub trait ContentRepository<K: ContentKind>: Send + Sync {
    /// Insert a new item, returning it with its assigned id
    async fn insert(&self, item: &ContentItem<K>) -> Result<ContentItem<K>>;

    /// Get a live item by ID
    async fn find_by_id(&self, id: i64) -> Result<Option<ContentItem<K>>>;

    /// Overwrite a live item's mutable columns
    async fn update(&self, item: &ContentItem<K>) -> Result<bool>;

    /// Soft-delete an item
    async fn soft_delete(&self, id: i64) -> Result<bool>;

    /// Soft-delete a batch, returning the number of rows affected
    async fn soft_delete_many(&self, ids: &[i64]) -> Result<u64>;

    /// Filtered, sorted, paginated listing with total count
    async fn page(
        &self,
        query: &ContentQuery,
        published_only: bool,
    ) -> Result<PagedResult<ContentItem<K>>>;

    /// Filtered, sorted listing without pagination bookkeeping
    async fn list(
        &self,
        query: &ContentQuery,
        published_only: bool,
        limit: i64,
    ) -> Result<Vec<ContentItem<K>>>;

    /// Move to Published, stamping publish_time with `at`
    async fn publish(&self, id: i64, at: DateTime<Utc>) -> Result<bool>;

    /// Move back to Draft; publish_time is retained as history
    async fn unpublish(&self, id: i64) -> Result<bool>;

    /// Set the kind flag (is_top / is_hot)
    async fn set_flag(&self, id: i64, value: bool) -> Result<bool>;

    /// Atomically bump the view counter
    async fn increment_view(&self, id: i64) -> Result<bool>;

    /// Atomically bump the like counter
    async fn increment_like(&self, id: i64) -> Result<bool>;

    /// Atomically decrement the like counter; no-op at zero
    async fn decrement_like(&self, id: i64) -> Result<bool>;

    /// Check whether a live item with this title or source URL exists
    async fn exists_by_source(&self, title: &str, source_url: &str) -> Result<bool>;

    /// Distinct non-empty values of an extension column over published items
    async fn distinct_ext_values(&self, column: &str) -> Result<Vec<String>>;

    /// Count live items, optionally restricted to one status
    async fn count(&self, status: Option<ContentStatus>) -> Result<i64>;

    /// Count live items with the kind flag set
    async fn count_flagged(&self) -> Result<i64>;
}

/// SQLx-based content repository implementation
pub struct SqlxContentRepository<K: ContentTable> {
    pool: SqlitePool,
    _kind: PhantomData<K>,
}

impl<K: ContentTable> SqlxContentRepository<K> {
    /// Create a new SQLx content repository
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _kind: PhantomData,
        }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn ContentRepository<K>> {
        Arc::new(Self::new(pool))
    }
}

fn select_columns<K: ContentTable>() -> String {
    let mut cols = String::from(
        "id, title, content, summary, cover_image, tags, source_url, status, \
         view_count, like_count, publish_time, created_at, updated_at",
    );
    for c in K::EXT_COLUMNS {
        cols.push_str(", ");
        cols.push_str(c);
    }
    cols
}

fn row_to_item<K: ContentTable>(row: &SqliteRow) -> Result<ContentItem<K>> {
    let status_raw: String = row.try_get("status")?;
    let status = ContentStatus::parse(&status_raw)
        .ok_or_else(|| anyhow!("Unknown content status: {}", status_raw))?;

    let tags_raw: String = row.try_get("tags")?;
    let tags: Vec<String> = serde_json::from_str(&tags_raw).unwrap_or_default();

    Ok(ContentItem {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        summary: row.try_get("summary")?,
        cover_image: row.try_get("cover_image")?,
        tags,
        source_url: row.try_get("source_url")?,
        status,
        view_count: row.try_get("view_count")?,
        like_count: row.try_get("like_count")?,
        publish_time: row.try_get("publish_time")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        ext: K::ext_from_row(row)?,
    })
}

/// Append the shared filter clauses, then the kind-specific ones.
///
/// Sort identifiers never come from caller strings; only `SortField` and
/// `FLAG_COLUMN` constants are pushed as raw SQL.
fn push_filters<K: ContentTable>(
    builder: &mut QueryBuilder<'_, Sqlite>,
    query: &ContentQuery,
    published_only: bool,
) {
    builder.push(" WHERE deleted = 0");

    if published_only {
        builder
            .push(" AND status = ")
            .push_bind(ContentStatus::Published.as_str());
    } else if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }

    if let Some(keyword) = &query.keyword {
        let pattern = format!("%{}%", keyword.to_lowercase());
        builder
            .push(" AND (LOWER(title) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(content) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(COALESCE(summary, '')) LIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(tag) = &query.tag {
        // Tags are stored as a JSON array of strings
        builder
            .push(" AND tags LIKE ")
            .push_bind(format!("%\"{}\"%", tag));
    }

    if let Some(flagged) = query.flagged {
        builder
            .push(" AND ")
            .push(K::FLAG_COLUMN)
            .push(" = ")
            .push_bind(flagged);
    }

    if let Some(start) = query.start_time {
        builder.push(" AND publish_time >= ").push_bind(start);
    }
    if let Some(end) = query.end_time {
        builder.push(" AND publish_time <= ").push_bind(end);
    }

    K::push_kind_filters(builder, query);
}

fn push_order(builder: &mut QueryBuilder<'_, Sqlite>, query: &ContentQuery) {
    builder
        .push(" ORDER BY ")
        .push(query.sort_field().column())
        .push(" ")
        .push(query.sort_order().as_sql());
}

#[async_trait]
impl<K: ContentTable> ContentRepository<K> for SqlxContentRepository<K> {
    async fn insert(&self, item: &ContentItem<K>) -> Result<ContentItem<K>> {
        let now = Utc::now();
        let tags_json = serde_json::to_string(&item.tags).context("Failed to encode tags")?;

        let ext_cols = K::EXT_COLUMNS.join(", ");
        let ext_marks = vec!["?"; K::EXT_COLUMNS.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} (title, content, summary, cover_image, tags, source_url, status, \
             view_count, like_count, publish_time, created_at, updated_at, deleted, {}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, {})",
            K::TABLE,
            ext_cols,
            ext_marks
        );

        let query = sqlx::query(&sql)
            .bind(&item.title)
            .bind(&item.content)
            .bind(&item.summary)
            .bind(&item.cover_image)
            .bind(&tags_json)
            .bind(&item.source_url)
            .bind(item.status.as_str())
            .bind(item.view_count)
            .bind(item.like_count)
            .bind(item.publish_time)
            .bind(now)
            .bind(now);
        let query = K::bind_ext(query, &item.ext);

        let result = query
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to insert {}", K::NAME))?;

        let mut created = item.clone();
        created.id = result.last_insert_rowid();
        created.created_at = now;
        created.updated_at = now;
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ContentItem<K>>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ? AND deleted = 0",
            select_columns::<K>(),
            K::TABLE
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to get {} by ID", K::NAME))?;

        match row {
            Some(row) => Ok(Some(row_to_item::<K>(&row)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, item: &ContentItem<K>) -> Result<bool> {
        let now = Utc::now();
        let tags_json = serde_json::to_string(&item.tags).context("Failed to encode tags")?;

        let set_ext = K::EXT_COLUMNS
            .iter()
            .map(|c| format!("{} = ?", c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET title = ?, content = ?, summary = ?, cover_image = ?, tags = ?, \
             source_url = ?, status = ?, publish_time = ?, updated_at = ?, {} \
             WHERE id = ? AND deleted = 0",
            K::TABLE,
            set_ext
        );

        let query = sqlx::query(&sql)
            .bind(&item.title)
            .bind(&item.content)
            .bind(&item.summary)
            .bind(&item.cover_image)
            .bind(&tags_json)
            .bind(&item.source_url)
            .bind(item.status.as_str())
            .bind(item.publish_time)
            .bind(now);
        let query = K::bind_ext(query, &item.ext);

        let result = query
            .bind(item.id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to update {}", K::NAME))?;

        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool> {
        let sql = format!(
            "UPDATE {} SET deleted = 1, updated_at = ? WHERE id = ? AND deleted = 0",
            K::TABLE
        );

        let result = sqlx::query(&sql)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete {}", K::NAME))?;

        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete_many(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::new(format!(
            "UPDATE {} SET deleted = 1, updated_at = ",
            K::TABLE
        ));
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
            .with_context(|| format!("Failed to batch delete {}", K::NAME))?;

        Ok(result.rows_affected())
    }

    async fn page(
        &self,
        query: &ContentQuery,
        published_only: bool,
    ) -> Result<PagedResult<ContentItem<K>>> {
        let page = query.page();

        let mut count_builder =
            QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", K::TABLE));
        push_filters::<K>(&mut count_builder, query, published_only);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to count {}", K::NAME))?;

        let mut builder = QueryBuilder::new(format!(
            "SELECT {} FROM {}",
            select_columns::<K>(),
            K::TABLE
        ));
        push_filters::<K>(&mut builder, query, published_only);
        push_order(&mut builder, query);
        builder.push(" LIMIT ").push_bind(page.limit());
        builder.push(" OFFSET ").push_bind(page.offset());

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to page {}", K::NAME))?;

        let items = rows
            .iter()
            .map(row_to_item::<K>)
            .collect::<Result<Vec<_>>>()?;

        Ok(PagedResult::new(items, total, &page))
    }

    async fn list(
        &self,
        query: &ContentQuery,
        published_only: bool,
        limit: i64,
    ) -> Result<Vec<ContentItem<K>>> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT {} FROM {}",
            select_columns::<K>(),
            K::TABLE
        ));
        push_filters::<K>(&mut builder, query, published_only);
        push_order(&mut builder, query);
        builder.push(" LIMIT ").push_bind(limit);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to list {}", K::NAME))?;

        rows.iter().map(row_to_item::<K>).collect()
    }

    async fn publish(&self, id: i64, at: DateTime<Utc>) -> Result<bool> {
        let sql = format!(
            "UPDATE {} SET status = ?, publish_time = ?, updated_at = ? \
             WHERE id = ? AND deleted = 0",
            K::TABLE
        );

        let result = sqlx::query(&sql)
            .bind(ContentStatus::Published.as_str())
            .bind(at)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to publish {}", K::NAME))?;

        Ok(result.rows_affected() > 0)
    }

    async fn unpublish(&self, id: i64) -> Result<bool> {
        // publish_time stays put: it records publication history
        let sql = format!(
            "UPDATE {} SET status = ?, updated_at = ? WHERE id = ? AND deleted = 0",
            K::TABLE
        );

        let result = sqlx::query(&sql)
            .bind(ContentStatus::Draft.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to unpublish {}", K::NAME))?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_flag(&self, id: i64, value: bool) -> Result<bool> {
        let sql = format!(
            "UPDATE {} SET {} = ?, updated_at = ? WHERE id = ? AND deleted = 0",
            K::TABLE,
            K::FLAG_COLUMN
        );

        let result = sqlx::query(&sql)
            .bind(value)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to set {} flag", K::NAME))?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_view(&self, id: i64) -> Result<bool> {
        let sql = format!(
            "UPDATE {} SET view_count = view_count + 1 WHERE id = ? AND deleted = 0",
            K::TABLE
        );

        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to increment {} views", K::NAME))?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_like(&self, id: i64) -> Result<bool> {
        let sql = format!(
            "UPDATE {} SET like_count = like_count + 1 WHERE id = ? AND deleted = 0",
            K::TABLE
        );

        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to like {}", K::NAME))?;

        Ok(result.rows_affected() > 0)
    }

    async fn decrement_like(&self, id: i64) -> Result<bool> {
        // The like_count predicate keeps the counter at or above zero
        let sql = format!(
            "UPDATE {} SET like_count = like_count - 1 \
             WHERE id = ? AND deleted = 0 AND like_count > 0",
            K::TABLE
        );

        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to unlike {}", K::NAME))?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_source(&self, title: &str, source_url: &str) -> Result<bool> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE deleted = 0 \
             AND (title = ? OR (source_url IS NOT NULL AND source_url = ?))",
            K::TABLE
        );

        let count: i64 = sqlx::query_scalar(&sql)
            .bind(title)
            .bind(source_url)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to check {} existence", K::NAME))?;

        Ok(count > 0)
    }

    async fn distinct_ext_values(&self, column: &str) -> Result<Vec<String>> {
        if !K::EXT_COLUMNS.contains(&column) {
            bail!("Unknown {} column: {}", K::NAME, column);
        }

        let sql = format!(
            "SELECT DISTINCT {col} FROM {} WHERE deleted = 0 AND status = ? \
             AND {col} IS NOT NULL AND {col} != '' ORDER BY {col}",
            K::TABLE,
            col = column
        );

        let values: Vec<String> = sqlx::query_scalar(&sql)
            .bind(ContentStatus::Published.as_str())
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to list distinct {} values", column))?;

        Ok(values)
    }

    async fn count(&self, status: Option<ContentStatus>) -> Result<i64> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT COUNT(*) FROM {} WHERE deleted = 0",
            K::TABLE
        ));
        if let Some(status) = status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to count {}", K::NAME))?;

        Ok(count)
    }

    async fn count_flagged(&self) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE deleted = 0 AND {} = 1",
            K::TABLE,
            K::FLAG_COLUMN
        );

        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to count flagged {}", K::NAME))?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};
    use crate::models::{SortField, SortOrder};

    async fn setup() -> SqlitePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        pool
    }

    fn article(title: &str, status: ContentStatus) -> ContentItem<ArticleKind> {
        ContentItem::new(title.to_string(), format!("{} body", title), status)
    }

    fn news(title: &str, status: ContentStatus) -> ContentItem<NewsKind> {
        ContentItem::new(title.to_string(), format!("{} body", title), status)
    }

    #[tokio::test]
    async fn test_insert_and_find_roundtrip() {
        let pool = setup().await;
        let repo = SqlxContentRepository::<ArticleKind>::new(pool);

        let mut item = article("Hello", ContentStatus::Draft);
        item.tags = vec!["rust".to_string(), "async".to_string()];
        item.ext.is_top = true;

        let created = repo.insert(&item).await.expect("insert");
        assert!(created.id > 0);

        let found = repo
            .find_by_id(created.id)
            .await
            .expect("find")
            .expect("should exist");
        assert_eq!(found.title, "Hello");
        assert_eq!(found.tags, vec!["rust", "async"]);
        assert!(found.ext.is_top);
        assert_eq!(found.ext.source_type, SourceType::Manual);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_item() {
        let pool = setup().await;
        let repo = SqlxContentRepository::<NewsKind>::new(pool);

        let created = repo
            .insert(&news("Gone soon", ContentStatus::Published))
            .await
            .expect("insert");

        assert!(repo.soft_delete(created.id).await.expect("delete"));
        assert!(repo.find_by_id(created.id).await.expect("find").is_none());

        // Second delete is a no-op
        assert!(!repo.soft_delete(created.id).await.expect("delete again"));
    }

    #[tokio::test]
    async fn test_soft_delete_many() {
        let pool = setup().await;
        let repo = SqlxContentRepository::<ArticleKind>::new(pool);

        let a = repo.insert(&article("A", ContentStatus::Draft)).await.unwrap();
        let b = repo.insert(&article("B", ContentStatus::Draft)).await.unwrap();

        let affected = repo
            .soft_delete_many(&[a.id, b.id, 9999])
            .await
            .expect("batch delete");
        assert_eq!(affected, 2);
        assert_eq!(repo.soft_delete_many(&[]).await.expect("empty"), 0);
    }

    #[tokio::test]
    async fn test_publish_stamps_time() {
        let pool = setup().await;
        let repo = SqlxContentRepository::<ArticleKind>::new(pool);

        let created = repo.insert(&article("Draft", ContentStatus::Draft)).await.unwrap();
        assert!(created.publish_time.is_none());

        let at = Utc::now();
        assert!(repo.publish(created.id, at).await.expect("publish"));

        let found = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.status, ContentStatus::Published);
        assert!(found.publish_time.is_some());

        // Missing row publishes nothing
        assert!(!repo.publish(9999, at).await.expect("publish missing"));
    }

    #[tokio::test]
    async fn test_unpublish_keeps_publish_time() {
        let pool = setup().await;
        let repo = SqlxContentRepository::<NewsKind>::new(pool);

        let created = repo.insert(&news("Hot take", ContentStatus::Draft)).await.unwrap();
        repo.publish(created.id, Utc::now()).await.unwrap();

        assert!(repo.unpublish(created.id).await.expect("unpublish"));

        let found = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.status, ContentStatus::Draft);
        assert!(found.publish_time.is_some());
    }

    #[tokio::test]
    async fn test_like_floor_at_zero() {
        let pool = setup().await;
        let repo = SqlxContentRepository::<ArticleKind>::new(pool);

        let created = repo.insert(&article("Liked", ContentStatus::Published)).await.unwrap();

        assert!(!repo.decrement_like(created.id).await.expect("unlike at zero"));

        repo.increment_like(created.id).await.unwrap();
        assert!(repo.decrement_like(created.id).await.expect("unlike"));

        let found = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.like_count, 0);
    }

    #[tokio::test]
    async fn test_increment_view() {
        let pool = setup().await;
        let repo = SqlxContentRepository::<ArticleKind>::new(pool);

        let created = repo.insert(&article("Seen", ContentStatus::Published)).await.unwrap();
        repo.increment_view(created.id).await.unwrap();
        repo.increment_view(created.id).await.unwrap();

        let found = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.view_count, 2);
    }

    #[tokio::test]
    async fn test_page_published_only_and_keyword() {
        let pool = setup().await;
        let repo = SqlxContentRepository::<ArticleKind>::new(pool);

        repo.insert(&article("Rust ships", ContentStatus::Published)).await.unwrap();
        repo.insert(&article("Rust draft", ContentStatus::Draft)).await.unwrap();
        repo.insert(&article("Go ships", ContentStatus::Published)).await.unwrap();

        let query = ContentQuery::new().with_keyword("RUST");
        let page = repo.page(&query, true).await.expect("page");
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Rust ships");
    }

    #[tokio::test]
    async fn test_page_tag_filter() {
        let pool = setup().await;
        let repo = SqlxContentRepository::<NewsKind>::new(pool);

        let mut tagged = news("Tagged", ContentStatus::Published);
        tagged.tags = vec!["ai".to_string()];
        repo.insert(&tagged).await.unwrap();
        repo.insert(&news("Untagged", ContentStatus::Published)).await.unwrap();

        let query = ContentQuery::new().with_tag("ai");
        let page = repo.page(&query, true).await.expect("page");
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Tagged");
    }

    #[tokio::test]
    async fn test_page_sorts_by_view_count() {
        let pool = setup().await;
        let repo = SqlxContentRepository::<ArticleKind>::new(pool);

        let low = repo.insert(&article("Low", ContentStatus::Published)).await.unwrap();
        let high = repo.insert(&article("High", ContentStatus::Published)).await.unwrap();
        repo.increment_view(high.id).await.unwrap();
        repo.increment_view(high.id).await.unwrap();
        repo.increment_view(low.id).await.unwrap();

        let query = ContentQuery::new().with_sort(SortField::ViewCount, SortOrder::Desc);
        let page = repo.page(&query, true).await.expect("page");
        assert_eq!(page.items[0].title, "High");
    }

    #[tokio::test]
    async fn test_news_kind_filters_and_distinct() {
        let pool = setup().await;
        let repo = SqlxContentRepository::<NewsKind>::new(pool);

        let mut a = news("One", ContentStatus::Published);
        a.ext.category = Some("Tech".to_string());
        a.ext.source = Some("wired".to_string());
        repo.insert(&a).await.unwrap();

        let mut b = news("Two", ContentStatus::Published);
        b.ext.category = Some("Science".to_string());
        b.ext.source = Some("nature".to_string());
        repo.insert(&b).await.unwrap();

        let query = ContentQuery::new().with_category("Tech");
        let page = repo.page(&query, true).await.expect("page");
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "One");

        let sources = repo.distinct_ext_values("source").await.expect("distinct");
        assert_eq!(sources, vec!["nature".to_string(), "wired".to_string()]);

        assert!(repo.distinct_ext_values("title").await.is_err());
    }

    #[tokio::test]
    async fn test_exists_by_source() {
        let pool = setup().await;
        let repo = SqlxContentRepository::<NewsKind>::new(pool);

        let mut item = news("Unique headline", ContentStatus::Published);
        item.source_url = Some("https://example.com/a".to_string());
        repo.insert(&item).await.unwrap();

        assert!(repo
            .exists_by_source("Unique headline", "https://other.example")
            .await
            .unwrap());
        assert!(repo
            .exists_by_source("Other headline", "https://example.com/a")
            .await
            .unwrap());
        assert!(!repo
            .exists_by_source("Other headline", "https://other.example")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_counts() {
        let pool = setup().await;
        let repo = SqlxContentRepository::<ArticleKind>::new(pool);

        repo.insert(&article("P1", ContentStatus::Published)).await.unwrap();
        repo.insert(&article("D1", ContentStatus::Draft)).await.unwrap();
        let mut top = article("Top", ContentStatus::Published);
        top.ext.is_top = true;
        repo.insert(&top).await.unwrap();

        assert_eq!(repo.count(None).await.unwrap(), 3);
        assert_eq!(repo.count(Some(ContentStatus::Published)).await.unwrap(), 2);
        assert_eq!(repo.count_flagged().await.unwrap(), 1);
    }
}
