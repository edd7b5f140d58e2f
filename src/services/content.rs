//! Content service
//!
//! Business logic shared by articles and news items:
//! - Create/update with tag resolution and summary derivation
//! - Publication lifecycle (draft, published, archived) and its timestamps
//! - Counters (views, likes) and the kind flag (pinned / hot)
//! - Public listings that only ever see published items

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::db::repositories::ContentRepository;
use crate::models::{
    ArticleKind, ContentItem, ContentKind, ContentQuery, ContentStatus, CreateContentInput,
    NewsKind, PagedResult, SortField, SortOrder, UpdateContentInput,
};
use crate::services::tag::{TagService, TagServiceError};

/// Maximum length of a derived summary, in characters.
const SUMMARY_LEN: usize = 200;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static MARKDOWN_MARK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[#*`>\[\]()!-]").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Error types for content service operations
#[derive(Debug, thiserror::Error)]
pub enum ContentServiceError {
    /// Content not found
    #[error("Content not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<TagServiceError> for ContentServiceError {
    fn from(err: TagServiceError) -> Self {
        match err {
            TagServiceError::ValidationError(msg) => ContentServiceError::ValidationError(msg),
            other => ContentServiceError::InternalError(anyhow::anyhow!(other)),
        }
    }
}

/// Aggregate content counts
#[derive(Debug, Clone, Serialize)]
pub struct ContentStats {
    pub total: i64,
    pub published: i64,
    pub draft: i64,
    pub archived: i64,
    pub flagged: i64,
}

/// Strip markup from content and truncate it into a summary.
///
/// HTML tags and common markdown punctuation are removed, whitespace is
/// collapsed, and the result is cut at a character (not byte) boundary.
pub fn generate_summary(content: &str) -> String {
    let stripped = HTML_TAG.replace_all(content, "");
    let stripped = MARKDOWN_MARK.replace_all(&stripped, "");
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    let text = collapsed.trim();

    if text.chars().count() <= SUMMARY_LEN {
        text.to_string()
    } else {
        let cut: String = text.chars().take(SUMMARY_LEN).collect();
        format!("{}...", cut)
    }
}

/// Content service, generic over the article / news kind
pub struct ContentService<K: ContentKind> {
    repo: Arc<dyn ContentRepository<K>>,
    tags: Arc<TagService>,
}

impl<K: ContentKind> ContentService<K> {
    /// Create a new content service
    pub fn new(repo: Arc<dyn ContentRepository<K>>, tags: Arc<TagService>) -> Self {
        Self { repo, tags }
    }

    /// Create a content item.
    ///
    /// Tag names are resolved through the tag service (creating missing tags
    /// in this kind's namespace), the summary is derived from the content when
    /// not supplied, and publish_time is stamped when the item is created
    /// directly in the published state without an explicit timestamp.
    pub async fn save(
        &self,
        input: CreateContentInput<K>,
    ) -> Result<ContentItem<K>, ContentServiceError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(ContentServiceError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }
        if input.content.trim().is_empty() {
            return Err(ContentServiceError::ValidationError(
                "Content cannot be empty".to_string(),
            ));
        }

        let status = input.status.unwrap_or_default();

        let mut item = ContentItem::new(title, input.content, status);
        item.tags = self.resolve_tags(&input.tags).await?;
        item.summary = match input.summary.filter(|s| !s.trim().is_empty()) {
            Some(summary) => Some(summary),
            None => Some(generate_summary(&item.content)),
        };
        item.cover_image = input.cover_image;
        item.source_url = input.source_url;
        item.publish_time = input.publish_time;
        if status == ContentStatus::Published && item.publish_time.is_none() {
            item.publish_time = Some(Utc::now());
        }
        item.ext = input.ext;

        let created = self
            .repo
            .insert(&item)
            .await
            .with_context(|| format!("Failed to create {}", K::NAME))?;
        tracing::info!("Created {} {} ({})", K::NAME, created.id, created.status);
        Ok(created)
    }

    /// Update a content item.
    ///
    /// Only supplied fields change. The summary is re-derived when the content
    /// changes without a new summary. Moving into the published state stamps
    /// publish_time once; leaving it never clears the timestamp, so a
    /// re-published item keeps its original publication date.
    pub async fn update(
        &self,
        id: i64,
        input: UpdateContentInput<K>,
    ) -> Result<ContentItem<K>, ContentServiceError> {
        let mut item = self.get(id).await?;

        if let Some(title) = input.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(ContentServiceError::ValidationError(
                    "Title cannot be empty".to_string(),
                ));
            }
            item.title = title;
        }
        let content_changed = input.content.is_some();
        if let Some(content) = input.content {
            if content.trim().is_empty() {
                return Err(ContentServiceError::ValidationError(
                    "Content cannot be empty".to_string(),
                ));
            }
            item.content = content;
        }
        match input.summary.filter(|s| !s.trim().is_empty()) {
            Some(summary) => item.summary = Some(summary),
            None if content_changed => item.summary = Some(generate_summary(&item.content)),
            None => {}
        }
        if let Some(tags) = input.tags {
            item.tags = self.resolve_tags(&tags).await?;
        }
        if let Some(cover_image) = input.cover_image {
            item.cover_image = Some(cover_image);
        }
        if let Some(source_url) = input.source_url {
            item.source_url = Some(source_url);
        }
        if let Some(ext) = input.ext {
            item.ext = ext;
        }

        let was_published = item.is_published();
        if let Some(status) = input.status {
            item.status = status;
        }
        if let Some(at) = input.publish_time {
            item.publish_time = Some(at);
        } else if item.is_published() && !was_published && item.publish_time.is_none() {
            item.publish_time = Some(Utc::now());
        }

        let updated = self
            .repo
            .update(&item)
            .await
            .with_context(|| format!("Failed to update {}", K::NAME))?;
        if !updated {
            return Err(ContentServiceError::NotFound(format!(
                "{} {} not found",
                K::NAME, id
            )));
        }

        Ok(item)
    }

    async fn resolve_tags(&self, names: &[String]) -> Result<Vec<String>, ContentServiceError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let tags = self.tags.get_or_create_many(names, K::TAG_KIND).await?;
        Ok(tags.into_iter().map(|t| t.name).collect())
    }

    /// Get an item without side effects (admin view)
    pub async fn get(&self, id: i64) -> Result<ContentItem<K>, ContentServiceError> {
        self.repo
            .find_by_id(id)
            .await
            .with_context(|| format!("Failed to get {}", K::NAME))?
            .ok_or_else(|| {
                ContentServiceError::NotFound(format!("{} {} not found", K::NAME, id))
            })
    }

    /// Get an item for public display, counting the view first
    pub async fn detail(&self, id: i64) -> Result<ContentItem<K>, ContentServiceError> {
        let counted = self
            .repo
            .increment_view(id)
            .await
            .context("Failed to count view")?;
        if !counted {
            return Err(ContentServiceError::NotFound(format!(
                "{} {} not found",
                K::NAME, id
            )));
        }
        self.get(id).await
    }

    /// Soft-delete an item
    pub async fn delete(&self, id: i64) -> Result<bool, ContentServiceError> {
        self.repo
            .soft_delete(id)
            .await
            .with_context(|| format!("Failed to delete {}", K::NAME))
            .map_err(Into::into)
    }

    /// Soft-delete a batch, returning the number of rows affected
    pub async fn delete_many(&self, ids: &[i64]) -> Result<u64, ContentServiceError> {
        self.repo
            .soft_delete_many(ids)
            .await
            .with_context(|| format!("Failed to batch delete {}", K::NAME))
            .map_err(Into::into)
    }

    /// Publish an item, stamping publish_time with the current time.
    ///
    /// An already-published item gets a fresh timestamp.
    pub async fn publish(&self, id: i64) -> Result<bool, ContentServiceError> {
        let published = self
            .repo
            .publish(id, Utc::now())
            .await
            .with_context(|| format!("Failed to publish {}", K::NAME))?;
        if published {
            tracing::info!("Published {} {}", K::NAME, id);
        }
        Ok(published)
    }

    /// Move an item back to draft; its publish_time is retained as history
    pub async fn unpublish(&self, id: i64) -> Result<bool, ContentServiceError> {
        let unpublished = self
            .repo
            .unpublish(id)
            .await
            .with_context(|| format!("Failed to unpublish {}", K::NAME))?;
        if unpublished {
            tracing::info!("Unpublished {} {}", K::NAME, id);
        }
        Ok(unpublished)
    }

    /// Set or clear the kind flag (pinned for articles, hot for news)
    pub async fn set_flag(&self, id: i64, value: bool) -> Result<bool, ContentServiceError> {
        self.repo
            .set_flag(id, value)
            .await
            .with_context(|| format!("Failed to flag {}", K::NAME))
            .map_err(Into::into)
    }

    /// Count a like
    pub async fn like(&self, id: i64) -> Result<bool, ContentServiceError> {
        self.repo
            .increment_like(id)
            .await
            .context("Failed to count like")
            .map_err(Into::into)
    }

    /// Retract a like; the counter never goes below zero
    pub async fn unlike(&self, id: i64) -> Result<bool, ContentServiceError> {
        self.repo
            .decrement_like(id)
            .await
            .context("Failed to retract like")
            .map_err(Into::into)
    }

    /// Admin listing honoring every filter, including status
    pub async fn page(
        &self,
        query: &ContentQuery,
    ) -> Result<PagedResult<ContentItem<K>>, ContentServiceError> {
        self.repo
            .page(query, false)
            .await
            .with_context(|| format!("Failed to page {}", K::NAME))
            .map_err(Into::into)
    }

    /// Public listing; only published items are visible
    pub async fn search(
        &self,
        query: &ContentQuery,
    ) -> Result<PagedResult<ContentItem<K>>, ContentServiceError> {
        self.repo
            .page(query, true)
            .await
            .with_context(|| format!("Failed to search {}", K::NAME))
            .map_err(Into::into)
    }

    /// Flagged published items, most viewed first
    pub async fn hot(&self, limit: i64) -> Result<Vec<ContentItem<K>>, ContentServiceError> {
        let query = ContentQuery::new()
            .with_flagged(true)
            .with_sort(SortField::ViewCount, SortOrder::Desc);
        self.repo
            .list(&query, true, limit)
            .await
            .with_context(|| format!("Failed to list hot {}", K::NAME))
            .map_err(Into::into)
    }

    /// Most recently published items
    pub async fn latest(&self, limit: i64) -> Result<Vec<ContentItem<K>>, ContentServiceError> {
        let query = ContentQuery::new().with_sort(SortField::PublishTime, SortOrder::Desc);
        self.repo
            .list(&query, true, limit)
            .await
            .with_context(|| format!("Failed to list latest {}", K::NAME))
            .map_err(Into::into)
    }

    /// Published items carrying a tag
    pub async fn by_tag(
        &self,
        tag: &str,
        page: u32,
        page_size: u32,
    ) -> Result<PagedResult<ContentItem<K>>, ContentServiceError> {
        let query = ContentQuery::new().with_tag(tag).with_page(page, page_size);
        self.search(&query).await
    }

    /// Check whether a live item with this title or source URL exists.
    ///
    /// Used by the ingestion connectors to skip items already stored.
    pub async fn exists_by_source(
        &self,
        title: &str,
        source_url: &str,
    ) -> Result<bool, ContentServiceError> {
        self.repo
            .exists_by_source(title, source_url)
            .await
            .with_context(|| format!("Failed to check {} source", K::NAME))
            .map_err(Into::into)
    }

    /// Aggregate content counts
    pub async fn stats(&self) -> Result<ContentStats, ContentServiceError> {
        let total = self
            .repo
            .count(None)
            .await
            .with_context(|| format!("Failed to count {}", K::NAME))?;
        let published = self
            .repo
            .count(Some(ContentStatus::Published))
            .await
            .with_context(|| format!("Failed to count published {}", K::NAME))?;
        let draft = self
            .repo
            .count(Some(ContentStatus::Draft))
            .await
            .with_context(|| format!("Failed to count draft {}", K::NAME))?;
        let archived = self
            .repo
            .count(Some(ContentStatus::Archived))
            .await
            .with_context(|| format!("Failed to count archived {}", K::NAME))?;
        let flagged = self
            .repo
            .count_flagged()
            .await
            .with_context(|| format!("Failed to count flagged {}", K::NAME))?;

        Ok(ContentStats {
            total,
            published,
            draft,
            archived,
            flagged,
        })
    }
}

impl ContentService<ArticleKind> {
    /// Published articles in a category
    pub async fn by_category(
        &self,
        category_id: i64,
        page: u32,
        page_size: u32,
    ) -> Result<PagedResult<ContentItem<ArticleKind>>, ContentServiceError> {
        let query = ContentQuery::new()
            .with_category_id(category_id)
            .with_page(page, page_size);
        self.search(&query).await
    }
}

impl ContentService<NewsKind> {
    /// Published news under a category label
    pub async fn by_category(
        &self,
        category: &str,
        page: u32,
        page_size: u32,
    ) -> Result<PagedResult<ContentItem<NewsKind>>, ContentServiceError> {
        let query = ContentQuery::new()
            .with_category(category)
            .with_page(page, page_size);
        self.search(&query).await
    }

    /// Published news from a source
    pub async fn by_source(
        &self,
        source: &str,
        page: u32,
        page_size: u32,
    ) -> Result<PagedResult<ContentItem<NewsKind>>, ContentServiceError> {
        let query = ContentQuery::new().with_source(source).with_page(page, page_size);
        self.search(&query).await
    }

    /// Distinct category labels over published news
    pub async fn categories(&self) -> Result<Vec<String>, ContentServiceError> {
        self.repo
            .distinct_ext_values("category")
            .await
            .context("Failed to list news categories")
            .map_err(Into::into)
    }

    /// Distinct source names over published news
    pub async fn sources(&self) -> Result<Vec<String>, ContentServiceError> {
        self.repo
            .distinct_ext_values("source")
            .await
            .context("Failed to list news sources")
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxContentRepository, SqlxTagRepository};
    use crate::db::{create_test_pool, migrations::run_migrations};
    use crate::models::{ArticleExt, NewsExt, TagKind};

    async fn setup_articles() -> (ContentService<ArticleKind>, Arc<TagService>) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        let tags = Arc::new(TagService::new(SqlxTagRepository::boxed(pool.clone())));
        (
            ContentService::new(SqlxContentRepository::boxed(pool), tags.clone()),
            tags,
        )
    }

    async fn setup_news() -> ContentService<NewsKind> {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        let tags = Arc::new(TagService::new(SqlxTagRepository::boxed(pool.clone())));
        ContentService::new(SqlxContentRepository::boxed(pool), tags)
    }

    #[test]
    fn test_generate_summary_strips_markup() {
        let summary = generate_summary("# Title\n\nSome **bold** text with <em>html</em>.");
        assert_eq!(summary, "Title Some bold text with html.");
    }

    #[test]
    fn test_generate_summary_truncates_at_chars() {
        let long = "словарь ".repeat(100);
        let summary = generate_summary(&long);
        assert!(summary.ends_with("..."));
        assert_eq!(summary.chars().count(), SUMMARY_LEN + 3);
    }

    #[tokio::test]
    async fn test_save_defaults_to_draft_with_derived_summary() {
        let (service, _tags) = setup_articles().await;

        let article = service
            .save(CreateContentInput::new("Title", "# Heading\n\nBody text"))
            .await
            .expect("save");

        assert_eq!(article.status, ContentStatus::Draft);
        assert!(article.publish_time.is_none());
        assert_eq!(article.summary.as_deref(), Some("Heading Body text"));
    }

    #[tokio::test]
    async fn test_save_published_stamps_publish_time() {
        let (service, _tags) = setup_articles().await;

        let before = Utc::now();
        let article = service
            .save(
                CreateContentInput::new("Title", "Body")
                    .with_status(ContentStatus::Published),
            )
            .await
            .expect("save");

        let at = article.publish_time.expect("stamped");
        assert!(at >= before && at <= Utc::now());
    }

    #[tokio::test]
    async fn test_save_resolves_tags_into_namespace() {
        let (service, tags) = setup_articles().await;

        let article = service
            .save(
                CreateContentInput::new("Title", "Body")
                    .with_tags(vec!["rust".to_string(), " async ".to_string()]),
            )
            .await
            .expect("save");

        assert_eq!(article.tags, vec!["rust", "async"]);
        let resolved = tags.list_by_kind(TagKind::Article).await.unwrap();
        assert_eq!(resolved.len(), 2);
    }

    #[tokio::test]
    async fn test_save_rejects_blank_title() {
        let (service, _tags) = setup_articles().await;

        let err = service
            .save(CreateContentInput::new("   ", "Body"))
            .await
            .unwrap_err();
        assert!(matches!(err, ContentServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_update_regenerates_summary_on_content_change() {
        let (service, _tags) = setup_articles().await;

        let article = service
            .save(CreateContentInput::new("Title", "Old body"))
            .await
            .unwrap();
        let updated = service
            .update(
                article.id,
                UpdateContentInput::new().with_content("New body entirely"),
            )
            .await
            .expect("update");

        assert_eq!(updated.summary.as_deref(), Some("New body entirely"));
    }

    #[tokio::test]
    async fn test_update_stamps_publish_time_once() {
        let (service, _tags) = setup_articles().await;

        let article = service
            .save(CreateContentInput::new("Title", "Body"))
            .await
            .unwrap();

        let published = service
            .update(
                article.id,
                UpdateContentInput::new().with_status(ContentStatus::Published),
            )
            .await
            .expect("publish via update");
        let first = published.publish_time.expect("stamped");

        // Draft and back to published: the original timestamp survives
        service
            .update(
                article.id,
                UpdateContentInput::new().with_status(ContentStatus::Draft),
            )
            .await
            .expect("unpublish via update");
        let republished = service
            .update(
                article.id,
                UpdateContentInput::new().with_status(ContentStatus::Published),
            )
            .await
            .expect("republish");

        assert_eq!(republished.publish_time, Some(first));
    }

    #[tokio::test]
    async fn test_unpublish_retains_publish_time() {
        let (service, _tags) = setup_articles().await;

        let article = service
            .save(
                CreateContentInput::new("Title", "Body")
                    .with_status(ContentStatus::Published),
            )
            .await
            .unwrap();
        let stamped = article.publish_time;

        assert!(service.unpublish(article.id).await.expect("unpublish"));
        let after = service.get(article.id).await.unwrap();
        assert_eq!(after.status, ContentStatus::Draft);
        assert_eq!(after.publish_time, stamped);
    }

    #[tokio::test]
    async fn test_explicit_publish_restamps() {
        let (service, _tags) = setup_articles().await;

        let past = Utc::now() - chrono::Duration::days(30);
        let article = service
            .save(
                CreateContentInput::new("Title", "Body")
                    .with_status(ContentStatus::Published)
                    .with_publish_time(past),
            )
            .await
            .unwrap();
        assert_eq!(article.publish_time, Some(past));

        assert!(service.publish(article.id).await.expect("publish"));
        let after = service.get(article.id).await.unwrap();
        assert!(after.publish_time.expect("stamped") > past);
    }

    #[tokio::test]
    async fn test_detail_counts_view() {
        let (service, _tags) = setup_articles().await;

        let article = service
            .save(CreateContentInput::new("Title", "Body"))
            .await
            .unwrap();

        let viewed = service.detail(article.id).await.expect("detail");
        assert_eq!(viewed.view_count, 1);
        let again = service.detail(article.id).await.expect("detail");
        assert_eq!(again.view_count, 2);

        let err = service.detail(9999).await.unwrap_err();
        assert!(matches!(err, ContentServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unlike_floors_at_zero() {
        let (service, _tags) = setup_articles().await;

        let article = service
            .save(CreateContentInput::new("Title", "Body"))
            .await
            .unwrap();

        assert!(service.like(article.id).await.unwrap());
        assert!(service.unlike(article.id).await.unwrap());
        // Already at zero; the conditional update touches no row
        assert!(!service.unlike(article.id).await.unwrap());
        assert_eq!(service.get(article.id).await.unwrap().like_count, 0);
    }

    #[tokio::test]
    async fn test_search_sees_only_published() {
        let (service, _tags) = setup_articles().await;

        service
            .save(CreateContentInput::new("Draft piece", "Body"))
            .await
            .unwrap();
        service
            .save(
                CreateContentInput::new("Published piece", "Body")
                    .with_status(ContentStatus::Published),
            )
            .await
            .unwrap();

        let public = service.search(&ContentQuery::new()).await.expect("search");
        assert_eq!(public.total, 1);
        assert_eq!(public.items[0].title, "Published piece");

        let admin = service.page(&ContentQuery::new()).await.expect("page");
        assert_eq!(admin.total, 2);
    }

    #[tokio::test]
    async fn test_news_hot_and_lookup_lists() {
        let service = setup_news().await;

        let mut ext = NewsExt::default();
        ext.category = Some("Tech".to_string());
        ext.source = Some("wired".to_string());
        ext.is_hot = true;
        let hot = service
            .save(
                CreateContentInput::new("Hot story", "Body")
                    .with_status(ContentStatus::Published)
                    .with_ext(ext),
            )
            .await
            .unwrap();
        service
            .save(
                CreateContentInput::new("Quiet story", "Body")
                    .with_status(ContentStatus::Published),
            )
            .await
            .unwrap();

        let listed = service.hot(10).await.expect("hot");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, hot.id);

        assert_eq!(service.categories().await.unwrap(), vec!["Tech"]);
        assert_eq!(service.sources().await.unwrap(), vec!["wired"]);
    }

    #[tokio::test]
    async fn test_article_by_category() {
        let (service, _tags) = setup_articles().await;

        let mut ext = ArticleExt::default();
        ext.category_id = Some(7);
        service
            .save(
                CreateContentInput::new("In category", "Body")
                    .with_status(ContentStatus::Published)
                    .with_ext(ext),
            )
            .await
            .unwrap();
        service
            .save(
                CreateContentInput::new("Elsewhere", "Body")
                    .with_status(ContentStatus::Published),
            )
            .await
            .unwrap();

        let page = service.by_category(7, 1, 10).await.expect("by category");
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "In category");
    }

    #[tokio::test]
    async fn test_stats() {
        let (service, _tags) = setup_articles().await;

        service
            .save(CreateContentInput::new("Draft", "Body"))
            .await
            .unwrap();
        let mut ext = ArticleExt::default();
        ext.is_top = true;
        service
            .save(
                CreateContentInput::new("Pinned", "Body")
                    .with_status(ContentStatus::Published)
                    .with_ext(ext),
            )
            .await
            .unwrap();

        let stats = service.stats().await.expect("stats");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.published, 1);
        assert_eq!(stats.draft, 1);
        assert_eq!(stats.archived, 0);
        assert_eq!(stats.flagged, 1);
    }
}
