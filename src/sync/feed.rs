//! Article feed connector
//!
//! Pulls a JSON list of articles from the configured endpoint and stores new
//! entries as drafts marked with the feed source type, leaving publication to
//! an editor. With no endpoint configured the connector is a no-op.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::IngestConfig;
use crate::models::{ArticleExt, ArticleKind, CreateContentInput, SourceType};
use crate::services::ContentService;
use crate::sync::Connector;

/// One article as delivered by the feed endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct FeedArticle {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// JSON article feed connector
pub struct FeedConnector {
    endpoint: Option<String>,
    client: reqwest::Client,
    service: Arc<ContentService<ArticleKind>>,
}

impl FeedConnector {
    /// Create a connector over the configured feed endpoint
    pub fn new(config: &IngestConfig, service: Arc<ContentService<ArticleKind>>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            endpoint: config.feed_endpoint.clone(),
            client,
            service,
        })
    }

    async fn ingest(&self, articles: Vec<FeedArticle>) -> Result<u64> {
        let mut ingested = 0;

        for article in articles {
            if article.title.trim().is_empty() {
                continue;
            }
            let url = article.url.clone().unwrap_or_default();
            if self.service.exists_by_source(&article.title, &url).await? {
                continue;
            }

            let mut input =
                CreateContentInput::<ArticleKind>::new(article.title.clone(), article.content)
                    .with_tags(article.tags)
                    .with_ext(ArticleExt {
                        category_id: None,
                        source_type: SourceType::Feed,
                        is_top: false,
                    });
            if let Some(summary) = article.summary {
                input = input.with_summary(summary);
            }
            if let Some(url) = article.url {
                input = input.with_source_url(url);
            }
            input.cover_image = article.cover_image;

            match self.service.save(input).await {
                Ok(_) => ingested += 1,
                Err(err) => {
                    tracing::warn!("Skipping feed article '{}': {}", article.title, err);
                }
            }
        }

        Ok(ingested)
    }
}

#[async_trait]
impl Connector for FeedConnector {
    fn name(&self) -> &str {
        "article-feed"
    }

    async fn sync(&self) -> Result<u64> {
        let Some(endpoint) = &self.endpoint else {
            tracing::debug!("Article feed endpoint not configured, skipping");
            return Ok(0);
        };

        let articles: Vec<FeedArticle> = self
            .client
            .get(endpoint)
            .send()
            .await
            .with_context(|| format!("Failed to fetch article feed {}", endpoint))?
            .error_for_status()
            .with_context(|| format!("Article feed {} returned an error status", endpoint))?
            .json()
            .await
            .with_context(|| format!("Failed to parse article feed {}", endpoint))?;

        self.ingest(articles).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxContentRepository, SqlxTagRepository};
    use crate::db::{create_test_pool, migrations::run_migrations};
    use crate::models::ContentStatus;
    use crate::services::TagService;

    async fn setup() -> FeedConnector {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        let tags = Arc::new(TagService::new(SqlxTagRepository::boxed(pool.clone())));
        let service = Arc::new(ContentService::new(
            SqlxContentRepository::boxed(pool),
            tags,
        ));
        FeedConnector::new(&IngestConfig::default(), service).expect("connector")
    }

    #[test]
    fn test_feed_article_deserializes_with_defaults() {
        let article: FeedArticle =
            serde_json::from_str(r#"{"title": "T", "content": "C"}"#).expect("parse");
        assert_eq!(article.title, "T");
        assert!(article.url.is_none());
        assert!(article.tags.is_empty());

        let full: FeedArticle = serde_json::from_str(
            r#"{"title": "T", "content": "C", "url": "https://x/1", "tags": ["a"], "summary": "S"}"#,
        )
        .expect("parse");
        assert_eq!(full.url.as_deref(), Some("https://x/1"));
        assert_eq!(full.tags, vec!["a"]);
    }

    #[tokio::test]
    async fn test_ingest_stores_drafts_with_feed_source() {
        let connector = setup().await;

        let articles = vec![
            FeedArticle {
                title: "Fetched".to_string(),
                content: "Body".to_string(),
                summary: None,
                url: Some("https://x/1".to_string()),
                cover_image: None,
                tags: vec!["sync".to_string()],
            },
            FeedArticle {
                title: "  ".to_string(),
                content: "No title".to_string(),
                summary: None,
                url: None,
                cover_image: None,
                tags: vec![],
            },
        ];

        assert_eq!(connector.ingest(articles).await.expect("ingest"), 1);

        let page = connector
            .service
            .page(&crate::models::ContentQuery::new())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        let stored = &page.items[0];
        assert_eq!(stored.status, ContentStatus::Draft);
        assert_eq!(stored.ext.source_type, SourceType::Feed);
        assert_eq!(stored.tags, vec!["sync"]);
    }

    #[tokio::test]
    async fn test_ingest_dedupes_by_title_and_url() {
        let connector = setup().await;

        let article = FeedArticle {
            title: "Once".to_string(),
            content: "Body".to_string(),
            summary: None,
            url: Some("https://x/once".to_string()),
            cover_image: None,
            tags: vec![],
        };

        assert_eq!(connector.ingest(vec![article.clone()]).await.unwrap(), 1);
        assert_eq!(connector.ingest(vec![article]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sync_without_endpoint_is_noop() {
        let connector = setup().await;
        assert_eq!(connector.sync().await.expect("sync"), 0);
    }
}
