//! Newsdesk - content management backend for articles and aggregated news

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsdesk::{
    config::Config,
    db::{
        self,
        repositories::{SqlxCategoryRepository, SqlxContentRepository, SqlxTagRepository},
    },
    models::{ArticleKind, CategoryKind, NewsKind},
    services::{CategoryService, ContentService, TagService},
    sync::{self, Connector, FeedConnector, RssConnector},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsdesk=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Newsdesk...");

    // Load configuration
    let config = Config::load("config.toml")?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    // Run migrations
    let applied = db::migrations::run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!("Applied {} database migration(s)", applied);
    }

    // Wire up services
    let tag_service = Arc::new(TagService::new(SqlxTagRepository::boxed(pool.clone())));
    let category_service = Arc::new(CategoryService::new(SqlxCategoryRepository::boxed(
        pool.clone(),
    )));
    let article_service = Arc::new(ContentService::<ArticleKind>::new(
        SqlxContentRepository::boxed(pool.clone()),
        tag_service.clone(),
    ));
    let news_service = Arc::new(ContentService::<NewsKind>::new(
        SqlxContentRepository::boxed(pool.clone()),
        tag_service.clone(),
    ));

    // Run the configured ingestion connectors
    let connectors: Vec<Arc<dyn Connector>> = vec![
        Arc::new(RssConnector::new(&config.ingest, news_service.clone())?),
        Arc::new(FeedConnector::new(&config.ingest, article_service.clone())?),
    ];
    let ingested = sync::run_all(&connectors).await;
    tracing::info!("Ingestion finished: {} new item(s)", ingested);

    // Report store contents
    let article_stats = article_service.stats().await?;
    let news_stats = news_service.stats().await?;
    let tag_stats = tag_service.stats().await?;
    let article_tree = category_service.build_tree(CategoryKind::Article).await?;
    let news_tree = category_service.build_tree(CategoryKind::News).await?;
    tracing::info!(
        "Store: {} article(s) ({} published), {} news item(s) ({} published), {} tag(s), {} category tree root(s)",
        article_stats.total,
        article_stats.published,
        news_stats.total,
        news_stats.published,
        tag_stats.total,
        article_tree.len() + news_tree.len()
    );

    // Tag usage counters drift as content changes; recompute after ingestion
    let corrected = tag_service.recount_usage().await?;
    if corrected > 0 {
        tracing::info!("Corrected usage count on {} tag(s)", corrected);
    }

    Ok(())
}
