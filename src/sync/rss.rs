//! RSS connector
//!
//! Polls the configured RSS feeds and stores new entries as published news
//! items. Parsing is a tolerant regex scan over RSS 2.0 markup rather than a
//! strict XML parse: feeds in the wild are messy, and every field except the
//! title is optional anyway.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::IngestConfig;
use crate::models::{ContentStatus, CreateContentInput, NewsExt, NewsKind};
use crate::services::ContentService;
use crate::sync::Connector;

static ITEM_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<item[\s>].*?</item>|<item/>").expect("valid regex"));
static TITLE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<title[^>]*>(.*?)</title>").expect("valid regex"));
static LINK_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<link[^>]*>(.*?)</link>").expect("valid regex"));
static DESCRIPTION_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<description[^>]*>(.*?)</description>").expect("valid regex"));
static PUB_DATE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<pubDate[^>]*>(.*?)</pubDate>").expect("valid regex"));
static CATEGORY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<category[^>]*>(.*?)</category>").expect("valid regex"));

/// One entry scanned out of a feed
#[derive(Debug, Clone, PartialEq)]
pub struct RssItem {
    pub title: String,
    pub link: Option<String>,
    pub description: Option<String>,
    pub pub_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
}

/// Unwrap CDATA, decode the XML entities feeds actually use, and trim.
fn clean_text(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
        .unwrap_or(trimmed);
    inner
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

fn field(block: &str, re: &Regex) -> Option<String> {
    re.captures(block)
        .and_then(|caps| caps.get(1))
        .map(|m| clean_text(m.as_str()))
        .filter(|s| !s.is_empty())
}

/// Feed title from the channel header, i.e. the part before the first item
pub fn parse_channel_title(xml: &str) -> Option<String> {
    let header = match xml.find("<item") {
        Some(pos) => &xml[..pos],
        None => xml,
    };
    field(header, &TITLE_TAG)
}

/// Scan all items out of a feed document.
///
/// Items without a title are dropped; an unparseable pubDate is kept as an
/// item without a timestamp.
pub fn parse_items(xml: &str) -> Vec<RssItem> {
    ITEM_BLOCK
        .find_iter(xml)
        .filter_map(|m| {
            let block = m.as_str();
            let title = field(block, &TITLE_TAG)?;
            Some(RssItem {
                title,
                link: field(block, &LINK_TAG),
                description: field(block, &DESCRIPTION_TAG),
                pub_date: field(block, &PUB_DATE_TAG).and_then(|raw| {
                    DateTime::parse_from_rfc2822(&raw)
                        .ok()
                        .map(|dt| dt.with_timezone(&Utc))
                }),
                category: field(block, &CATEGORY_TAG),
            })
        })
        .collect()
}

/// RSS feed connector
pub struct RssConnector {
    sources: Vec<String>,
    client: reqwest::Client,
    service: Arc<ContentService<NewsKind>>,
}

impl RssConnector {
    /// Create a connector over the configured RSS sources
    pub fn new(config: &IngestConfig, service: Arc<ContentService<NewsKind>>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            sources: config.rss_sources.clone(),
            client,
            service,
        })
    }

    async fn sync_source(&self, url: &str) -> Result<u64> {
        let body = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch feed {}", url))?
            .error_for_status()
            .with_context(|| format!("Feed {} returned an error status", url))?
            .text()
            .await
            .with_context(|| format!("Failed to read feed {}", url))?;

        let source_name = parse_channel_title(&body);
        let mut ingested = 0;

        for item in parse_items(&body) {
            let link = item.link.clone().unwrap_or_default();
            if self.service.exists_by_source(&item.title, &link).await? {
                continue;
            }

            let content = item
                .description
                .clone()
                .unwrap_or_else(|| item.title.clone());
            let mut input = CreateContentInput::<NewsKind>::new(item.title.clone(), content)
                .with_status(ContentStatus::Published)
                .with_ext(NewsExt {
                    category: item.category.clone(),
                    source: source_name.clone(),
                    is_hot: false,
                });
            if let Some(link) = item.link.clone() {
                input = input.with_source_url(link);
            }
            if let Some(at) = item.pub_date {
                input = input.with_publish_time(at);
            }

            match self.service.save(input).await {
                Ok(_) => ingested += 1,
                Err(err) => {
                    tracing::warn!("Skipping feed entry '{}': {}", item.title, err);
                }
            }
        }

        Ok(ingested)
    }
}

#[async_trait]
impl Connector for RssConnector {
    fn name(&self) -> &str {
        "rss"
    }

    async fn sync(&self) -> Result<u64> {
        let mut total = 0;
        for url in &self.sources {
            match self.sync_source(url).await {
                Ok(count) => {
                    tracing::info!("Feed {} yielded {} new item(s)", url, count);
                    total += count;
                }
                Err(err) => {
                    tracing::warn!("Skipping feed {}: {:#}", url, err);
                }
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example Wire</title>
    <link>https://example.com</link>
    <item>
      <title><![CDATA[First &amp; foremost]]></title>
      <link>https://example.com/1</link>
      <description>Plain description</description>
      <pubDate>Tue, 05 Aug 2025 09:30:00 +0000</pubDate>
      <category>Tech</category>
    </item>
    <item>
      <title>Bare minimum</title>
    </item>
    <item>
      <description>No title, should be dropped</description>
    </item>
    <item>
      <title>Bad date</title>
      <pubDate>sometime last week</pubDate>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_channel_title() {
        assert_eq!(parse_channel_title(FEED).as_deref(), Some("Example Wire"));
    }

    #[test]
    fn test_parse_items() {
        let items = parse_items(FEED);
        assert_eq!(items.len(), 3);

        assert_eq!(items[0].title, "First & foremost");
        assert_eq!(items[0].link.as_deref(), Some("https://example.com/1"));
        assert_eq!(items[0].description.as_deref(), Some("Plain description"));
        assert_eq!(items[0].category.as_deref(), Some("Tech"));
        let at = items[0].pub_date.expect("parsed date");
        assert_eq!(at.to_rfc3339(), "2025-08-05T09:30:00+00:00");

        assert_eq!(items[1].title, "Bare minimum");
        assert!(items[1].link.is_none());

        // Unparseable dates are tolerated
        assert_eq!(items[2].title, "Bad date");
        assert!(items[2].pub_date.is_none());
    }

    #[test]
    fn test_clean_text_decodes_entities() {
        assert_eq!(clean_text("a &lt;b&gt; &quot;c&quot; &amp; d"), "a <b> \"c\" & d");
        assert_eq!(clean_text("<![CDATA[ kept <raw> ]]>"), "kept <raw>");
    }

    #[test]
    fn test_parse_items_empty_document() {
        assert!(parse_items("<rss><channel></channel></rss>").is_empty());
    }
}
