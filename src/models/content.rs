//! Content model
//!
//! This module provides:
//! - `ContentItem<K>` entity shared by articles and aggregated news
//! - `ContentKind` trait with the `ArticleKind` / `NewsKind` markers
//! - `ContentStatus` enum for publication states
//! - Input types for creating and updating content

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::tag::TagKind;

/// Marker trait for a content kind.
///
/// Articles and news items share the same lifecycle, counters and tag
/// handling; they differ only in a small set of extension fields. A kind
/// marker carries those fields as `Ext` so one repository and one service
/// implementation serve both.
pub trait ContentKind: std::fmt::Debug + Clone + Copy + Send + Sync + Unpin + 'static {
    /// Kind-specific fields stored alongside the shared columns
    type Ext: std::fmt::Debug
        + Clone
        + Default
        + PartialEq
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + Unpin
        + 'static;

    /// Kind name used in logs
    const NAME: &'static str;

    /// Tag namespace this kind resolves tag names in
    const TAG_KIND: TagKind;
}

/// Marker for long-form articles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArticleKind;

/// Marker for aggregated news items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewsKind;

impl ContentKind for ArticleKind {
    type Ext = ArticleExt;
    const NAME: &'static str = "article";
    const TAG_KIND: TagKind = TagKind::Article;
}

impl ContentKind for NewsKind {
    type Ext = NewsExt;
    const NAME: &'static str = "news";
    const TAG_KIND: TagKind = TagKind::News;
}

/// Content entity shared by articles and news items
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub struct ContentItem<K: ContentKind> {
    /// Unique identifier
    pub id: i64,
    /// Title
    pub title: String,
    /// Body content
    pub content: String,
    /// Short summary, derived from content when not supplied
    pub summary: Option<String>,
    /// Cover image URL
    pub cover_image: Option<String>,
    /// Tag names, ordered; stored denormalized as a JSON array
    #[serde(default)]
    pub tags: Vec<String>,
    /// Original source URL (used for ingestion dedup)
    pub source_url: Option<String>,
    /// Publication status
    pub status: ContentStatus,
    /// View count
    #[serde(default)]
    pub view_count: i64,
    /// Like count
    #[serde(default)]
    pub like_count: i64,
    /// Publication timestamp; never reset once set
    pub publish_time: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Kind-specific fields
    #[serde(flatten)]
    pub ext: K::Ext,
}

impl<K: ContentKind> ContentItem<K> {
    /// Create a new content item with the given parameters
    pub fn new(title: String, content: String, status: ContentStatus) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by database
            title,
            content,
            summary: None,
            cover_image: None,
            tags: Vec::new(),
            source_url: None,
            status,
            view_count: 0,
            like_count: 0,
            publish_time: None,
            created_at: now,
            updated_at: now,
            ext: K::Ext::default(),
        }
    }

    /// Whether the item is visible to public listings
    pub fn is_published(&self) -> bool {
        self.status == ContentStatus::Published
    }
}

/// Article-specific fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleExt {
    /// Category ID (tree node reference)
    pub category_id: Option<i64>,
    /// Where the article came from
    #[serde(default)]
    pub source_type: SourceType,
    /// Pinned to the top of listings
    #[serde(default)]
    pub is_top: bool,
}

impl Default for ArticleExt {
    fn default() -> Self {
        Self {
            category_id: None,
            source_type: SourceType::Manual,
            is_top: false,
        }
    }
}

/// News-specific fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsExt {
    /// Free-text category label as reported by the source
    pub category: Option<String>,
    /// Source name
    pub source: Option<String>,
    /// Highlighted in hot listings
    #[serde(default)]
    pub is_hot: bool,
}

/// Content publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    /// Draft - not visible to public
    Draft,
    /// Published - visible to public
    Published,
    /// Archived - hidden but not deleted
    Archived,
}

impl Default for ContentStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl ContentStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
            ContentStatus::Archived => "archived",
        }
    }

    /// Parse status from database string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(ContentStatus::Draft),
            "published" => Some(ContentStatus::Published),
            "archived" => Some(ContentStatus::Archived),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Origin of an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Authored in the backend
    Manual,
    /// Ingested from the article feed connector
    Feed,
}

impl Default for SourceType {
    fn default() -> Self {
        Self::Manual
    }
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Manual => "manual",
            SourceType::Feed => "feed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "manual" => Some(SourceType::Manual),
            "feed" => Some(SourceType::Feed),
            _ => None,
        }
    }
}

/// Input for creating a new content item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub struct CreateContentInput<K: ContentKind> {
    /// Title
    pub title: String,
    /// Body content
    pub content: String,
    /// Summary (derived from content when omitted)
    pub summary: Option<String>,
    /// Cover image URL
    pub cover_image: Option<String>,
    /// Tag names to resolve and attach
    #[serde(default)]
    pub tags: Vec<String>,
    /// Original source URL
    pub source_url: Option<String>,
    /// Publication status (defaults to Draft)
    pub status: Option<ContentStatus>,
    /// Explicit publication timestamp
    pub publish_time: Option<DateTime<Utc>>,
    /// Kind-specific fields
    #[serde(flatten)]
    pub ext: K::Ext,
}

impl<K: ContentKind> CreateContentInput<K> {
    /// Create a new CreateContentInput
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            summary: None,
            cover_image: None,
            tags: Vec::new(),
            source_url: None,
            status: None,
            publish_time: None,
            ext: K::Ext::default(),
        }
    }

    /// Set the summary
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Set the tag names
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the source URL
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: ContentStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set an explicit publication timestamp
    pub fn with_publish_time(mut self, at: DateTime<Utc>) -> Self {
        self.publish_time = Some(at);
        self
    }

    /// Set the kind-specific fields
    pub fn with_ext(mut self, ext: K::Ext) -> Self {
        self.ext = ext;
        self
    }
}

/// Input for updating an existing content item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub struct UpdateContentInput<K: ContentKind> {
    /// New title (optional)
    pub title: Option<String>,
    /// New body content (optional)
    pub content: Option<String>,
    /// New summary (optional)
    pub summary: Option<String>,
    /// New cover image URL (optional)
    pub cover_image: Option<String>,
    /// New tag names (optional, replaces the whole list)
    pub tags: Option<Vec<String>>,
    /// New source URL (optional)
    pub source_url: Option<String>,
    /// New status (optional)
    pub status: Option<ContentStatus>,
    /// Explicit publication timestamp (optional)
    pub publish_time: Option<DateTime<Utc>>,
    /// New kind-specific fields (optional, replaces the whole set)
    pub ext: Option<K::Ext>,
}

impl<K: ContentKind> Default for UpdateContentInput<K> {
    fn default() -> Self {
        Self {
            title: None,
            content: None,
            summary: None,
            cover_image: None,
            tags: None,
            source_url: None,
            status: None,
            publish_time: None,
            ext: None,
        }
    }
}

impl<K: ContentKind> UpdateContentInput<K> {
    /// Create a new empty UpdateContentInput
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the content
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the tag names
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: ContentStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set an explicit publication timestamp
    pub fn with_publish_time(mut self, at: DateTime<Utc>) -> Self {
        self.publish_time = Some(at);
        self
    }

    /// Set the kind-specific fields
    pub fn with_ext(mut self, ext: K::Ext) -> Self {
        self.ext = Some(ext);
        self
    }

    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.content.is_some()
            || self.summary.is_some()
            || self.cover_image.is_some()
            || self.tags.is_some()
            || self.source_url.is_some()
            || self.status.is_some()
            || self.publish_time.is_some()
            || self.ext.is_some()
    }
}
