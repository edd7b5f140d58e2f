//! Query and pagination types
//!
//! This module provides:
//! - `PageQuery` for simple paged listings
//! - `ContentQuery` carrying the dynamic content filters
//! - `SortField` allow-list and `SortOrder`
//! - `PagedResult<T>` container

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::ContentStatus;

/// Pagination parameters for list queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageQuery {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub page_size: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
        }
    }
}

impl PageQuery {
    /// Create new pagination parameters.
    ///
    /// Page is floored at 1; page size is clamped to 1..=100.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        ((self.page.saturating_sub(1)) * self.page_size) as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

/// Sortable content columns.
///
/// This is a closed allow-list; caller-supplied sort names that do not parse
/// fall back to `PublishTime`, and only these identifiers ever reach SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    PublishTime,
    CreatedAt,
    UpdatedAt,
    ViewCount,
    LikeCount,
}

impl Default for SortField {
    fn default() -> Self {
        Self::PublishTime
    }
}

impl SortField {
    /// Column name used in ORDER BY clauses
    pub fn column(&self) -> &'static str {
        match self {
            SortField::PublishTime => "publish_time",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::ViewCount => "view_count",
            SortField::LikeCount => "like_count",
        }
    }

    /// Parse a caller-supplied sort field name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "publish_time" => Some(SortField::PublishTime),
            "created_at" => Some(SortField::CreatedAt),
            "updated_at" => Some(SortField::UpdatedAt),
            "view_count" => Some(SortField::ViewCount),
            "like_count" => Some(SortField::LikeCount),
            _ => None,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::Desc
    }
}

impl SortOrder {
    /// SQL keyword for this direction
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Dynamic filter, sort and pagination parameters for content queries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentQuery {
    /// Pagination
    pub page: Option<PageQuery>,
    /// Sort column (falls back to publish_time)
    pub sort_field: Option<SortField>,
    /// Sort direction (defaults to descending)
    pub sort_order: Option<SortOrder>,
    /// Case-insensitive substring match over title, content and summary
    pub keyword: Option<String>,
    /// Article category filter (tree node id)
    pub category_id: Option<i64>,
    /// News category filter (free-text label)
    pub category: Option<String>,
    /// News source filter
    pub source: Option<String>,
    /// Single tag name filter
    pub tag: Option<String>,
    /// Status filter (ignored by public listings, which force Published)
    pub status: Option<ContentStatus>,
    /// Kind flag filter (is_top for articles, is_hot for news)
    pub flagged: Option<bool>,
    /// Earliest publish time (inclusive)
    pub start_time: Option<DateTime<Utc>>,
    /// Latest publish time (inclusive)
    pub end_time: Option<DateTime<Utc>>,
}

impl ContentQuery {
    /// Create an empty query (first page, default size, publish_time desc)
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective pagination, normalized
    pub fn page(&self) -> PageQuery {
        let p = self.page.clone().unwrap_or_default();
        PageQuery::new(p.page, p.page_size)
    }

    /// Effective sort column
    pub fn sort_field(&self) -> SortField {
        self.sort_field.unwrap_or_default()
    }

    /// Effective sort direction
    pub fn sort_order(&self) -> SortOrder {
        self.sort_order.unwrap_or_default()
    }

    /// Set the page
    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = Some(PageQuery::new(page, page_size));
        self
    }

    /// Set the sort column and direction
    pub fn with_sort(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_field = Some(field);
        self.sort_order = Some(order);
        self
    }

    /// Set the keyword filter
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Set the article category filter
    pub fn with_category_id(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Set the news category label filter
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the news source filter
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the tag filter
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Set the status filter
    pub fn with_status(mut self, status: ContentStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the kind flag filter
    pub fn with_flagged(mut self, flagged: bool) -> Self {
        self.flagged = Some(flagged);
        self
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub page_size: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, page: &PageQuery) -> Self {
        Self {
            items,
            total,
            page: page.page,
            page_size: page.page_size,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        ((self.total as u32) + self.page_size - 1) / self.page_size
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of items in the current page
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            page_size: 10,
        }
    }
}
