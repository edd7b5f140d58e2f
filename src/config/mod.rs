//! Configuration management
//!
//! Configuration is read from a TOML file with serde defaults for every
//! field, so a missing or partial file still yields a runnable setup. The
//! database URL can be overridden with `NEWSDESK_DATABASE_URL`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Database settings
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Ingestion connector settings
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path or URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

/// Ingestion connector configuration.
///
/// Connectors only ever read their sources from here; an empty list or a
/// missing endpoint simply disables the connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// RSS feed URLs polled by the news connector
    #[serde(default)]
    pub rss_sources: Vec<String>,
    /// JSON article feed endpoint, disabled when absent
    #[serde(default)]
    pub feed_endpoint: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            rss_sources: Vec::new(),
            feed_endpoint: None,
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

fn default_database_url() -> String {
    "data/newsdesk.db".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// A missing file is not an error; defaults are used instead. The
    /// `NEWSDESK_DATABASE_URL` environment variable always wins over the
    /// file's database URL.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            tracing::info!(
                "Config file {} not found, using defaults",
                path.display()
            );
            Config::default()
        };

        if let Ok(url) = std::env::var("NEWSDESK_DATABASE_URL") {
            if !url.trim().is_empty() {
                config.database.url = url;
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database.url, "data/newsdesk.db");
        assert!(config.ingest.rss_sources.is_empty());
        assert!(config.ingest.feed_endpoint.is_none());
        assert_eq!(config.ingest.fetch_timeout_secs, 10);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load("/nonexistent/config.toml").expect("load");
        assert_eq!(config.database.url, "data/newsdesk.db");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"
[ingest]
rss_sources = ["https://example.com/feed.xml"]
feed_endpoint = "https://example.com/articles"
"#
        )
        .expect("write");

        let config = Config::load(file.path()).expect("load");
        // Unspecified sections fall back to defaults
        assert_eq!(config.database.url, "data/newsdesk.db");
        assert_eq!(config.ingest.rss_sources.len(), 1);
        assert_eq!(
            config.ingest.feed_endpoint.as_deref(),
            Some("https://example.com/articles")
        );
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "not [valid toml").expect("write");

        assert!(Config::load(file.path()).is_err());
    }
}
