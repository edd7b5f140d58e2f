//! Ingestion connectors
//!
//! Connectors pull content from configured external sources into the store:
//! RSS feeds become published news items, the JSON article feed becomes draft
//! articles. Every connector reads its sources from configuration and dedups
//! against existing rows by title and source URL.

pub mod feed;
pub mod rss;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

pub use feed::FeedConnector;
pub use rss::RssConnector;

/// A pull-based content source
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connector name used in logs
    fn name(&self) -> &str;

    /// Fetch from all configured sources, returning the number of new items
    async fn sync(&self) -> Result<u64>;
}

/// Run every connector, tolerating individual failures.
///
/// Returns the total number of newly ingested items.
pub async fn run_all(connectors: &[Arc<dyn Connector>]) -> u64 {
    let results = futures::future::join_all(connectors.iter().map(|connector| async move {
        let outcome = connector.sync().await;
        (connector.name().to_string(), outcome)
    }))
    .await;

    let mut total = 0;
    for (name, outcome) in results {
        match outcome {
            Ok(count) => {
                tracing::info!("Connector {} ingested {} item(s)", name, count);
                total += count;
            }
            Err(err) => {
                tracing::warn!("Connector {} failed: {:#}", name, err);
            }
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedConnector {
        count: u64,
        fail: bool,
    }

    #[async_trait]
    impl Connector for FixedConnector {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn sync(&self) -> Result<u64> {
            if self.fail {
                anyhow::bail!("source unreachable");
            }
            Ok(self.count)
        }
    }

    #[tokio::test]
    async fn test_run_all_tolerates_failures() {
        let connectors: Vec<Arc<dyn Connector>> = vec![
            Arc::new(FixedConnector {
                count: 3,
                fail: false,
            }),
            Arc::new(FixedConnector {
                count: 0,
                fail: true,
            }),
            Arc::new(FixedConnector {
                count: 2,
                fail: false,
            }),
        ];

        assert_eq!(run_all(&connectors).await, 5);
    }
}
