use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::RwLock;

use crate::adaptive::error::{AdaptiveError, AdaptiveResult};
use crate::adaptive::types::CatalogItem;

/// Where candidate content comes from. Implementations may hit the network;
/// callers bound every fetch with [`fetch_with_timeout`].
pub trait CatalogSource: Send + Sync {
    fn fetch(&self) -> BoxFuture<'_, AdaptiveResult<Arc<Vec<CatalogItem>>>>;
}

#[derive(Default)]
pub struct InMemoryCatalog {
    items: RwLock<Arc<Vec<CatalogItem>>>,
}

impl InMemoryCatalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            items: RwLock::new(Arc::new(items)),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> AdaptiveResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            AdaptiveError::config(format!("cannot read catalog {}: {err}", path.display()))
        })?;
        let items: Vec<CatalogItem> = serde_json::from_str(&raw)
            .map_err(|err| AdaptiveError::config(format!("invalid catalog file: {err}")))?;
        Ok(Self::new(items))
    }

    pub fn replace(&self, items: Vec<CatalogItem>) -> usize {
        let count = items.len();
        *self.items.write() = Arc::new(items);
        count
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CatalogSource for InMemoryCatalog {
    fn fetch(&self) -> BoxFuture<'_, AdaptiveResult<Arc<Vec<CatalogItem>>>> {
        let items = Arc::clone(&self.items.read());
        async move { Ok(items) }.boxed()
    }
}

pub async fn fetch_with_timeout(
    source: &dyn CatalogSource,
    budget: Duration,
) -> AdaptiveResult<Arc<Vec<CatalogItem>>> {
    match tokio::time::timeout(budget, source.fetch()).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(budget_ms = budget.as_millis() as u64, "catalog fetch timed out");
            Err(AdaptiveError::Timeout {
                operation: "catalog fetch",
                budget_ms: budget.as_millis() as u64,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowCatalog;

    impl CatalogSource for SlowCatalog {
        fn fetch(&self) -> BoxFuture<'_, AdaptiveResult<Arc<Vec<CatalogItem>>>> {
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(Arc::new(Vec::new()))
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn slow_source_times_out() {
        let err = fetch_with_timeout(&SlowCatalog, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, AdaptiveError::Timeout { budget_ms: 20, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn in_memory_catalog_can_be_replaced() {
        let catalog = InMemoryCatalog::default();
        assert!(catalog.is_empty());
        let item: CatalogItem =
            serde_json::from_str(r#"{"id": "a", "title": "Intro"}"#).unwrap();
        assert_eq!(catalog.replace(vec![item]), 1);

        let items = fetch_with_timeout(&catalog, Duration::from_secs(1)).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].cognitive_load, 0.5);
    }
}
