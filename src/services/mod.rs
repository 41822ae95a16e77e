//! Business logic services

pub mod catalog;
pub mod matching;
pub mod trades;

use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::StoreConfig,
    error::{AppError, AppResult},
    repository::CatalogStore,
};

/// Shared catalog store with a deadline on every call.
///
/// A call that exceeds the deadline fails with a retryable store error.
#[derive(Clone)]
pub struct StoreHandle {
    store: Arc<dyn CatalogStore>,
    timeout: Duration,
}

impl StoreHandle {
    pub fn new(store: Arc<dyn CatalogStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Await `fut` within the store deadline
    pub async fn deadline<T>(&self, operation: &'static str, fut: impl Future<Output = T>) -> AppResult<T> {
        tokio::time::timeout(self.timeout, fut).await.map_err(|_| {
            tracing::warn!(
                operation,
                timeout_ms = self.timeout.as_millis() as u64,
                "Catalog store call timed out"
            );
            AppError::store_timeout(operation)
        })
    }

    /// Await a fallible store call within the store deadline
    pub async fn call<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        self.deadline(operation, fut).await?
    }
}

impl Deref for StoreHandle {
    type Target = dyn CatalogStore;

    fn deref(&self) -> &Self::Target {
        self.store.as_ref()
    }
}

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub store: StoreHandle,
    pub catalog: catalog::CatalogService,
    pub matching: matching::MatchingService,
    pub trades: trades::TradesService,
}

impl Services {
    /// Create all services over the given catalog store
    pub fn new(store: Arc<dyn CatalogStore>, config: &StoreConfig) -> Self {
        let store = StoreHandle::new(store, config.timeout());
        let matching = matching::MatchingService::new(store.clone());
        Self {
            catalog: catalog::CatalogService::new(store.clone()),
            trades: trades::TradesService::new(store.clone(), matching.clone()),
            matching,
            store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryCatalogStore;

    #[tokio::test]
    async fn test_slow_call_times_out_as_retryable() {
        let handle = StoreHandle::new(Arc::new(MemoryCatalogStore::new()), Duration::from_millis(10));
        let err = handle
            .call("get_user", async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Store { retryable: true, .. }));
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let handle = StoreHandle::new(Arc::new(MemoryCatalogStore::new()), Duration::from_secs(1));
        assert_eq!(handle.call("ping", async { Ok(7) }).await.unwrap(), 7);
        assert!(handle.call("ping", handle.ping()).await.is_ok());
    }
}
