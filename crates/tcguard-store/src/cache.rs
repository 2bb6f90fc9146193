//! Cache adapter between the orchestrator and an optional [`CacheStore`].
//!
//! The cache is an optimisation, never a dependency of the answer:
//! - no backend configured: every read is a miss, every write a no-op;
//! - a failed read is returned to the caller, which treats it as a miss;
//! - a failed write is logged and swallowed;
//! - access-count increments run detached and may be lost.

use std::sync::Arc;

use tcguard_core::{AnalysisResult, CacheMetadata, CachedAnalysis, ContractFingerprint};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{CacheStore, StoreError};

#[derive(Clone, Default)]
pub struct AnalysisCache {
    store: Option<Arc<dyn CacheStore>>,
}

impl AnalysisCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Caching disabled: reads miss, writes are dropped.
    pub fn disabled() -> Self {
        Self { store: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub async fn get(
        &self,
        fingerprint: &ContractFingerprint,
    ) -> Result<Option<CachedAnalysis>, StoreError> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        let found = store.get(fingerprint).await?;
        match &found {
            Some(_) => info!(%fingerprint, "cache hit"),
            None => debug!(%fingerprint, "cache miss"),
        }
        Ok(found)
    }

    /// Write-through upsert. Store errors are logged, never returned.
    pub async fn put(
        &self,
        fingerprint: &ContractFingerprint,
        analysis: &AnalysisResult,
        metadata: CacheMetadata,
    ) {
        let Some(store) = &self.store else {
            return;
        };
        let record = CachedAnalysis::new(fingerprint.clone(), analysis.clone(), metadata);
        match store.put(record).await {
            Ok(()) => info!(%fingerprint, "cache saved"),
            Err(e) => warn!(%fingerprint, error = %e, "cache save failed"),
        }
    }

    /// Bump the access counter without waiting for it.
    ///
    /// The returned handle exists for tests; callers are free to drop it.
    /// Must be called from within a Tokio runtime.
    pub fn increment_access_count(
        &self,
        fingerprint: &ContractFingerprint,
    ) -> Option<JoinHandle<()>> {
        let store = self.store.clone()?;
        let fingerprint = fingerprint.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = store.increment_access_count(&fingerprint).await {
                warn!(%fingerprint, error = %e, "failed to increment cache access count");
            }
        }))
    }
}
