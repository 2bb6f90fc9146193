//! Storage layer: the fingerprint-keyed analysis cache and negotiation records.
//!
//! Backends implement [`CacheStore`] and [`NegotiationStore`]. [`MemoryStore`]
//! is always available; [`DuckStore`] (DuckDB, file-backed) sits behind the
//! `duckdb` feature. [`AnalysisCache`] wraps an optional backend with the
//! degrade-to-no-cache policy the orchestrator relies on.

use async_trait::async_trait;
use tcguard_core::{CachedAnalysis, ContractFingerprint, NegotiationRecord};

mod cache;
mod error;
mod memory;

pub use cache::AnalysisCache;
pub use error::StoreError;
pub use memory::MemoryStore;

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckStore;

/// Keyed document store for [`CachedAnalysis`] records.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, fingerprint: &ContractFingerprint)
    -> Result<Option<CachedAnalysis>, StoreError>;

    /// Upsert; the last writer wins.
    async fn put(&self, record: CachedAnalysis) -> Result<(), StoreError>;

    /// Add one to `access_count`. A missing record is not an error.
    async fn increment_access_count(
        &self,
        fingerprint: &ContractFingerprint,
    ) -> Result<(), StoreError>;
}

/// Keyed document store for [`NegotiationRecord`]s.
#[async_trait]
pub trait NegotiationStore: Send + Sync {
    async fn save_negotiation(&self, record: &NegotiationRecord) -> Result<(), StoreError>;

    async fn get_negotiation(&self, id: &str) -> Result<Option<NegotiationRecord>, StoreError>;

    /// All negotiations for a user, oldest first.
    async fn list_negotiations(&self, user_id: &str)
    -> Result<Vec<NegotiationRecord>, StoreError>;

    /// Replace a stored record. Fails with [`StoreError::NotFound`] if absent.
    async fn update_negotiation(&self, record: &NegotiationRecord) -> Result<(), StoreError>;
}
