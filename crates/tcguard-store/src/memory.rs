//! Process-local store. Contents are lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tcguard_core::{CachedAnalysis, ContractFingerprint, NegotiationRecord};
use tokio::sync::RwLock;

use crate::{CacheStore, NegotiationStore, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    contracts: RwLock<HashMap<ContractFingerprint, CachedAnalysis>>,
    negotiations: RwLock<HashMap<String, NegotiationRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contract_count(&self) -> usize {
        self.contracts.read().await.len()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(
        &self,
        fingerprint: &ContractFingerprint,
    ) -> Result<Option<CachedAnalysis>, StoreError> {
        Ok(self.contracts.read().await.get(fingerprint).cloned())
    }

    async fn put(&self, record: CachedAnalysis) -> Result<(), StoreError> {
        self.contracts
            .write()
            .await
            .insert(record.fingerprint.clone(), record);
        Ok(())
    }

    async fn increment_access_count(
        &self,
        fingerprint: &ContractFingerprint,
    ) -> Result<(), StoreError> {
        if let Some(record) = self.contracts.write().await.get_mut(fingerprint) {
            record.access_count = record.access_count.saturating_add(1);
        }
        Ok(())
    }
}

#[async_trait]
impl NegotiationStore for MemoryStore {
    async fn save_negotiation(&self, record: &NegotiationRecord) -> Result<(), StoreError> {
        self.negotiations
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn get_negotiation(&self, id: &str) -> Result<Option<NegotiationRecord>, StoreError> {
        Ok(self.negotiations.read().await.get(id).cloned())
    }

    async fn list_negotiations(
        &self,
        user_id: &str,
    ) -> Result<Vec<NegotiationRecord>, StoreError> {
        let mut records: Vec<NegotiationRecord> = self
            .negotiations
            .read()
            .await
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn update_negotiation(&self, record: &NegotiationRecord) -> Result<(), StoreError> {
        let mut negotiations = self.negotiations.write().await;
        match negotiations.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(record.id.clone())),
        }
    }
}
