//! Negotiation bookkeeping and contest-email drafting.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tcguard_core::{NegotiationPayload, NegotiationRecord};
use tcguard_store::{NegotiationStore, StoreError};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::model::{ModelClient, ModelConfig, ModelError};
use crate::prompt::{DEFAULT_EMAIL_TONE, build_email_request};

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("Negotiation {0} not found")]
    NotFound(String),
    #[error("Google API key is required for email generation")]
    NotConfigured,
    #[error("failed to generate email: {0}")]
    Model(#[from] ModelError),
    #[error("negotiation store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub negotiation_id: String,
    pub email_content: String,
}

#[derive(Clone)]
pub struct NegotiationService {
    store: Option<Arc<dyn NegotiationStore>>,
    model: Option<Arc<dyn ModelClient>>,
    config: ModelConfig,
}

impl NegotiationService {
    pub fn new(
        store: Option<Arc<dyn NegotiationStore>>,
        model: Option<Arc<dyn ModelClient>>,
        config: ModelConfig,
    ) -> Self {
        Self {
            store,
            model,
            config,
        }
    }

    /// Build a draft record and persist it best-effort.
    ///
    /// The record is returned even when it could not be stored.
    pub async fn create(&self, payload: NegotiationPayload) -> NegotiationRecord {
        let (party, clause) = payload.into_parts();
        let record = NegotiationRecord::new(party, clause);

        match &self.store {
            Some(store) => match store.save_negotiation(&record).await {
                Ok(()) => info!(id = %record.id, user = %record.user_id, "saved negotiation"),
                Err(e) => error!(id = %record.id, error = %e, "failed to save negotiation"),
            },
            None => warn!(id = %record.id, "no store configured, negotiation not persisted"),
        }
        record
    }

    /// A user's negotiations, oldest first. Empty when no store is configured.
    pub async fn list(&self, user_id: &str) -> Result<Vec<NegotiationRecord>, NegotiationError> {
        let Some(store) = &self.store else {
            return Ok(Vec::new());
        };
        Ok(store.list_negotiations(user_id).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Option<NegotiationRecord>, NegotiationError> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        Ok(store.get_negotiation(id).await?)
    }

    /// Draft a rewritten clause plus contest email, and store it on the record.
    ///
    /// `tone` defaults to `firm`. There is no fallback draft: a missing model
    /// credential is an error.
    pub async fn generate_email(
        &self,
        id: &str,
        tone: Option<&str>,
    ) -> Result<EmailDraft, NegotiationError> {
        let record = self
            .get(id)
            .await?
            .ok_or_else(|| NegotiationError::NotFound(id.to_string()))?;
        let model = self.model.as_ref().ok_or(NegotiationError::NotConfigured)?;

        let tone = tone.filter(|t| !t.trim().is_empty()).unwrap_or(DEFAULT_EMAIL_TONE);
        let request =
            build_email_request(&self.config, &record.clause(), &record.company_name, tone);
        let email_content = model.generate(&request).await.map_err(|e| {
            error!(id = %id, error = %e, "email generation failed");
            NegotiationError::from(e)
        })?;

        let updated = record.with_email(email_content.clone());
        if let Some(store) = &self.store {
            store.update_negotiation(&updated).await?;
            info!(id = %id, tone, "stored email draft");
        }
        Ok(EmailDraft {
            negotiation_id: updated.id,
            email_content,
        })
    }
}
