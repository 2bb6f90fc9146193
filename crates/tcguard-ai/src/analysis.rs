//! Analysis orchestration: cache check, model call, normalisation, write-through.
//!
//! Every model or store failure is absorbed here. Callers only ever see
//! [`AnalysisError::EmptyInput`]; anything else ends in a labelled fallback
//! result that is never written to the cache.

use std::sync::Arc;

use tcguard_core::normalize::parse_model_response;
use tcguard_core::{
    AnalysisResult, CacheMetadata, ContractFingerprint, Jurisdiction, NormalizeError,
    fallback_analysis, fingerprint,
};
use tcguard_store::{AnalysisCache, StoreError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::model::{ModelClient, ModelConfig, ModelError};
use crate::prompt::build_analysis_request;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Contract text cannot be empty")]
    EmptyInput,
    #[error("cache store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
    #[error("model unreachable: {0}")]
    ModelUnreachable(String),
    #[error("model quota exceeded: {0}")]
    ModelQuotaExceeded(String),
    #[error("failed to parse model response: {0}")]
    ResponseParseFailure(String),
    #[error("model response has no `analysis_result` object")]
    InvalidResponseShape,
    #[error("no model credential configured")]
    ModelNotConfigured,
}

impl From<ModelError> for AnalysisError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::QuotaExceeded(body) => Self::ModelQuotaExceeded(body),
            ModelError::Json(inner) => Self::ResponseParseFailure(inner.to_string()),
            ModelError::EmptyResponse => {
                Self::ResponseParseFailure("model returned no text".into())
            }
            other => Self::ModelUnreachable(other.to_string()),
        }
    }
}

impl From<NormalizeError> for AnalysisError {
    fn from(e: NormalizeError) -> Self {
        match e {
            NormalizeError::MissingAnalysisResult => Self::InvalidResponseShape,
            other => Self::ResponseParseFailure(other.to_string()),
        }
    }
}

/// Where a returned result came from. Not part of the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisSource {
    Cache,
    Model,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub fingerprint: ContractFingerprint,
    pub result: AnalysisResult,
    pub source: AnalysisSource,
}

/// Analyse contract text, serving repeated text from the cache.
///
/// Without a model client the service runs in permanent fallback mode.
#[derive(Clone)]
pub struct AnalysisService {
    cache: AnalysisCache,
    model: Option<Arc<dyn ModelClient>>,
    config: ModelConfig,
}

impl AnalysisService {
    pub fn new(
        cache: AnalysisCache,
        model: Option<Arc<dyn ModelClient>>,
        config: ModelConfig,
    ) -> Self {
        if model.is_none() {
            warn!("no model credential configured, analysis will return fallback results");
        }
        Self {
            cache,
            model,
            config,
        }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub async fn analyze(
        &self,
        text: &str,
        jurisdiction: Jurisdiction,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyInput);
        }
        let fingerprint = fingerprint(text);

        match self.cache.get(&fingerprint).await {
            Ok(Some(cached)) => {
                self.cache.increment_access_count(&fingerprint);
                return Ok(AnalysisOutcome {
                    fingerprint,
                    result: cached.analysis,
                    source: AnalysisSource::Cache,
                });
            }
            Ok(None) => {}
            Err(e) => {
                let e = AnalysisError::from(e);
                warn!(%fingerprint, error = %e, "cache lookup failed, treating as miss");
            }
        }

        match self.call_model(text, jurisdiction).await {
            Ok(result) => {
                info!(
                    %fingerprint,
                    %jurisdiction,
                    clauses = result.clauses.len(),
                    danger = result.overall_danger_score,
                    "analysis complete"
                );
                self.cache
                    .put(&fingerprint, &result, CacheMetadata::default())
                    .await;
                Ok(AnalysisOutcome {
                    fingerprint,
                    result,
                    source: AnalysisSource::Model,
                })
            }
            Err(e) => {
                match &e {
                    AnalysisError::ModelNotConfigured => {
                        warn!(%fingerprint, "model not configured, returning fallback")
                    }
                    _ => error!(%fingerprint, error = %e, "analysis failed, returning fallback"),
                }
                Ok(AnalysisOutcome {
                    fingerprint,
                    result: fallback_analysis(),
                    source: AnalysisSource::Fallback,
                })
            }
        }
    }

    async fn call_model(
        &self,
        text: &str,
        jurisdiction: Jurisdiction,
    ) -> Result<AnalysisResult, AnalysisError> {
        let model = self
            .model
            .as_ref()
            .ok_or(AnalysisError::ModelNotConfigured)?;
        let request = build_analysis_request(&self.config, jurisdiction, text);
        let raw = model.generate(&request).await?;
        parse_model_response(&raw).map_err(|e| {
            debug!(raw = %raw, "unparsable model response");
            AnalysisError::from(e)
        })
    }
}
