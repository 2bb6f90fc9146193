//! Core types, content fingerprints, jurisdiction policies, and response normalisation.

pub mod analysis;
pub mod fallback;
pub mod fingerprint;
pub mod jurisdiction;
pub mod negotiation;
pub mod normalize;

pub use analysis::{AnalysisResult, AnalyzeResponse, CacheMetadata, CachedAnalysis, ClauseAnalysis};
pub use fallback::{FALLBACK_FLAG, fallback_analysis, is_fallback};
pub use fingerprint::{ContractFingerprint, fingerprint};
pub use jurisdiction::{GENERIC_LEGAL_REFERENCES, Jurisdiction, legal_references};
pub use negotiation::{NegotiationParty, NegotiationPayload, NegotiationRecord, NegotiationStatus};
pub use normalize::NormalizeError;
