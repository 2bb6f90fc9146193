//! Clause-level analysis types shared by the cache, the orchestrator, and the HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ContractFingerprint;

/// One flagged clause inside an [`AnalysisResult`].
///
/// `category` is an open string. The prompt asks for one of
/// `Data Rights | Arbitration | Financial | IP Ownership | Other`, but models
/// and legacy payloads produce others ("Liability", "Unknown").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseAnalysis {
    pub id: String,
    pub clause_text: String,
    pub category: String,
    #[serde(default)]
    pub simplified_explanation: String,
    /// 1 (benign) to 10 (predatory).
    pub severity_score: u8,
    pub legal_context: String,
    pub actionable_step: String,
    #[serde(default)]
    pub flags: Vec<String>,
}

impl ClauseAnalysis {
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

/// Structured risk assessment of one contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Advisory, at most two sentences.
    pub document_summary: String,
    /// 0 (safe) to 100 (predatory).
    pub overall_danger_score: u8,
    /// May be empty for a safe document.
    #[serde(default)]
    pub clauses: Vec<ClauseAnalysis>,
}

/// Wire shape of the analyze operation and of model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub analysis_result: AnalysisResult,
}

impl From<AnalysisResult> for AnalyzeResponse {
    fn from(analysis_result: AnalysisResult) -> Self {
        Self { analysis_result }
    }
}

/// Descriptive fields written alongside a cached analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub company_name: String,
    pub document_title: String,
}

impl Default for CacheMetadata {
    fn default() -> Self {
        Self {
            company_name: "Unknown".to_string(),
            document_title: "Uploaded Contract".to_string(),
        }
    }
}

/// Persisted cache record, keyed by [`ContractFingerprint`].
///
/// `access_count` is informational only; concurrent hits may lose ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedAnalysis {
    pub fingerprint: ContractFingerprint,
    pub analysis: AnalysisResult,
    pub last_analyzed: DateTime<Utc>,
    pub access_count: u64,
    pub company_name: String,
    pub document_title: String,
}

impl CachedAnalysis {
    /// A freshly written record: one access, stamped now.
    pub fn new(
        fingerprint: ContractFingerprint,
        analysis: AnalysisResult,
        metadata: CacheMetadata,
    ) -> Self {
        Self {
            fingerprint,
            analysis,
            last_analyzed: Utc::now(),
            access_count: 1,
            company_name: metadata.company_name,
            document_title: metadata.document_title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clause_defaults_optional_fields() {
        let json = r#"{
            "id": "c-1",
            "clause_text": "We may sell your data.",
            "category": "Data Rights",
            "severity_score": 9,
            "legal_context": "CCPA 1798.120",
            "actionable_step": "Opt out"
        }"#;
        let clause: ClauseAnalysis = serde_json::from_str(json).unwrap();
        assert!(clause.flags.is_empty());
        assert_eq!(clause.simplified_explanation, "");
        assert_eq!(clause.severity_score, 9);
    }

    #[test]
    fn safe_document_has_no_clauses() {
        let json = r#"{"document_summary": "Benign.", "overall_danger_score": 4}"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert!(result.clauses.is_empty());
        assert_eq!(result.overall_danger_score, 4);
    }

    #[test]
    fn new_cache_record_starts_at_one_access() {
        let fp = crate::fingerprint("some terms");
        let record = CachedAnalysis::new(
            fp.clone(),
            AnalysisResult {
                document_summary: "ok".into(),
                overall_danger_score: 10,
                clauses: vec![],
            },
            CacheMetadata::default(),
        );
        assert_eq!(record.fingerprint, fp);
        assert_eq!(record.access_count, 1);
        assert_eq!(record.company_name, "Unknown");
        assert_eq!(record.document_title, "Uploaded Contract");
    }
}
