//! Synthetic analysis returned when the model is unavailable or unusable.
//!
//! The result is deterministic and labelled as demo data twice: in the
//! summary, and by a [`FALLBACK_FLAG`] on every clause.

use crate::{AnalysisResult, ClauseAnalysis};

/// Flag carried by every clause of a fallback result.
pub const FALLBACK_FLAG: &str = "Fallback Data";

/// Prefix of the fallback `document_summary`.
pub const DEGRADED_NOTICE: &str = "AI SERVICE UNAVAILABLE";

pub const FALLBACK_DANGER_SCORE: u8 = 85;

/// Build the degraded-service analysis.
pub fn fallback_analysis() -> AnalysisResult {
    AnalysisResult {
        document_summary: format!(
            "⚠️ {DEGRADED_NOTICE}: This is a simulation. The AI service is currently \
             experiencing high load or quota limits. We have detected typical predatory \
             clauses for demonstration purposes."
        ),
        overall_danger_score: FALLBACK_DANGER_SCORE,
        clauses: vec![
            ClauseAnalysis {
                id: "00000000-0000-4000-8000-000000000001".to_string(),
                clause_text: "By using this service, you agree to grant us a worldwide, \
                              irrevocable license to all your content."
                    .to_string(),
                category: "IP Ownership".to_string(),
                simplified_explanation:
                    "You are giving them rights to use your content forever, anywhere."
                        .to_string(),
                severity_score: 8,
                legal_context: "Common in social media, but 'irrevocable' is aggressive."
                    .to_string(),
                actionable_step: "Request limitation to 'operating the service' only."
                    .to_string(),
                flags: vec!["Red Flag".to_string(), FALLBACK_FLAG.to_string()],
            },
            ClauseAnalysis {
                id: "00000000-0000-4000-8000-000000000002".to_string(),
                clause_text: "We provide no warranty and are not liable for any damages."
                    .to_string(),
                category: "Liability".to_string(),
                simplified_explanation:
                    "They take no responsibility if things break or you lose money.".to_string(),
                severity_score: 6,
                legal_context: "Standard disclaimer, but total exclusion may be void in some \
                                jurisdictions."
                    .to_string(),
                actionable_step: "Check local consumer protection laws.".to_string(),
                flags: vec!["Standard".to_string(), FALLBACK_FLAG.to_string()],
            },
        ],
    }
}

/// True when `result` was produced by [`fallback_analysis`].
pub fn is_fallback(result: &AnalysisResult) -> bool {
    !result.clauses.is_empty() && result.clauses.iter().all(|c| c.has_flag(FALLBACK_FLAG))
}
