//! Maps raw model output and stored payloads onto the canonical [`AnalysisResult`].
//!
//! Model output must be a JSON object carrying an `analysis_result` key.
//! Stored cache records are accepted either wrapped the same way (as older
//! writers stored them) or bare.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::{AnalysisResult, ClauseAnalysis};

/// Top-level key every model response must carry.
pub const ANALYSIS_RESULT_KEY: &str = "analysis_result";

const DEFAULT_CATEGORY: &str = "Other";

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response has no `{ANALYSIS_RESULT_KEY}` object")]
    MissingAnalysisResult,

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

#[derive(Deserialize)]
struct RawAnalysis {
    document_summary: String,
    overall_danger_score: i64,
    #[serde(default)]
    clauses: Vec<RawClause>,
}

#[derive(Deserialize)]
struct RawClause {
    #[serde(default)]
    id: Option<String>,
    clause_text: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    simplified_explanation: Option<String>,
    severity_score: i64,
    #[serde(default)]
    legal_context: Option<String>,
    #[serde(default)]
    actionable_step: Option<String>,
    #[serde(default)]
    flags: Option<Vec<String>>,
}

/// Parse the text a model returned into an [`AnalysisResult`].
///
/// Markdown code fences around the JSON are tolerated. Anything else that is
/// not the documented shape is an error.
pub fn parse_model_response(raw: &str) -> Result<AnalysisResult, NormalizeError> {
    let value: Value = serde_json::from_str(strip_code_fence(raw))?;
    match value {
        Value::Object(mut map) => match map.remove(ANALYSIS_RESULT_KEY) {
            Some(inner @ Value::Object(_)) => analysis_from_value(inner),
            _ => Err(NormalizeError::MissingAnalysisResult),
        },
        _ => Err(NormalizeError::MissingAnalysisResult),
    }
}

/// Decode a stored analysis, wrapped in `analysis_result` or not.
pub fn stored_analysis(value: Value) -> Result<AnalysisResult, NormalizeError> {
    match value {
        Value::Object(mut map) if map.contains_key(ANALYSIS_RESULT_KEY) => {
            let inner = map
                .remove(ANALYSIS_RESULT_KEY)
                .ok_or(NormalizeError::MissingAnalysisResult)?;
            analysis_from_value(inner)
        }
        other => analysis_from_value(other),
    }
}

/// Validate ranges and fill defaults on a bare analysis object.
pub fn analysis_from_value(value: Value) -> Result<AnalysisResult, NormalizeError> {
    let raw: RawAnalysis = serde_json::from_value(value)?;
    let overall_danger_score = in_range("overall_danger_score", raw.overall_danger_score, 0, 100)?;

    let mut seen = HashSet::new();
    let mut clauses = Vec::with_capacity(raw.clauses.len());
    for clause in raw.clauses {
        let severity_score = in_range("severity_score", clause.severity_score, 1, 10)?;
        let id = match clause.id {
            Some(id) if !id.trim().is_empty() && !seen.contains(&id) => id,
            original => {
                let id = uuid::Uuid::new_v4().to_string();
                warn!(
                    original = ?original,
                    replacement = %id,
                    "clause id missing or duplicated, regenerated"
                );
                id
            }
        };
        seen.insert(id.clone());
        clauses.push(ClauseAnalysis {
            id,
            clause_text: clause.clause_text,
            category: clause
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            simplified_explanation: clause.simplified_explanation.unwrap_or_default(),
            severity_score,
            legal_context: clause.legal_context.unwrap_or_default(),
            actionable_step: clause.actionable_step.unwrap_or_default(),
            flags: clause.flags.unwrap_or_default(),
        });
    }

    Ok(AnalysisResult {
        document_summary: raw.document_summary,
        overall_danger_score,
        clauses,
    })
}

fn in_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<u8, NormalizeError> {
    if (min..=max).contains(&value) {
        // Bounds are within u8 for every caller.
        Ok(value as u8)
    } else {
        Err(NormalizeError::OutOfRange { field, value })
    }
}

/// Strip a surrounding ```json ... ``` fence, if present.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.strip_suffix("```").unwrap_or(rest).trim();
    // Drop the info string ("json"), on its own line or glued to the body.
    match body.split_once('\n') {
        Some((first, tail)) if !first.trim_start().starts_with('{') => tail.trim(),
        _ => body.trim_start_matches(|c: char| c.is_ascii_alphabetic()).trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canonical() -> Value {
        json!({
            "analysis_result": {
                "document_summary": "Binding arbitration with class action waiver.",
                "overall_danger_score": 72,
                "clauses": [{
                    "id": "a1",
                    "clause_text": "You agree to binding arbitration and waive all class action rights.",
                    "category": "Arbitration",
                    "simplified_explanation": "You cannot sue in court.",
                    "severity_score": 8,
                    "legal_context": "Suspect under California law.",
                    "actionable_step": "Opt out within 30 days.",
                    "flags": ["Red Flag"]
                }]
            }
        })
    }

    #[test]
    fn canonical_response_parses() {
        let result = parse_model_response(&canonical().to_string()).unwrap();
        assert_eq!(result.overall_danger_score, 72);
        assert_eq!(result.clauses.len(), 1);
        assert_eq!(result.clauses[0].id, "a1");
        assert_eq!(result.clauses[0].category, "Arbitration");
    }

    #[test]
    fn fenced_response_parses() {
        let raw = format!("```json\n{}\n```", canonical());
        let result = parse_model_response(&raw).unwrap();
        assert_eq!(result.clauses[0].severity_score, 8);
    }

    #[test]
    fn single_line_fence_parses() {
        let raw = format!("```json{}```", canonical());
        let result = parse_model_response(&raw).unwrap();
        assert_eq!(result.overall_danger_score, 72);

        let raw = format!("```{}```", canonical());
        assert_eq!(parse_model_response(&raw).unwrap().clauses[0].id, "a1");
    }

    #[test]
    fn missing_top_level_key_is_shape_error() {
        let raw = json!({"document_summary": "x", "overall_danger_score": 3}).to_string();
        assert!(matches!(
            parse_model_response(&raw),
            Err(NormalizeError::MissingAnalysisResult)
        ));
    }

    #[test]
    fn non_json_is_parse_error() {
        assert!(matches!(
            parse_model_response("I'm sorry, I can't help with that."),
            Err(NormalizeError::Json(_))
        ));
    }

    #[test]
    fn out_of_range_scores_rejected() {
        let mut v = canonical();
        v["analysis_result"]["clauses"][0]["severity_score"] = json!(0);
        assert!(matches!(
            parse_model_response(&v.to_string()),
            Err(NormalizeError::OutOfRange { field: "severity_score", value: 0 })
        ));

        let mut v = canonical();
        v["analysis_result"]["overall_danger_score"] = json!(140);
        assert!(matches!(
            parse_model_response(&v.to_string()),
            Err(NormalizeError::OutOfRange { field: "overall_danger_score", .. })
        ));
    }

    #[test]
    fn missing_clause_fields_are_defaulted() {
        let raw = json!({
            "analysis_result": {
                "document_summary": "s",
                "overall_danger_score": 50,
                "clauses": [
                    {"clause_text": "A", "severity_score": 3},
                    {"id": "", "clause_text": "B", "severity_score": 4, "category": ""}
                ]
            }
        });
        let result = parse_model_response(&raw.to_string()).unwrap();
        assert_eq!(result.clauses.len(), 2);
        assert_eq!(result.clauses[0].category, "Other");
        assert_eq!(result.clauses[1].category, "Other");
        assert!(!result.clauses[0].id.is_empty());
        assert_ne!(result.clauses[0].id, result.clauses[1].id);
        assert!(result.clauses[0].flags.is_empty());
    }

    #[test]
    fn duplicate_clause_ids_are_replaced() {
        let raw = json!({
            "analysis_result": {
                "document_summary": "s",
                "overall_danger_score": 50,
                "clauses": [
                    {"id": "dup", "clause_text": "A", "severity_score": 3},
                    {"id": "dup", "clause_text": "B", "severity_score": 4}
                ]
            }
        });
        let result = parse_model_response(&raw.to_string()).unwrap();
        assert_eq!(result.clauses[0].id, "dup");
        assert_ne!(result.clauses[1].id, "dup");
    }

    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn regenerated_clause_id_is_logged() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let raw = json!({
            "analysis_result": {
                "document_summary": "s",
                "overall_danger_score": 50,
                "clauses": [
                    {"id": "dup", "clause_text": "A", "severity_score": 3},
                    {"id": "dup", "clause_text": "B", "severity_score": 4}
                ]
            }
        });
        let result = tracing::subscriber::with_default(subscriber, || {
            parse_model_response(&raw.to_string()).unwrap()
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("clause id missing or duplicated, regenerated"));
        assert!(output.contains(&result.clauses[1].id));
        assert_eq!(output.matches("regenerated").count(), 1);
    }

    #[test]
    fn stored_analysis_accepts_both_shapes() {
        let wrapped = stored_analysis(canonical()).unwrap();
        let bare = stored_analysis(canonical()["analysis_result"].clone()).unwrap();
        assert_eq!(wrapped, bare);
    }
}
