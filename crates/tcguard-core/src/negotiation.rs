//! Negotiation records: a user contesting one clause with the issuing company.
//!
//! Creation requests arrive in two shapes. Current clients send a structured
//! `clause` object; older clients send flat `clause_id` / `clause_text` /
//! `issue_description` fields. [`NegotiationPayload`] makes the split explicit
//! and each variant normalises to a [`ClauseAnalysis`] on its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ClauseAnalysis, NormalizeError};

pub const LEGACY_CATEGORY: &str = "Unknown";
pub const LEGACY_SEVERITY: u8 = 5;
pub const LEGACY_LEGAL_CONTEXT: &str = "Not provided";
pub const LEGACY_ACTIONABLE_STEP: &str = "Review and contest";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationStatus {
    DraftCreated,
    DraftGenerated,
    Sent,
    Replied,
    Resolved,
    Ignored,
}

impl NegotiationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DraftCreated => "draft_created",
            Self::DraftGenerated => "draft_generated",
            Self::Sent => "sent",
            Self::Replied => "replied",
            Self::Resolved => "resolved",
            Self::Ignored => "ignored",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        serde_json::from_value(Value::String(s.to_string())).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StructuredNegotiation {
    pub user_id: String,
    pub document_title: String,
    pub company_name: String,
    pub clause: ClauseAnalysis,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LegacyNegotiation {
    pub user_id: String,
    pub document_title: String,
    pub company_name: String,
    pub clause_id: String,
    pub clause_text: String,
    pub issue_description: String,
}

/// A negotiation-creation request in either accepted shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationPayload {
    Structured(StructuredNegotiation),
    Legacy(LegacyNegotiation),
}

impl NegotiationPayload {
    /// Select the variant by the presence of a `clause` object, then decode it.
    pub fn from_value(value: Value) -> Result<Self, NormalizeError> {
        let structured = value.get("clause").is_some_and(Value::is_object);
        if structured {
            serde_json::from_value(value)
                .map(Self::Structured)
                .map_err(|e| NormalizeError::InvalidPayload(format!("negotiation: {e}")))
        } else {
            serde_json::from_value(value)
                .map(Self::Legacy)
                .map_err(|e| NormalizeError::InvalidPayload(format!("legacy negotiation: {e}")))
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            Self::Structured(n) => &n.user_id,
            Self::Legacy(n) => &n.user_id,
        }
    }

    /// The contested clause, with defaults filled in for the legacy shape.
    pub fn into_parts(self) -> (NegotiationParty, ClauseAnalysis) {
        match self {
            Self::Structured(n) => {
                let party = NegotiationParty {
                    user_id: n.user_id,
                    document_title: n.document_title,
                    company_name: n.company_name,
                };
                (party, n.clause)
            }
            Self::Legacy(n) => {
                let clause = ClauseAnalysis {
                    id: n.clause_id,
                    clause_text: n.clause_text,
                    category: LEGACY_CATEGORY.to_string(),
                    simplified_explanation: n.issue_description,
                    severity_score: LEGACY_SEVERITY,
                    legal_context: LEGACY_LEGAL_CONTEXT.to_string(),
                    actionable_step: LEGACY_ACTIONABLE_STEP.to_string(),
                    flags: Vec::new(),
                };
                let party = NegotiationParty {
                    user_id: n.user_id,
                    document_title: n.document_title,
                    company_name: n.company_name,
                };
                (party, clause)
            }
        }
    }
}

/// Who is negotiating about which document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationParty {
    pub user_id: String,
    pub document_title: String,
    pub company_name: String,
}

/// Persisted negotiation, carrying the full context of the contested clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationRecord {
    pub id: String,
    pub user_id: String,
    pub company_name: String,
    pub document_title: String,
    pub clause_contested: String,
    pub clause_text: String,
    pub clause_category: String,
    pub clause_severity_score: u8,
    pub clause_legal_context: String,
    pub clause_actionable_step: String,
    pub clause_simplified_explanation: String,
    pub clause_flags: Vec<String>,
    pub issue_description: String,
    pub status: NegotiationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl NegotiationRecord {
    /// New draft negotiation with a fresh id.
    pub fn new(party: NegotiationParty, clause: ClauseAnalysis) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: party.user_id,
            company_name: party.company_name,
            document_title: party.document_title,
            issue_description: format!(
                "Contesting {} clause (Severity: {}/10)",
                clause.category, clause.severity_score
            ),
            clause_contested: clause.id,
            clause_text: clause.clause_text,
            clause_category: clause.category,
            clause_severity_score: clause.severity_score,
            clause_legal_context: clause.legal_context,
            clause_actionable_step: clause.actionable_step,
            clause_simplified_explanation: clause.simplified_explanation,
            clause_flags: clause.flags,
            status: NegotiationStatus::DraftCreated,
            email_content: None,
            created_at: now,
            last_updated: now,
        }
    }

    /// Rebuild the contested clause from the stored context.
    pub fn clause(&self) -> ClauseAnalysis {
        ClauseAnalysis {
            id: self.clause_contested.clone(),
            clause_text: self.clause_text.clone(),
            category: self.clause_category.clone(),
            simplified_explanation: self.clause_simplified_explanation.clone(),
            severity_score: self.clause_severity_score,
            legal_context: self.clause_legal_context.clone(),
            actionable_step: self.clause_actionable_step.clone(),
            flags: self.clause_flags.clone(),
        }
    }

    /// Attach a generated email draft.
    pub fn with_email(mut self, email_content: String) -> Self {
        self.email_content = Some(email_content);
        self.status = NegotiationStatus::DraftGenerated;
        self.last_updated = Utc::now();
        self
    }
}
