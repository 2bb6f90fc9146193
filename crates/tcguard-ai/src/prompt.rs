//! Prompt construction for analysis, chat and negotiation drafting.
//!
//! The analysis instruction pins the exact output schema that
//! [`tcguard_core::normalize::parse_model_response`] reads back; keep the two
//! in step.

use tcguard_core::{ClauseAnalysis, Jurisdiction};

use crate::model::{ChatTurn, ModelConfig, ModelRequest};

pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are the "Paranoid Lawyer" Engine. Your goal is to protect consumers by analyzing Terms & Conditions (T&C) contracts.
Identify predatory clauses, hidden fees, data rights violations, and arbitration traps.

Analyze the provided contract text and return a JSON object following this EXACT schema:
{
  "analysis_result": {
    "document_summary": "High level summary (max 2 sentences)",
    "overall_danger_score": integer (0-100),
    "clauses": [
      {
        "id": "uuid-string",
        "clause_text": "Exact text from contract",
        "category": "Data Rights | Arbitration | Financial | IP Ownership | Other",
        "simplified_explanation": "ELI5 explanation",
        "severity_score": integer (1-10),
        "legal_context": "Why this matters (mention laws like GDPR/CCPA if relevant)",
        "actionable_step": "What to do (e.g. Opt-out)",
        "flags": ["Red Flag", "Standard"]
      }
    ]
  }
}
If the text is safe, return a low score. Be strict but fair."#;

pub const CHAT_PERSONA: &str = r#"You are T&C Guardian's "Ask the Contract" AI.
Your job is to answer the user's questions strictly based on the provided Contract Text.
If the answer is not in the text, say "I cannot find that information in this document."
Be helpful, concise, and legal-savvy but easy to understand."#;

pub const DEFAULT_EMAIL_TONE: &str = "firm";

/// Guidance block for one jurisdiction, appended to the system instruction.
pub fn jurisdiction_block(jurisdiction: Jurisdiction) -> String {
    format!(
        "JURISDICTION: {jurisdiction}\n\
         \n\
         LEGAL FRAMEWORK:\n\
         {}\n\
         \n\
         CRITICAL: When analyzing clauses, apply the above legal framework strictly.\n\
         - If a clause violates the referenced laws, assign HIGH SEVERITY (7-10)\n\
         - Cite specific articles/sections in the 'legal_context' field\n\
         - Flag any attempt to limit or waive these legal rights as predatory",
        jurisdiction.legal_references()
    )
}

/// System instruction followed by the jurisdiction block, contract as the user turn.
pub fn build_analysis_request(
    config: &ModelConfig,
    jurisdiction: Jurisdiction,
    contract_text: &str,
) -> ModelRequest {
    let mut request = ModelRequest::new(
        config,
        &config.analysis_model,
        format!("Analyze this contract:\n\n{contract_text}"),
    );
    request.system = Some(format!(
        "{ANALYSIS_SYSTEM_PROMPT}\n\n{}",
        jurisdiction_block(jurisdiction)
    ));
    request.json_output = true;
    request
}

/// Question about a contract, answered from the supplied text only.
pub fn build_chat_request(
    config: &ModelConfig,
    history: Vec<ChatTurn>,
    document_context: &str,
    question: &str,
) -> ModelRequest {
    let mut request = ModelRequest::new(
        config,
        &config.chat_model,
        format!(
            "{CHAT_PERSONA}\n\nContract Context:\n{document_context}\n\nUser Question: {question}"
        ),
    );
    request.history = history;
    request
}

/// Two-part drafting prompt: a rewritten fair clause, then an email to the
/// company's legal department proposing it.
pub fn build_email_request(
    config: &ModelConfig,
    clause: &ClauseAnalysis,
    company_name: &str,
    tone: &str,
) -> ModelRequest {
    let flags = if clause.flags.is_empty() {
        "None".to_string()
    } else {
        clause.flags.join(", ")
    };
    let prompt = format!(
        r#"You are a consumer rights lawyer. Your task has TWO parts:

PART 1: REWRITE THE CLAUSE
Rewrite the following predatory clause to be fair and balanced, protecting consumer rights while maintaining the company's legitimate business interests.

ORIGINAL CLAUSE:
"{clause_text}"

CLAUSE ANALYSIS:
- Category: {category}
- Severity Score: {severity}/10
- Explanation: {explanation}
- Legal Context: {legal_context}
- Recommended Action: {action}
- Flags: {flags}

REQUIREMENTS FOR REWRITE:
- Maintain the company's legitimate business needs
- Remove predatory or one-sided language
- Add consumer protections and fair terms
- Make it balanced and enforceable
- Keep it concise and clear

PART 2: DRAFT THE EMAIL
Draft a {tone} but professional email to {company_name}'s legal department that:
1. Politely contests the original clause
2. Explains why it's problematic (cite the legal context)
3. Proposes your rewritten clause as a fair alternative
4. Requests they update their terms

FORMAT YOUR RESPONSE AS:

=== REWRITTEN CLAUSE ===
[Your rewritten, fair version of the clause here]

=== EMAIL ===
SUBJECT: [Subject line]

BODY:
[Professional email body here]

The email should be concise, cite relevant consumer protection laws, and propose the rewritten clause as a solution."#,
        clause_text = clause.clause_text,
        category = clause.category,
        severity = clause.severity_score,
        explanation = clause.simplified_explanation,
        legal_context = clause.legal_context,
        action = clause.actionable_step,
    );
    ModelRequest::new(config, &config.chat_model, prompt)
}
