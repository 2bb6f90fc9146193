//! Terminal card for an analysis result.

use tcguard_core::{AnalysisResult, ClauseAnalysis};

const MAX_CLAUSE_CHARS: usize = 160;

/// Print an analysis as a vertical card: summary, score, then one block per clause.
pub fn print_analysis_card(result: &AnalysisResult, source: &str) {
    println!("=== Contract analysis ({source}) ===");
    println!("{}", result.document_summary);
    println!();
    println!(
        "  {:<26} {}/100 ({})",
        "overall_danger_score",
        result.overall_danger_score,
        danger_label(result.overall_danger_score)
    );
    println!("  {:<26} {}", "clauses", result.clauses.len());
    println!();

    for (i, clause) in result.clauses.iter().enumerate() {
        print_clause(i + 1, clause);
    }
}

// ── Clause rendering ──

fn print_clause(n: usize, clause: &ClauseAnalysis) {
    println!("{n}. {} [{}/10]", clause.category, clause.severity_score);
    println!("  {:<26} {}", "clause_text", shorten(&clause.clause_text, MAX_CLAUSE_CHARS));
    if !clause.simplified_explanation.is_empty() {
        println!("  {:<26} {}", "explanation", clause.simplified_explanation);
    }
    println!("  {:<26} {}", "legal_context", clause.legal_context);
    println!("  {:<26} {}", "actionable_step", clause.actionable_step);
    if !clause.flags.is_empty() {
        println!("  {:<26} {}", "flags", clause.flags.join(", "));
    }
    println!();
}

fn danger_label(score: u8) -> &'static str {
    match score {
        0..=29 => "low",
        30..=69 => "moderate",
        _ => "high",
    }
}

fn shorten(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_cover_score_range() {
        assert_eq!(danger_label(0), "low");
        assert_eq!(danger_label(30), "moderate");
        assert_eq!(danger_label(85), "high");
        assert_eq!(danger_label(100), "high");
    }

    #[test]
    fn shorten_respects_char_boundaries() {
        assert_eq!(shorten("short", 10), "short");
        let long = "ü".repeat(20);
        let out = shorten(&long, 10);
        assert_eq!(out.chars().count(), 10);
        assert!(out.ends_with("..."));
    }
}
