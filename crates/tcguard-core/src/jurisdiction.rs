//! Jurisdiction identifiers and the legal-reference guidance injected into prompts.
//!
//! # Identifiers
//!
//! | Structured       | Legacy code | Framework                          |
//! |------------------|-------------|------------------------------------|
//! | `US_CALIFORNIA`  | `US-CA`     | CCPA / CPRA                        |
//! | `EU_GDPR`        | `EU-GDPR`   | GDPR                               |
//! | `INDIA_IT_ACT`   | `IN`        | Information Technology Act, 2000   |
//!
//! The legacy codes are part of the external contract and map 1:1 onto the
//! structured identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Guidance used when an identifier is not in the table.
pub const GENERIC_LEGAL_REFERENCES: &str = "General consumer protection laws apply.";

const US_CALIFORNIA_REFERENCES: &str = "California Consumer Privacy Act (CCPA) and California Privacy Rights Act (CPRA). \
Flag any sale of personal data without opt-out as HIGH SEVERITY (8-10). \
Arbitration clauses that waive class action rights are suspect under California law. \
Auto-renewal clauses must have clear cancellation mechanisms per California law.";

const EU_GDPR_REFERENCES: &str = "General Data Protection Regulation (GDPR). \
Flag any data processing without explicit consent as HIGH SEVERITY (8-10). \
Right to erasure (Article 17) violations are critical. \
Data portability rights (Article 20) must be respected. \
Any clause limiting GDPR rights is likely unenforceable.";

const INDIA_IT_ACT_REFERENCES: &str = "Information Technology Act, 2000 and IT Rules. \
Flag any clause that violates data protection principles as HIGH SEVERITY (7-10). \
Unauthorized access to personal data is a criminal offense. \
Companies must have reasonable security practices (Section 43A). \
Any clause attempting to limit liability for data breaches is suspect.";

/// Legal regime whose statutes the model is told to cite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Jurisdiction {
    #[default]
    UsCalifornia,
    EuGdpr,
    IndiaItAct,
}

/// Returned by [`Jurisdiction::from_str`] for identifiers outside the table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown jurisdiction: {0}")]
pub struct UnknownJurisdiction(pub String);

impl Jurisdiction {
    pub const ALL: [Jurisdiction; 3] = [Self::UsCalifornia, Self::EuGdpr, Self::IndiaItAct];

    /// Structured identifier, as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UsCalifornia => "US_CALIFORNIA",
            Self::EuGdpr => "EU_GDPR",
            Self::IndiaItAct => "INDIA_IT_ACT",
        }
    }

    /// Short code accepted by older clients.
    pub fn legacy_code(&self) -> &'static str {
        match self {
            Self::UsCalifornia => "US-CA",
            Self::EuGdpr => "EU-GDPR",
            Self::IndiaItAct => "IN",
        }
    }

    pub fn legal_references(&self) -> &'static str {
        match self {
            Self::UsCalifornia => US_CALIFORNIA_REFERENCES,
            Self::EuGdpr => EU_GDPR_REFERENCES,
            Self::IndiaItAct => INDIA_IT_ACT_REFERENCES,
        }
    }

    /// Resolve caller input: structured identifier or legacy code, case-insensitive.
    ///
    /// Anything unrecognised resolves to [`Jurisdiction::UsCalifornia`].
    pub fn resolve(input: &str) -> Self {
        input.parse().unwrap_or_default()
    }
}

impl FromStr for Jurisdiction {
    type Err = UnknownJurisdiction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|j| j.as_str() == upper || j.legacy_code() == upper)
            .ok_or_else(|| UnknownJurisdiction(s.to_string()))
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Legal-reference text for an identifier, or the generic guidance when unknown.
pub fn legal_references(identifier: &str) -> &'static str {
    identifier
        .parse::<Jurisdiction>()
        .map(|j| j.legal_references())
        .unwrap_or(GENERIC_LEGAL_REFERENCES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_codes_match_structured_ids() {
        for j in Jurisdiction::ALL {
            assert_eq!(Jurisdiction::resolve(j.legacy_code()), j);
            assert_eq!(Jurisdiction::resolve(j.as_str()), j);
            assert_eq!(
                legal_references(j.legacy_code()),
                legal_references(j.as_str())
            );
        }
    }

    #[test]
    fn us_ca_resolves_to_california_text() {
        assert_eq!(
            legal_references("US-CA"),
            Jurisdiction::UsCalifornia.legal_references()
        );
        assert!(legal_references("US-CA").contains("CCPA"));
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(Jurisdiction::resolve("eu-gdpr"), Jurisdiction::EuGdpr);
        assert_eq!(Jurisdiction::resolve(" india_it_act "), Jurisdiction::IndiaItAct);
        assert_eq!(Jurisdiction::resolve("in"), Jurisdiction::IndiaItAct);
    }

    #[test]
    fn unknown_resolves_to_california() {
        assert_eq!(Jurisdiction::resolve("UK"), Jurisdiction::UsCalifornia);
        assert_eq!(Jurisdiction::resolve(""), Jurisdiction::UsCalifornia);
    }

    #[test]
    fn unknown_identifier_gets_generic_guidance() {
        assert_eq!(legal_references("Atlantis"), GENERIC_LEGAL_REFERENCES);
        assert!("Atlantis".parse::<Jurisdiction>().is_err());
    }

    #[test]
    fn profiles_name_their_framework() {
        assert!(Jurisdiction::EuGdpr.legal_references().contains("Article 17"));
        assert!(Jurisdiction::IndiaItAct.legal_references().contains("Section 43A"));
    }

    #[test]
    fn serde_uses_structured_ids() {
        let json = serde_json::to_string(&Jurisdiction::IndiaItAct).unwrap();
        assert_eq!(json, "\"INDIA_IT_ACT\"");
        let parsed: Jurisdiction = serde_json::from_str("\"EU_GDPR\"").unwrap();
        assert_eq!(parsed, Jurisdiction::EuGdpr);
    }
}
