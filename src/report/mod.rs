//! Result assembly and rendering
//!
//! The [`ClassificationResult`] is the sole externally visible artifact of
//! one classification. Assembly is pure composition — no I/O, no side
//! effects, byte-identical output for identical inputs.

pub mod json;

use crate::authenticity::AuthenticityStatus;
use crate::matcher::IssuerMatch;
use crate::tier::CredibilityTier;
use serde::{Deserialize, Serialize};

/// The structured verdict for one certificate. Created once, immutable.
///
/// Field names are a stable external contract:
///
/// ```json
/// {"issuer":"IBM","tags":["Data Analysis","Python"],"status":"Real","tier":"Tier 1","confidence":0.85}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Canonical issuer name, or the raw mention if unresolved
    pub issuer: String,
    /// Canonical skill tags, alphabetical, deduplicated
    pub tags: Vec<String>,
    pub status: AuthenticityStatus,
    pub tier: CredibilityTier,
    /// Normalized authenticity score that produced the status
    pub confidence: f64,
    /// Set only on Uncertain outcomes; omitted from JSON when false
    #[serde(default, skip_serializing_if = "is_false")]
    pub review_required: bool,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// Compose the final result from the pipeline stages' outputs
pub fn assemble(
    issuer: &IssuerMatch,
    tags: Vec<String>,
    status: AuthenticityStatus,
    score: f64,
    tier: CredibilityTier,
    review_required: bool,
) -> ClassificationResult {
    ClassificationResult {
        issuer: issuer.issuer.clone(),
        tags,
        status,
        tier,
        confidence: round4(score),
        review_required,
    }
}

/// Four decimal places is plenty of resolution for a 0–1 score and keeps
/// the serialized document free of float noise
fn round4(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::MatchMethod;
    use crate::registry::TrustTier;

    fn issuer_match() -> IssuerMatch {
        IssuerMatch {
            issuer: "IBM".into(),
            tier: TrustTier::Tier1,
            confidence: 1.0,
            method: MatchMethod::ExactAlias,
        }
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let make = || {
            assemble(
                &issuer_match(),
                vec!["Data Analysis".into(), "Python".into()],
                AuthenticityStatus::Real,
                0.85000000000000012,
                CredibilityTier::Tier1,
                false,
            )
        };
        let a = json::render(&make()).unwrap();
        let b = json::render(&make()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_confidence_rounded() {
        let result = assemble(
            &issuer_match(),
            vec![],
            AuthenticityStatus::Real,
            0.8500000000000001,
            CredibilityTier::Tier1,
            false,
        );
        assert_eq!(result.confidence, 0.85);
    }

    #[test]
    fn test_stable_field_names() {
        let result = assemble(
            &issuer_match(),
            vec!["Data Analysis".into(), "Python".into()],
            AuthenticityStatus::Real,
            0.85,
            CredibilityTier::Tier1,
            false,
        );
        let doc: serde_json::Value =
            serde_json::from_str(&json::render(&result).unwrap()).unwrap();
        assert_eq!(doc["issuer"], "IBM");
        assert_eq!(doc["tags"][0], "Data Analysis");
        assert_eq!(doc["status"], "Real");
        assert_eq!(doc["tier"], "Tier 1");
        assert_eq!(doc["confidence"], 0.85);
        // review_required only appears when set
        assert!(doc.get("review_required").is_none());
    }

    #[test]
    fn test_review_flag_serialized_when_set() {
        let result = assemble(
            &issuer_match(),
            vec![],
            AuthenticityStatus::Uncertain,
            0.5,
            CredibilityTier::Tier3,
            true,
        );
        let doc: serde_json::Value =
            serde_json::from_str(&json::render(&result).unwrap()).unwrap();
        assert_eq!(doc["review_required"], true);
        assert_eq!(doc["tier"], "Tier 3");
        assert_eq!(doc["status"], "Uncertain");
    }
}
