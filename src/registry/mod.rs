//! Reference data — issuer registry and skill taxonomy
//!
//! Loaded once at startup (TOML file or built-in defaults), validated, then
//! injected into the pipeline as an immutable object. Components never reach
//! for ambient globals, which is what makes fake registries injectable in
//! tests. The pipeline never mutates reference data at runtime; updates
//! happen out-of-band by restarting with a new file.

use crate::{CertigradeError, CertigradeResult};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ─── Trust Tier ────────────────────────────────────────────────────

/// Issuer trust rank. Declaration order is most-trusted first, so the
/// derived `Ord` makes "higher trust tier" the smaller value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TrustTier {
    Tier1,
    Tier2,
    Tier3,
    /// Issuer not resolved against the registry
    Unknown,
}

// ─── Records ───────────────────────────────────────────────────────

/// One known issuer: canonical name, surface aliases, trust tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerRecord {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub tier: TrustTier,
}

/// One canonical skill and the surface forms (possibly multi-word phrases)
/// that map to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillEntry {
    pub name: String,
    #[serde(default)]
    pub patterns: Vec<String>,
}

// ─── Reference Data ────────────────────────────────────────────────

/// The full reference data set: issuer registry + skill taxonomy.
///
/// TOML shape:
///
/// ```toml
/// [[issuers]]
/// name = "IBM"
/// aliases = ["i.b.m.", "ibm skills network"]
/// tier = "tier1"
///
/// [[skills]]
/// name = "Data Analysis"
/// patterns = ["data analytics"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceData {
    #[serde(default)]
    pub issuers: Vec<IssuerRecord>,
    #[serde(default)]
    pub skills: Vec<SkillEntry>,
}

impl ReferenceData {
    pub fn from_toml_str(content: &str) -> CertigradeResult<Self> {
        let data: ReferenceData = toml::from_str(content)
            .map_err(|e| CertigradeError::Config(format!("failed to parse reference data: {e}")))?;
        data.validate()?;
        Ok(data)
    }

    pub fn from_toml_file(path: &Path) -> CertigradeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CertigradeError::Config(format!(
                "failed to read reference data {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Built-in registry and taxonomy, usable without any external file
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Reject malformed reference data at load time. A registry that half
    /// loads must prevent the pipeline from accepting work.
    pub fn validate(&self) -> CertigradeResult<()> {
        let mut seen_issuers = HashSet::new();
        for issuer in &self.issuers {
            if issuer.name.trim().is_empty() {
                return Err(CertigradeError::Config(
                    "issuer with empty canonical name".into(),
                ));
            }
            if !seen_issuers.insert(issuer.name.to_lowercase()) {
                return Err(CertigradeError::Config(format!(
                    "duplicate issuer '{}'",
                    issuer.name
                )));
            }
            if issuer.aliases.iter().any(|a| a.trim().is_empty()) {
                return Err(CertigradeError::Config(format!(
                    "issuer '{}' has an empty alias",
                    issuer.name
                )));
            }
        }

        let mut seen_skills = HashSet::new();
        for skill in &self.skills {
            if skill.name.trim().is_empty() {
                return Err(CertigradeError::Config(
                    "skill with empty canonical name".into(),
                ));
            }
            if !seen_skills.insert(skill.name.to_lowercase()) {
                return Err(CertigradeError::Config(format!(
                    "duplicate skill '{}'",
                    skill.name
                )));
            }
            if skill.patterns.iter().any(|p| p.trim().is_empty()) {
                return Err(CertigradeError::Config(format!(
                    "skill '{}' has an empty pattern",
                    skill.name
                )));
            }
        }

        Ok(())
    }
}

// ─── Built-in Defaults ─────────────────────────────────────────────

static BUILTIN: Lazy<ReferenceData> = Lazy::new(|| {
    fn issuer(name: &str, tier: TrustTier, aliases: &[&str]) -> IssuerRecord {
        IssuerRecord {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            tier,
        }
    }
    fn skill(name: &str, patterns: &[&str]) -> SkillEntry {
        SkillEntry {
            name: name.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    use TrustTier::*;
    ReferenceData {
        issuers: vec![
            // "bm developer skills network" is a recurring OCR truncation
            issuer("IBM", Tier1, &["i.b.m.", "ibm skills network", "bm developer skills network"]),
            issuer("AWS", Tier1, &["amazon web services", "aws training and certification"]),
            issuer("Google", Tier1, &["google cloud", "coursera google"]),
            issuer("Microsoft", Tier1, &["microsoft learn"]),
            issuer("Meta", Tier1, &["facebook"]),
            issuer("Apple", Tier1, &[]),
            issuer("Harvard University", Tier1, &["harvard", "harvardx"]),
            issuer("Stanford University", Tier1, &["stanford", "stanford online"]),
            issuer("MIT", Tier1, &["massachusetts institute of technology", "mitx"]),
            issuer("University of Oxford", Tier1, &["oxford"]),
            issuer("University of Cambridge", Tier1, &["cambridge"]),
            issuer("Oracle", Tier2, &["oracle university"]),
            issuer("SAP", Tier2, &[]),
            issuer("edX", Tier2, &[]),
            issuer("Kaggle", Tier2, &["kaggle learn"]),
            issuer("NPTEL", Tier2, &[]),
            issuer("Coursera", Tier3, &[]),
            issuer("Udemy", Tier3, &[]),
            issuer("LinkedIn Learning", Tier3, &["linkedin", "lynda"]),
            issuer("DataCamp", Tier3, &[]),
            issuer("Pluralsight", Tier3, &[]),
            issuer("freeCodeCamp", Tier3, &["free code camp"]),
            issuer("GeeksforGeeks", Tier3, &["gfg"]),
            issuer("HackerRank", Tier3, &[]),
            issuer("LeetCode", Tier3, &[]),
            issuer("SoloLearn", Tier3, &[]),
        ],
        skills: vec![
            skill("Python", &["python 3", "python programming"]),
            skill("SQL", &["structured query language", "mysql", "postgresql"]),
            skill("Java", &[]),
            skill("JavaScript", &["java script"]),
            skill("R Programming", &["rstudio", "r studio"]),
            skill("Data Analysis", &["data analytics", "data analyst"]),
            skill("Data Science", &[]),
            skill("Machine Learning", &["ml engineering"]),
            skill("Deep Learning", &["neural networks"]),
            skill("Natural Language Processing", &["nlp"]),
            skill("Statistics", &["statistical analysis"]),
            skill("Excel", &["microsoft excel", "ms excel"]),
            skill("Tableau", &[]),
            skill("Power BI", &["powerbi"]),
            skill("Cloud Computing", &[]),
            skill("Cybersecurity", &["cyber security", "information security"]),
            skill("DevOps", &[]),
            skill("Docker", &[]),
            skill("Kubernetes", &["k8s"]),
            skill("TensorFlow", &[]),
            skill("PyTorch", &[]),
            skill("Web Development", &["web developer"]),
            skill("Project Management", &[]),
        ],
    }
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_valid() {
        let data = ReferenceData::builtin();
        data.validate().unwrap();
        assert!(data.issuers.iter().any(|i| i.name == "IBM" && i.tier == TrustTier::Tier1));
        assert!(data.skills.iter().any(|s| s.name == "Data Analysis"));
    }

    #[test]
    fn test_toml_parse() {
        let toml_str = r#"
            [[issuers]]
            name = "IBM"
            aliases = ["i.b.m.", "ibm skills network"]
            tier = "tier1"

            [[issuers]]
            name = "Coursera"
            tier = "tier3"

            [[skills]]
            name = "Data Analysis"
            patterns = ["data analytics"]
        "#;
        let data = ReferenceData::from_toml_str(toml_str).unwrap();
        assert_eq!(data.issuers.len(), 2);
        assert_eq!(data.issuers[0].aliases.len(), 2);
        assert_eq!(data.issuers[1].tier, TrustTier::Tier3);
        assert_eq!(data.skills.len(), 1);
    }

    #[test]
    fn test_duplicate_issuer_rejected() {
        let toml_str = r#"
            [[issuers]]
            name = "IBM"
            tier = "tier1"

            [[issuers]]
            name = "ibm"
            tier = "tier2"
        "#;
        let err = ReferenceData::from_toml_str(toml_str).unwrap_err();
        assert!(matches!(err, CertigradeError::Config(_)));
    }

    #[test]
    fn test_empty_alias_rejected() {
        let toml_str = r#"
            [[issuers]]
            name = "IBM"
            aliases = [" "]
            tier = "tier1"
        "#;
        assert!(ReferenceData::from_toml_str(toml_str).is_err());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = ReferenceData::from_toml_str("issuers = 7").unwrap_err();
        assert!(matches!(err, CertigradeError::Config(_)));
    }

    #[test]
    fn test_tier_ordering_most_trusted_first() {
        assert!(TrustTier::Tier1 < TrustTier::Tier2);
        assert!(TrustTier::Tier3 < TrustTier::Unknown);
    }
}
