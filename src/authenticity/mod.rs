//! Authenticity scoring — weighted evidence, explicit thresholds
//!
//! The policy is data, not scattered conditionals: a weight table and a
//! threshold pair, both externally configurable, turn issuer-match
//! confidence and structural signals into a Real/Fake/Uncertain verdict.
//! Classification is a pure function — same inputs, same status, always.

use crate::matcher::IssuerMatch;
use crate::signals::StructuralSignals;
use crate::{CertigradeError, CertigradeResult};
use serde::{Deserialize, Serialize};

// ─── Weight Table ──────────────────────────────────────────────────

/// Per-signal weights, normalized by their sum at scoring time. Issuer
/// match carries the most evidence by default; structural signals are
/// secondary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightTable {
    #[serde(default = "default_issuer_weight")]
    pub issuer_match: f64,
    #[serde(default = "default_signature_weight")]
    pub signature: f64,
    #[serde(default = "default_marker_weight")]
    pub design_marker: f64,
}

fn default_issuer_weight() -> f64 {
    0.5
}
fn default_signature_weight() -> f64 {
    0.3
}
fn default_marker_weight() -> f64 {
    0.2
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            issuer_match: default_issuer_weight(),
            signature: default_signature_weight(),
            design_marker: default_marker_weight(),
        }
    }
}

impl WeightTable {
    fn sum(&self) -> f64 {
        self.issuer_match + self.signature + self.design_marker
    }

    pub fn validate(&self) -> CertigradeResult<()> {
        let all = [self.issuer_match, self.signature, self.design_marker];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(CertigradeError::Config(
                "weights must be finite and non-negative".into(),
            ));
        }
        if self.sum() <= 0.0 {
            return Err(CertigradeError::Config(
                "weight table sums to zero".into(),
            ));
        }
        Ok(())
    }
}

// ─── Thresholds ────────────────────────────────────────────────────

/// Decision cut points on the normalized score:
/// `score ≥ high → Real`, `score ≤ low → Fake`, otherwise Uncertain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DecisionThresholds {
    #[serde(default = "default_high")]
    pub high: f64,
    #[serde(default = "default_low")]
    pub low: f64,
}

fn default_high() -> f64 {
    0.7
}
fn default_low() -> f64 {
    0.35
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            high: default_high(),
            low: default_low(),
        }
    }
}

impl DecisionThresholds {
    pub fn validate(&self) -> CertigradeResult<()> {
        if !(0.0..=1.0).contains(&self.low)
            || !(0.0..=1.0).contains(&self.high)
            || self.low >= self.high
        {
            return Err(CertigradeError::Config(format!(
                "thresholds must satisfy 0 ≤ low < high ≤ 1 (low={}, high={})",
                self.low, self.high
            )));
        }
        Ok(())
    }
}

// ─── Status & Classifier ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthenticityStatus {
    Real,
    Fake,
    Uncertain,
}

impl std::fmt::Display for AuthenticityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Real => write!(f, "Real"),
            Self::Fake => write!(f, "Fake"),
            Self::Uncertain => write!(f, "Uncertain"),
        }
    }
}

pub struct AuthenticityClassifier {
    weights: WeightTable,
    thresholds: DecisionThresholds,
}

impl AuthenticityClassifier {
    /// Rejects malformed weights/thresholds outright — a bad policy table
    /// must never fall back to silent defaults.
    pub fn new(weights: WeightTable, thresholds: DecisionThresholds) -> CertigradeResult<Self> {
        weights.validate()?;
        thresholds.validate()?;
        Ok(Self {
            weights,
            thresholds,
        })
    }

    /// Pure weighted-score decision. Returns the status and the normalized
    /// score (0.0–1.0) that produced it.
    pub fn classify(
        &self,
        issuer: &IssuerMatch,
        signals: &StructuralSignals,
    ) -> (AuthenticityStatus, f64) {
        let score = (self.weights.issuer_match * issuer.confidence
            + self.weights.signature * signals.signature.value()
            + self.weights.design_marker * signals.design_marker.value())
            / self.weights.sum();

        let status = if score >= self.thresholds.high {
            AuthenticityStatus::Real
        } else if score <= self.thresholds.low {
            AuthenticityStatus::Fake
        } else {
            AuthenticityStatus::Uncertain
        };

        (status, score)
    }
}
