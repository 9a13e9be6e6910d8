//! Structural signals — evidence about a certificate beyond its wording
//!
//! Signature and design-marker detection belong to external detectors
//! (computer vision, layout analysis); the pipeline just consumes their
//! readings. When no detector output is supplied, [`from_text`] derives a
//! best-effort reading from the text itself: verification links, signature
//! wording, seal/watermark wording, assessment-rigor wording, and hands-on
//! project wording.

use crate::normalize::NormalizedText;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// ─── Signal Types ──────────────────────────────────────────────────

/// One boolean/confidence reading from a detector
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Signal {
    pub present: bool,
    pub confidence: f64,
}

impl Signal {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn detected(confidence: f64) -> Self {
        Self {
            present: true,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Contribution to the weighted authenticity score
    pub fn value(&self) -> f64 {
        if self.present {
            self.confidence
        } else {
            0.0
        }
    }
}

/// The structural evidence consumed by the authenticity classifier
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StructuralSignals {
    pub signature: Signal,
    pub design_marker: Signal,
}

impl StructuralSignals {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(signature: Signal, design_marker: Signal) -> Self {
        Self {
            signature,
            design_marker,
        }
    }
}

// ─── Text-Derived Fallback ─────────────────────────────────────────

/// Verification URL, or a 5–12 character uppercase verification code.
/// Runs against the display string — codes are uppercase by convention
/// and the matching view has lost casing.
static VERIFY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+|\b[A-Z0-9]{5,12}\b").expect("verify pattern"));

const SIGNATURE_WORDS: &[&str] = &["signature", "signed", "authorized signatory", "countersigned"];
const MARKER_WORDS: &[&str] = &["seal", "watermark", "badge", "emblem", "hologram", "stamp"];
// Assessment-rigor wording correlates with professionally produced
// certificates; treated as a weaker design-marker channel
const ASSESSMENT_WORDS: &[&str] = &["proctored", "invigilat", "graded", "final exam", "passing score"];
// Hands-on project wording, the weakest marker channel. "project" and
// "lab" on their own are too generic to count ("Project Management" is a
// course title, not evidence).
const PROJECT_WORDS: &[&str] = &["capstone", "portfolio", "hands on", "practical"];

/// Derive structural signals from the text alone. A fallback, not a
/// replacement for real detectors: confidences are capped below what an
/// actual vision detector would report.
pub fn from_text(text: &NormalizedText) -> StructuralSignals {
    let haystack = &text.matching;

    let mut signature_conf: f64 = 0.0;
    if contains_any(haystack, SIGNATURE_WORDS) {
        signature_conf = 0.7;
    }
    if VERIFY_PATTERN.is_match(&text.display) {
        // an external verification link is stronger provenance than the
        // word "signature" printed on the document
        signature_conf = signature_conf.max(0.85);
    }

    let mut marker_conf: f64 = 0.0;
    if contains_any(haystack, MARKER_WORDS) {
        marker_conf = 0.7;
    }
    if contains_any(haystack, ASSESSMENT_WORDS) {
        marker_conf = marker_conf.max(0.6);
    }
    if contains_any(haystack, PROJECT_WORDS) {
        marker_conf = marker_conf.max(0.5);
    }

    StructuralSignals {
        signature: reading(signature_conf),
        design_marker: reading(marker_conf),
    }
}

fn reading(confidence: f64) -> Signal {
    if confidence > 0.0 {
        Signal::detected(confidence)
    } else {
        Signal::absent()
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::RawExtraction;
    use crate::normalize::TextNormalizer;

    fn signals_for(text: &str) -> StructuralSignals {
        let normalized = TextNormalizer::default()
            .normalize(RawExtraction::new(text))
            .unwrap();
        from_text(&normalized)
    }

    #[test]
    fn test_signature_keyword() {
        let s = signals_for("Certificate of Completion\nSignature of the Dean");
        assert!(s.signature.present);
        assert_eq!(s.signature.confidence, 0.7);
        assert!(!s.design_marker.present);
    }

    #[test]
    fn test_verification_link_outranks_keyword() {
        let s = signals_for("Signed certificate\nVerify at https://verify.example.com/abc");
        assert!(s.signature.present);
        assert_eq!(s.signature.confidence, 0.85);
    }

    #[test]
    fn test_verification_code() {
        let s = signals_for("Certificate code: XK29FQ81");
        assert!(s.signature.present);
        assert_eq!(s.signature.confidence, 0.85);
    }

    #[test]
    fn test_marker_and_assessment_words() {
        let s = signals_for("Bears the official seal\nProctored final examination");
        assert!(s.design_marker.present);
        assert_eq!(s.design_marker.confidence, 0.7);
    }

    #[test]
    fn test_project_words_raise_design_marker() {
        let s = signals_for("Completed the capstone with a portfolio review");
        assert!(s.design_marker.present);
        assert_eq!(s.design_marker.confidence, 0.5);
        assert!(!s.signature.present);
    }

    #[test]
    fn test_stronger_marker_channel_wins() {
        // seal wording outranks the weaker assessment and project channels
        let s = signals_for("Embossed seal\nProctored capstone assessment");
        assert_eq!(s.design_marker.confidence, 0.7);
    }

    #[test]
    fn test_plain_text_yields_nothing() {
        let s = signals_for("attended a workshop on gardening");
        assert!(!s.signature.present);
        assert!(!s.design_marker.present);
        assert_eq!(s.signature.value(), 0.0);
    }

    #[test]
    fn test_detected_clamps_confidence() {
        let s = Signal::detected(1.7);
        assert_eq!(s.confidence, 1.0);
        assert_eq!(Signal::detected(-0.2).confidence, 0.0);
    }
}
