//! Text normalization — one display view, one matching view
//!
//! OCR output is noisy: inconsistent casing, stray whitespace, and the
//! classic character confusions ("0" read as "O", "1" as "l"). The
//! normalizer produces two views of the same text:
//!
//! - a **display** string with whitespace collapsed but original casing
//!   preserved, echoed back in results;
//! - a **matching** string (plus token stream) that is lowercased,
//!   confusion-folded, and punctuation-stripped, used by every matcher
//!   downstream and never shown to anyone.

use crate::extract::RawExtraction;
use crate::{CertigradeError, CertigradeResult};
use std::collections::HashMap;

// ─── Confusion Map ─────────────────────────────────────────────────

/// Characters OCR engines commonly swap, folded to one canonical form.
/// Applied only to the matching view, never to the display string.
const DEFAULT_PAIRS: &[(char, char)] = &[
    ('0', 'o'),
    ('1', 'l'),
    ('5', 's'),
    ('8', 'b'),
    ('|', 'l'),
];

#[derive(Debug, Clone)]
pub struct ConfusionMap {
    map: HashMap<char, char>,
}

impl Default for ConfusionMap {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_PAIRS)
    }
}

impl ConfusionMap {
    pub fn from_pairs(pairs: &[(char, char)]) -> Self {
        Self {
            map: pairs.iter().copied().collect(),
        }
    }

    /// Default OCR confusions plus caller-supplied overrides
    pub fn with_extra_pairs(extra: &[(char, char)]) -> Self {
        let mut map: HashMap<char, char> = DEFAULT_PAIRS.iter().copied().collect();
        map.extend(extra.iter().copied());
        Self { map }
    }

    pub fn fold(&self, c: char) -> char {
        self.map.get(&c).copied().unwrap_or(c)
    }
}

// ─── Normalized Text ───────────────────────────────────────────────

/// Cleaned text derived from a [`RawExtraction`]. Never mutated after
/// construction; retains the original extraction for echoing in results.
#[derive(Debug, Clone)]
pub struct NormalizedText {
    pub raw: RawExtraction,
    /// Whitespace-collapsed, casing preserved
    pub display: String,
    /// Lowercased, confusion-folded, punctuation-stripped
    pub matching: String,
    /// `matching` split on whitespace
    pub tokens: Vec<String>,
}

impl NormalizedText {
    /// First non-empty display line — the best raw guess at the issuer
    /// mention when nothing in the registry matches
    pub fn leading_line(&self) -> &str {
        self.display.lines().next().unwrap_or("")
    }
}

// ─── Normalizer ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    confusions: ConfusionMap,
}

impl TextNormalizer {
    pub fn new(confusions: ConfusionMap) -> Self {
        Self { confusions }
    }

    /// Normalize one extraction. Empty or whitespace-only input is refused
    /// up front rather than flowing through the pipeline as a degenerate
    /// document.
    pub fn normalize(&self, raw: RawExtraction) -> CertigradeResult<NormalizedText> {
        if raw.text.trim().is_empty() {
            return Err(CertigradeError::EmptyExtraction);
        }

        let display: String = raw
            .text
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        let matching = self.fold_for_matching(&display);
        let tokens = matching.split_whitespace().map(str::to_string).collect();

        Ok(NormalizedText {
            raw,
            display,
            matching,
            tokens,
        })
    }

    /// Fold a string into the matching alphabet: lowercase, confusion map
    /// applied, everything non-alphanumeric collapsed to a single space.
    /// Dots and apostrophes act as joiners so dotted acronyms collapse —
    /// "I.B.M." and "IBM" both fold to "ibm". Registry aliases and taxonomy
    /// patterns are folded through this same function, so both sides of
    /// every comparison live in the same alphabet.
    pub fn fold_for_matching(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut pending_space = false;
        for ch in input.chars() {
            for lower in ch.to_lowercase() {
                let folded = self.confusions.fold(lower);
                if folded.is_alphanumeric() {
                    if pending_space && !out.is_empty() {
                        out.push(' ');
                    }
                    pending_space = false;
                    out.push(folded);
                } else if !matches!(folded, '.' | '\'' | '’') {
                    pending_space = true;
                }
            }
        }
        out
    }
}
