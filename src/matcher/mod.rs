//! Issuer resolution — multi-strategy matching against the trust registry
//!
//! Strategies run in a fixed priority ladder, first hit wins:
//!
//! 1. **Exact alias** — token n-grams probed against a pre-built alias
//!    index. Cost is proportional to the token stream and index, never to
//!    a full registry scan.
//! 2. **Substring** — a folded alias contained in the matching view, with
//!    a word boundary on at least one side (OCR likes to weld tokens
//!    together).
//! 3. **Fuzzy** — normalized Levenshtein similarity against every alias,
//!    accepted only at or above the configured threshold. Reached only
//!    when the cheap strategies miss.
//!
//! Ties within one strategy go to the higher trust tier (benefit of the
//! doubt belongs to the better-known issuer), then to the lexicographically
//! smaller canonical name so resolution stays deterministic.

use crate::normalize::{NormalizedText, TextNormalizer};
use crate::registry::{ReferenceData, TrustTier};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─── Match Output ──────────────────────────────────────────────────

/// Which strategy produced the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMethod {
    ExactAlias,
    Substring,
    Fuzzy,
    Unmatched,
}

/// Resolved issuer: canonical name when matched, the raw mention otherwise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerMatch {
    pub issuer: String,
    pub tier: TrustTier,
    pub confidence: f64,
    pub method: MatchMethod,
}

// ─── Matcher ───────────────────────────────────────────────────────

pub struct IssuerMatcher {
    /// folded alias → entry index; collisions resolved at build time in
    /// favor of the higher trust tier
    alias_index: HashMap<String, usize>,
    /// all (folded alias, entry index) pairs for the substring/fuzzy passes
    aliases: Vec<(String, usize)>,
    /// canonical name + tier per registry entry
    entries: Vec<(String, TrustTier)>,
    max_alias_tokens: usize,
    fuzzy_threshold: f64,
}

impl IssuerMatcher {
    pub fn new(data: &ReferenceData, normalizer: &TextNormalizer, fuzzy_threshold: f64) -> Self {
        let mut alias_index: HashMap<String, usize> = HashMap::new();
        let mut aliases: Vec<(String, usize)> = Vec::new();
        let mut entries: Vec<(String, TrustTier)> = Vec::new();
        let mut max_alias_tokens = 0usize;

        for record in &data.issuers {
            let idx = entries.len();
            entries.push((record.name.clone(), record.tier));

            let surfaces = std::iter::once(record.name.as_str())
                .chain(record.aliases.iter().map(String::as_str));
            for surface in surfaces {
                let folded = normalizer.fold_for_matching(surface);
                if folded.is_empty() {
                    continue;
                }
                max_alias_tokens = max_alias_tokens.max(folded.split_whitespace().count());
                match alias_index.entry(folded.clone()) {
                    std::collections::hash_map::Entry::Vacant(slot) => {
                        slot.insert(idx);
                    }
                    std::collections::hash_map::Entry::Occupied(mut slot) => {
                        let existing = entries[*slot.get()].1;
                        if record.tier < existing {
                            slot.insert(idx);
                        }
                    }
                }
                aliases.push((folded, idx));
            }
        }

        Self {
            alias_index,
            aliases,
            entries,
            max_alias_tokens,
            fuzzy_threshold,
        }
    }

    /// Resolve the issuer mentioned in a normalized text. Deterministic:
    /// identical input and registry state always produce the same match.
    pub fn resolve(&self, text: &NormalizedText) -> IssuerMatch {
        if let Some(hit) = self.exact_alias(text) {
            return hit;
        }
        if let Some(hit) = self.substring(text) {
            return hit;
        }
        if let Some(hit) = self.fuzzy(text) {
            return hit;
        }

        tracing::debug!(mention = text.leading_line(), "issuer unmatched");
        IssuerMatch {
            issuer: text.leading_line().to_string(),
            tier: TrustTier::Unknown,
            confidence: 0.0,
            method: MatchMethod::Unmatched,
        }
    }

    /// Strategy 1: longest token n-grams first, O(1) index probes
    fn exact_alias(&self, text: &NormalizedText) -> Option<IssuerMatch> {
        let tokens = &text.tokens;
        let longest = self.max_alias_tokens.min(tokens.len());
        for n in (1..=longest).rev() {
            let mut hits: Vec<usize> = Vec::new();
            for window in tokens.windows(n) {
                let key = window.join(" ");
                if let Some(&idx) = self.alias_index.get(&key) {
                    hits.push(idx);
                }
            }
            if let Some(idx) = self.best_entry(hits) {
                return Some(self.matched(idx, 1.0, MatchMethod::ExactAlias));
            }
        }
        None
    }

    /// Strategy 2: folded alias contained in the matching view. Catches
    /// token-welding OCR artifacts ("CourseraCertificate"), so a word
    /// boundary is required on one side only — but short aliases are
    /// excluded entirely ("mit" inside "committee" is not a match).
    fn substring(&self, text: &NormalizedText) -> Option<IssuerMatch> {
        const MIN_SUBSTRING_ALIAS: usize = 5;
        let hits: Vec<usize> = self
            .aliases
            .iter()
            .filter(|(alias, _)| {
                alias.len() >= MIN_SUBSTRING_ALIAS
                    && contained_near_boundary(&text.matching, alias)
            })
            .map(|&(_, idx)| idx)
            .collect();
        self.best_entry(hits)
            .map(|idx| self.matched(idx, 0.9, MatchMethod::Substring))
    }

    /// Strategy 3: normalized Levenshtein over token n-grams vs every alias
    fn fuzzy(&self, text: &NormalizedText) -> Option<IssuerMatch> {
        let tokens = &text.tokens;
        let longest = self.max_alias_tokens.min(tokens.len());

        // best = (similarity, tier, name, entry index)
        let mut best: Option<(f64, TrustTier, String, usize)> = None;
        for n in 1..=longest {
            for window in tokens.windows(n) {
                let gram = window.join(" ");
                for (alias, idx) in &self.aliases {
                    let similarity = strsim::normalized_levenshtein(&gram, alias);
                    if similarity < self.fuzzy_threshold {
                        continue;
                    }
                    let (name, tier) = &self.entries[*idx];
                    let better = match &best {
                        None => true,
                        Some((best_sim, best_tier, best_name, _)) => {
                            similarity > *best_sim
                                || (similarity == *best_sim
                                    && (*tier < *best_tier
                                        || (*tier == *best_tier && name < best_name)))
                        }
                    };
                    if better {
                        best = Some((similarity, *tier, name.clone(), *idx));
                    }
                }
            }
        }

        best.map(|(similarity, _, _, idx)| {
            self.matched(idx, similarity * 0.85, MatchMethod::Fuzzy)
        })
    }

    /// Tie-break: higher trust tier first, then canonical name
    fn best_entry(&self, mut hits: Vec<usize>) -> Option<usize> {
        hits.sort_unstable();
        hits.dedup();
        hits.into_iter().min_by(|&a, &b| {
            let (name_a, tier_a) = &self.entries[a];
            let (name_b, tier_b) = &self.entries[b];
            tier_a.cmp(tier_b).then_with(|| name_a.cmp(name_b))
        })
    }

    fn matched(&self, idx: usize, confidence: f64, method: MatchMethod) -> IssuerMatch {
        let (name, tier) = &self.entries[idx];
        IssuerMatch {
            issuer: name.clone(),
            tier: *tier,
            confidence,
            method,
        }
    }
}

/// True when `needle` occurs in `haystack` with a word boundary on at
/// least one side of the occurrence
fn contained_near_boundary(haystack: &str, needle: &str) -> bool {
    let mut from = 0;
    while let Some(offset) = haystack[from..].find(needle) {
        let start = from + offset;
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if before_ok || after_ok {
            return true;
        }
        // advance past the full character at `start` — a one-byte step can
        // land mid-character when the needle starts with a multi-byte char
        from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }
    false
}
