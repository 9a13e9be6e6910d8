//! Skill extraction — taxonomy phrase matching over the token stream
//!
//! A single Aho-Corasick automaton holds every folded surface pattern in the
//! taxonomy. Leftmost-longest matching means multi-word phrases win over
//! their fragments: "Data Analysis" is captured as one tag rather than
//! splitting into lower-value partial matches, and overlaps at the same
//! position keep only the longest. Matches are accepted at word boundaries
//! only, mapped to canonical skill names, deduplicated case-insensitively,
//! and returned in alphabetical order — input order carries no meaning, so
//! output order is pinned for determinism.

use aho_corasick::{AhoCorasick, MatchKind};
use crate::normalize::{NormalizedText, TextNormalizer};
use crate::registry::ReferenceData;
use crate::{CertigradeError, CertigradeResult};
use std::collections::BTreeMap;

pub struct SkillTagger {
    automaton: AhoCorasick,
    /// pattern index → canonical skill name
    canonical: Vec<String>,
}

impl SkillTagger {
    pub fn new(data: &ReferenceData, normalizer: &TextNormalizer) -> CertigradeResult<Self> {
        let mut patterns: Vec<String> = Vec::new();
        let mut canonical: Vec<String> = Vec::new();

        for entry in &data.skills {
            let surfaces = std::iter::once(entry.name.as_str())
                .chain(entry.patterns.iter().map(String::as_str));
            for surface in surfaces {
                let folded = normalizer.fold_for_matching(surface);
                if folded.is_empty() {
                    continue;
                }
                patterns.push(folded);
                canonical.push(entry.name.clone());
            }
        }

        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(&patterns)
            .map_err(|e| {
                CertigradeError::Config(format!("failed to build skill taxonomy automaton: {e}"))
            })?;

        Ok(Self { automaton, canonical })
    }

    /// Extract canonical skill tags. No match anywhere is an empty set,
    /// not an error.
    pub fn tag(&self, text: &NormalizedText) -> Vec<String> {
        let haystack = &text.matching;
        // lowercase name → canonical name; BTreeMap gives the alphabetical
        // output order for free
        let mut found: BTreeMap<String, String> = BTreeMap::new();

        for hit in self.automaton.find_iter(haystack) {
            if !word_bounded(haystack, hit.start(), hit.end()) {
                continue;
            }
            let name = &self.canonical[hit.pattern().as_usize()];
            found
                .entry(name.to_lowercase())
                .or_insert_with(|| name.clone());
        }

        found.into_values().collect()
    }
}

/// Whole-word check: the match may not sit inside a larger alphanumeric run
/// ("python" must not fire inside "pythonic")
fn word_bounded(haystack: &str, start: usize, end: usize) -> bool {
    let before_ok = haystack[..start]
        .chars()
        .next_back()
        .map_or(true, |c| !c.is_alphanumeric());
    let after_ok = haystack[end..]
        .chars()
        .next()
        .map_or(true, |c| !c.is_alphanumeric());
    before_ok && after_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::RawExtraction;
    use crate::registry::SkillEntry;

    fn tagger_for(skills: Vec<SkillEntry>) -> (SkillTagger, TextNormalizer) {
        let normalizer = TextNormalizer::default();
        let data = ReferenceData {
            issuers: vec![],
            skills,
        };
        let tagger = SkillTagger::new(&data, &normalizer).unwrap();
        (tagger, normalizer)
    }

    fn skill(name: &str, patterns: &[&str]) -> SkillEntry {
        SkillEntry {
            name: name.into(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn tags(text: &str, skills: Vec<SkillEntry>) -> Vec<String> {
        let (tagger, normalizer) = tagger_for(skills);
        let normalized = normalizer.normalize(RawExtraction::new(text)).unwrap();
        tagger.tag(&normalized)
    }

    #[test]
    fn test_multiword_phrase_wins_over_fragment() {
        let found = tags(
            "Data Analysis with Python",
            vec![
                skill("Data Entry", &["data"]),
                skill("Data Analysis", &[]),
                skill("Python", &[]),
            ],
        );
        assert_eq!(found, vec!["Data Analysis", "Python"]);
    }

    #[test]
    fn test_synonym_maps_to_canonical() {
        let found = tags(
            "Advanced Data Analytics certificate",
            vec![skill("Data Analysis", &["data analytics"])],
        );
        assert_eq!(found, vec!["Data Analysis"]);
    }

    #[test]
    fn test_no_partial_word_matches() {
        let found = tags(
            "A pythonic journey",
            vec![skill("Python", &[])],
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_case_insensitive_dedup() {
        let found = tags(
            "PYTHON and python and Python 3",
            vec![skill("Python", &["python 3"])],
        );
        assert_eq!(found, vec!["Python"]);
    }

    #[test]
    fn test_alphabetical_order() {
        let found = tags(
            "SQL before Machine Learning before Excel",
            vec![
                skill("SQL", &[]),
                skill("Machine Learning", &[]),
                skill("Excel", &[]),
            ],
        );
        assert_eq!(found, vec!["Excel", "Machine Learning", "SQL"]);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let found = tags("Certificate of Attendance", vec![skill("Python", &[])]);
        assert!(found.is_empty());
    }

    #[test]
    fn test_longer_overlap_at_same_position() {
        let found = tags(
            "Covers JavaScript fundamentals",
            vec![skill("Java", &[]), skill("JavaScript", &[])],
        );
        assert_eq!(found, vec!["JavaScript"]);
    }
}
