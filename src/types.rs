// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The building blocks of the search core.
//!
//! These types flow through every layer: ingestion produces [`Entry`] values,
//! the corpus seals them, the indices address them by dense `u32` index, and
//! the query planner hands them back as [`SearchResult`]s.
//!
//! # Invariants (the stuff that breaks if you ignore it)
//!
//! - **Entry**: `normalized` is exactly the normalizer output for `text`, and
//!   `folded` is the accent-stripped view of `normalized`. Indices compare
//!   folded forms; results surface `text` with diacritics intact.
//! - **SearchMethod**: declaration order is the dedup priority. The merger
//!   relies on `Exact < Prefix < Fuzzy < Semantic` (smaller wins), the same
//!   trick the ranking uses for match types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Supported lexicon languages, ISO-639-1 tags plus a multilingual bucket.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
    Es,
    De,
    It,
    /// Entries whose source spans languages (e.g. borrowed idioms).
    Multi,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
            Language::Es => "es",
            Language::De => "de",
            Language::It => "it",
            Language::Multi => "multi",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Language::En),
            "fr" => Ok(Language::Fr),
            "es" => Ok(Language::Es),
            "de" => Ok(Language::De),
            "it" => Ok(Language::It),
            "multi" => Ok(Language::Multi),
            other => Err(crate::error::Error::Config(format!(
                "unknown language tag '{other}'"
            ))),
        }
    }
}

/// A single lexical item: word, phrase, or idiom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Original form as ingested, diacritics and capitalization preserved.
    pub text: String,
    /// Canonical form used for indexing and exact/prefix matching.
    pub normalized: String,
    /// Accent-insensitive view of `normalized` (NFD, combining marks removed).
    /// Used by the BK-tree, the n-gram index, and the fuzzy scorer.
    pub folded: String,
    /// True when `normalized` contains whitespace or >= 2 hyphen-joined parts.
    pub is_phrase: bool,
    /// True when the source marks this as a semantically non-compositional
    /// expression.
    pub is_idiom: bool,
    pub language: Language,
    /// Source-provided frequency; 0 when unknown. Tie-breaker for ranking and
    /// the trie's subtree hints.
    pub frequency: f32,
}

/// How a result was found.
///
/// Declaration order doubles as dedup priority: when several methods return
/// the same entry, the smallest variant wins and the rest are kept in
/// [`MatchMeta::also_found`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    Exact,
    Prefix,
    Fuzzy,
    Semantic,
}

impl SearchMethod {
    pub const ALL: [SearchMethod; 4] = [
        SearchMethod::Exact,
        SearchMethod::Prefix,
        SearchMethod::Fuzzy,
        SearchMethod::Semantic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SearchMethod::Exact => "exact",
            SearchMethod::Prefix => "prefix",
            SearchMethod::Fuzzy => "fuzzy",
            SearchMethod::Semantic => "semantic",
        }
    }
}

impl fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The scoring algorithms the fuzzy layer can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuzzyAlgorithm {
    WeightedRatio,
    Levenshtein,
    JaroWinkler,
    Soundex,
    Metaphone,
    NGram,
}

impl FuzzyAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            FuzzyAlgorithm::WeightedRatio => "weighted_ratio",
            FuzzyAlgorithm::Levenshtein => "levenshtein",
            FuzzyAlgorithm::JaroWinkler => "jaro_winkler",
            FuzzyAlgorithm::Soundex => "soundex",
            FuzzyAlgorithm::Metaphone => "metaphone",
            FuzzyAlgorithm::NGram => "ngram",
        }
    }
}

/// Per-result diagnostics carried alongside the score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchMeta {
    /// Which fuzzy algorithm produced the score, when the method was fuzzy.
    pub algorithm: Option<FuzzyAlgorithm>,
    /// Edit distance to the query, where the method computed one.
    pub edit_distance: Option<u32>,
    /// Scores from methods that also found this entry but lost the dedup.
    pub also_found: Vec<(SearchMethod, f32)>,
}

/// What the query planner returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Dense corpus index of the matched entry.
    pub index: u32,
    /// Original entry text, diacritics intact.
    pub text: String,
    /// Relevance in [0, 1].
    pub score: f32,
    pub method: SearchMethod,
    pub is_phrase: bool,
    pub meta: MatchMeta,
}

/// A non-fatal condition attached to a result set (never an error).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchWarning {
    pub method: SearchMethod,
    pub message: String,
}

/// Results plus the warnings accumulated while producing them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    pub warnings: Vec<SearchWarning>,
}

impl Default for SearchResult {
    fn default() -> Self {
        SearchResult {
            index: 0,
            text: String::new(),
            score: 0.0,
            method: SearchMethod::Exact,
            is_phrase: false,
            meta: MatchMeta::default(),
        }
    }
}

/// Rolling counters for one search method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodStats {
    pub invocations: u64,
    pub results: u64,
    pub timeouts: u64,
    pub total_time: Duration,
}

impl MethodStats {
    /// Mean latency per invocation; zero when the method never ran.
    pub fn mean_latency(&self) -> Duration {
        if self.invocations == 0 {
            Duration::ZERO
        } else {
            self.total_time / self.invocations as u32
        }
    }
}

/// Engine-level statistics exposed to upstream collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub generation: u64,
    pub corpus_len: usize,
    pub searches: u64,
    /// Indexed by [`SearchMethod::ALL`] order.
    pub methods: [MethodStats; 4],
}

impl SearchStats {
    pub fn method(&self, method: SearchMethod) -> &MethodStats {
        &self.methods[method as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_priority_order() {
        // The merger depends on this ordering; see search/merge.rs.
        assert!(SearchMethod::Exact < SearchMethod::Prefix);
        assert!(SearchMethod::Prefix < SearchMethod::Fuzzy);
        assert!(SearchMethod::Fuzzy < SearchMethod::Semantic);
    }

    #[test]
    fn language_roundtrip() {
        for lang in [
            Language::En,
            Language::Fr,
            Language::Es,
            Language::De,
            Language::It,
            Language::Multi,
        ] {
            assert_eq!(lang.as_str().parse::<Language>().unwrap(), lang);
        }
        assert!("zz".parse::<Language>().is_err());
    }

    #[test]
    fn mean_latency_zero_when_unused() {
        assert_eq!(MethodStats::default().mean_latency(), Duration::ZERO);
    }
}
