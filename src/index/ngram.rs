// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Character n-gram inverted index.
//!
//! Maps every 2- and 3-gram of `^folded$` (boundary markers included) to the
//! entries containing it. The boundary markers make prefixes and suffixes
//! first-class: "^en" only matches entries that *start* with "en", which is
//! most of the signal for short queries.
//!
//! This is primarily a candidate generator: the fuzzy scorer runs over the
//! top few hundred candidates from here instead of the whole corpus, which
//! is what keeps fuzzy queries sub-linear in practice.
//!
//! **Invariant**: posting lists are sorted ascending and duplicate-free.
//! Build order guarantees it; the scorer and the store both rely on it.

use crate::corpus::Corpus;
use ahash::{AHashMap, AHashSet};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// The n-gram sizes the index and the pairwise scorer agree on.
pub const NGRAM_SIZES: [usize; 2] = [2, 3];

/// Weight of the Jaccard component in the combined score.
const JACCARD_WEIGHT: f32 = 0.7;
/// Weight of the query-overlap component.
const OVERLAP_WEIGHT: f32 = 0.3;
/// Cap for the per-entry frequency bonus.
const FREQUENCY_BONUS_CAP: f32 = 0.1;

/// Distinct n-grams of `^s$` for the given sizes.
pub fn gram_set(s: &str, sizes: &[usize]) -> AHashSet<String> {
    let wrapped: Vec<char> = std::iter::once('^')
        .chain(s.chars())
        .chain(std::iter::once('$'))
        .collect();

    let mut grams = AHashSet::new();
    for &n in sizes {
        if wrapped.len() >= n {
            for window in wrapped.windows(n) {
                grams.insert(window.iter().collect::<String>());
            }
        }
    }
    grams
}

/// A candidate produced by the index, scored but unverified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NGramCandidate {
    pub index: u32,
    pub score: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NGramIndex {
    postings: AHashMap<String, Vec<u32>>,
    /// Distinct-gram count per entry, the Jaccard denominator.
    gram_counts: Vec<u32>,
    /// Precomputed frequency bonus per entry, already capped.
    freq_bonus: Vec<f32>,
}

impl NGramIndex {
    /// Build from a sealed corpus. Gram extraction fans out over rayon, the
    /// merge stays single-threaded so posting lists come out sorted.
    pub fn build(corpus: &Corpus) -> Self {
        let max_freq = corpus.max_frequency();

        let per_entry: Vec<(AHashSet<String>, f32)> = corpus
            .iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(_, entry)| {
                let grams = gram_set(&entry.folded, &NGRAM_SIZES);
                let bonus = if max_freq > 0.0 {
                    FREQUENCY_BONUS_CAP * entry.frequency / max_freq
                } else {
                    0.0
                };
                (grams, bonus)
            })
            .collect();

        let mut postings: AHashMap<String, Vec<u32>> = AHashMap::new();
        let mut gram_counts = Vec::with_capacity(per_entry.len());
        let mut freq_bonus = Vec::with_capacity(per_entry.len());

        for (i, (grams, bonus)) in per_entry.into_iter().enumerate() {
            gram_counts.push(grams.len() as u32);
            freq_bonus.push(bonus);
            for gram in grams {
                postings.entry(gram).or_default().push(i as u32);
            }
        }

        NGramIndex {
            postings,
            gram_counts,
            freq_bonus,
        }
    }

    pub fn len(&self) -> usize {
        self.gram_counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gram_counts.is_empty()
    }

    pub fn distinct_grams(&self) -> usize {
        self.postings.len()
    }

    /// Top candidates for a folded query by the combined score:
    /// `0.7·jaccard + 0.3·overlap + frequency bonus`.
    pub fn candidates(&self, folded_query: &str, limit: usize) -> Vec<NGramCandidate> {
        let query_grams = gram_set(folded_query, &NGRAM_SIZES);
        if query_grams.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut shared: AHashMap<u32, u32> = AHashMap::new();
        for gram in &query_grams {
            if let Some(list) = self.postings.get(gram.as_str()) {
                for &index in list {
                    *shared.entry(index).or_insert(0) += 1;
                }
            }
        }

        let q_len = query_grams.len() as f32;
        let mut scored: Vec<NGramCandidate> = shared
            .into_iter()
            .map(|(index, hits)| {
                let c_len = self.gram_counts[index as usize] as f32;
                let hits = hits as f32;
                let jaccard = hits / (q_len + c_len - hits);
                let overlap = hits / q_len;
                let score = (JACCARD_WEIGHT * jaccard
                    + OVERLAP_WEIGHT * overlap
                    + self.freq_bonus[index as usize])
                    .min(1.0);
                NGramCandidate { index, score }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
        scored.truncate(limit);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusBuilder;
    use crate::types::Language;

    fn corpus(words: &[&str]) -> Corpus {
        let mut builder = CorpusBuilder::default();
        for w in words {
            builder.add(w, Language::En, Some(1.0), false);
        }
        builder.build(1).unwrap()
    }

    #[test]
    fn gram_set_includes_boundaries() {
        let grams = gram_set("en", &NGRAM_SIZES);
        assert!(grams.contains("^e"));
        assert!(grams.contains("en"));
        assert!(grams.contains("n$"));
        assert!(grams.contains("^en"));
        assert!(grams.contains("en$"));
    }

    #[test]
    fn exact_form_is_top_candidate() {
        let c = corpus(&["hello", "help", "world", "helpful"]);
        let index = NGramIndex::build(&c);
        let candidates = index.candidates("hello", 10);
        assert!(!candidates.is_empty());
        let top = c.entry(candidates[0].index);
        assert_eq!(top.normalized, "hello");
        assert_eq!(candidates[0].score, 1.0);
    }

    #[test]
    fn near_miss_still_surfaces() {
        let c = corpus(&["ennui", "en route", "coulisse"]);
        let index = NGramIndex::build(&c);
        let candidates = index.candidates("enui", 10);
        let texts: Vec<&str> = candidates
            .iter()
            .map(|cand| c.entry(cand.index).normalized.as_str())
            .collect();
        assert!(texts.contains(&"ennui"));
    }

    #[test]
    fn empty_query_and_zero_limit() {
        let c = corpus(&["hello"]);
        let index = NGramIndex::build(&c);
        assert!(index.candidates("", 10).is_empty());
        assert!(index.candidates("hello", 0).is_empty());
    }

    #[test]
    fn accent_folded_grams_match() {
        let c = corpus(&["café"]);
        let index = NGramIndex::build(&c);
        let candidates = index.candidates("cafe", 10);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].score, 1.0);
    }
}
