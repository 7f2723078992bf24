// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Cross-method result deduplication.
//!
//! An entry should appear at most once in a result set. Sounds obvious, but
//! it is easy to get wrong when four methods race and three of them find
//! the same word. `ResultMerger` enforces entry-index-only deduplication:
//! the key is the `u32` index, nothing composite, so the same entry can
//! never slip through twice under different methods.
//!
//! When methods collide on an entry, the winner is chosen by:
//! 1. **Method priority** - exact > prefix > fuzzy > semantic (the
//!    `SearchMethod` enum order).
//! 2. **Score** - higher wins within the same method.
//!
//! The losers are not discarded: their `(method, score)` pairs move into
//! the winner's metadata so callers can see the full picture.

use crate::corpus::Corpus;
use crate::scoring::compare_results;
use crate::types::SearchResult;
use ahash::AHashMap;

pub struct ResultMerger<'a> {
    /// entry index -> best result so far. Index-only key, on purpose.
    map: AHashMap<u32, SearchResult>,
    corpus: &'a Corpus,
}

impl<'a> ResultMerger<'a> {
    pub fn new(corpus: &'a Corpus) -> Self {
        ResultMerger {
            map: AHashMap::new(),
            corpus,
        }
    }

    /// Merge one result, keeping the best per entry index.
    pub fn merge(&mut self, result: SearchResult) {
        match self.map.get_mut(&result.index) {
            None => {
                self.map.insert(result.index, result);
            }
            Some(existing) => {
                let incoming_wins = (result.method, std::cmp::Reverse(ordered(result.score)))
                    < (existing.method, std::cmp::Reverse(ordered(existing.score)));
                if incoming_wins {
                    let mut winner = result;
                    winner
                        .meta
                        .also_found
                        .push((existing.method, existing.score));
                    winner.meta.also_found.append(&mut existing.meta.also_found);
                    *existing = winner;
                } else {
                    existing.meta.also_found.push((result.method, result.score));
                }
            }
        }
    }

    pub fn merge_all(&mut self, results: impl IntoIterator<Item = SearchResult>) {
        for result in results {
            self.merge(result);
        }
    }

    /// Threshold, rank, truncate. Consumes the merger.
    pub fn into_ranked(self, min_score: f32, max_results: usize) -> Vec<SearchResult> {
        let corpus = self.corpus;
        let mut results: Vec<SearchResult> = self
            .map
            .into_values()
            .filter(|r| r.score >= min_score)
            .collect();
        results.sort_by(|a, b| compare_results(a, b, corpus));
        results.truncate(max_results);
        results
    }
}

/// Total-ordered bits of an f32 score (scores are finite and >= 0 here).
fn ordered(score: f32) -> u32 {
    score.to_bits()
}
