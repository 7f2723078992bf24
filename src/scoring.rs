// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Score constants and the result total order.
//!
//! Every number that decides a ranking lives in this file. The per-method
//! score policy keeps the methods in their lanes:
//!
//! | Method   | Score                                            |
//! |----------|--------------------------------------------------|
//! | exact    | 1.0, always                                      |
//! | prefix   | 0.9 minus a length-gap penalty, floor 0.75       |
//! | fuzzy    | corrected similarity from the fuzzy core         |
//! | semantic | cosine clamped at 0                              |
//!
//! The gaps are deliberate: an exact hit outranks any prefix hit, and a
//! prefix hit outranks any fuzzy hit that is not a near-duplicate. Within a
//! score tie the order falls to corpus frequency, then entry index, so the
//! full ranking is a total order and identical across runs.

use crate::corpus::Corpus;
use crate::types::SearchResult;
use std::cmp::Ordering;
use std::time::Duration;

/// Score for an exact match. Results with `method == Exact` always carry
/// exactly this value.
pub const EXACT_SCORE: f32 = 1.0;

/// Base score for prefix completions.
pub const PREFIX_BASE_SCORE: f32 = 0.9;

/// Per-character penalty for completions longer than the query.
pub const PREFIX_LENGTH_GAP_PENALTY: f32 = 0.01;

/// Prefix scores never drop below this.
pub const PREFIX_FLOOR: f32 = 0.75;

/// Default relevance threshold. One constant, used by the engine default
/// options and nothing else - call sites never hard-code their own.
pub const DEFAULT_MIN_SCORE: f32 = 0.6;

/// Default result cap.
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Per-method compute budget.
pub const DEFAULT_METHOD_DEADLINE: Duration = Duration::from_millis(250);

/// Whole-query budget.
pub const DEFAULT_QUERY_DEADLINE: Duration = Duration::from_millis(500);

/// How many n-gram candidates feed the fuzzy scorer.
pub const FUZZY_CANDIDATE_LIMIT: usize = 500;

/// How many BK-tree hits join the fuzzy candidate set.
pub const BK_CANDIDATE_LIMIT: usize = 64;

/// Prefix completion score: longer completions pay a small penalty so
/// "help" sits above "helpful" for the query "hel".
pub fn prefix_score(query_chars: usize, candidate_chars: usize) -> f32 {
    let gap = candidate_chars.saturating_sub(query_chars) as f32;
    (PREFIX_BASE_SCORE - PREFIX_LENGTH_GAP_PENALTY * gap).max(PREFIX_FLOOR)
}

/// Map a raw cosine onto the score scale. Negative similarity carries no
/// ranking signal for this corpus, so it clamps to zero.
pub fn semantic_score(cosine: f32) -> f32 {
    cosine.clamp(0.0, 1.0)
}

/// The result total order: score descending, then corpus frequency
/// descending, then entry index ascending. Deterministic by construction.
pub fn compare_results(a: &SearchResult, b: &SearchResult, corpus: &Corpus) -> Ordering {
    match b.score.partial_cmp(&a.score) {
        Some(Ordering::Equal) | None => {}
        Some(ord) => return ord,
    }

    let freq_a = corpus.get(a.index).map_or(0.0, |e| e.frequency);
    let freq_b = corpus.get(b.index).map_or(0.0, |e| e.frequency);
    match freq_b.partial_cmp(&freq_a) {
        Some(Ordering::Equal) | None => {}
        Some(ord) => return ord,
    }

    a.index.cmp(&b.index)
}
