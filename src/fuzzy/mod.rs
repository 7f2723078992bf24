// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The fuzzy scoring core: a stateless library of string-similarity
//! algorithms plus the heuristics that pick and correct them.
//!
//! Two decisions live here and nowhere else:
//!
//! 1. **Algorithm selection** ([`select_algorithm`]) - a function of query
//!    shape only. Short queries go to Jaro-Winkler (abbreviation-friendly),
//!    everything else to the weighted ratio, with a phonetic nudge for long
//!    queries.
//! 2. **Length correction** ([`length_corrected`]) - the raw similarity of
//!    "enui" and "en" is embarrassingly high; the correction multiplies in
//!    a length-ratio term for single words, rewards aligned tokens for
//!    phrase-to-phrase matches, and penalizes word-to-phrase mismatches
//!    hard.
//!
//! Callers are expected to pass **folded** (accent-insensitive) forms; the
//! scorer never folds on its own.

pub mod jaro;
pub mod levenshtein;
pub mod phonetic;
pub mod wratio;

pub use jaro::{jaro, jaro_winkler};
pub use levenshtein::{levenshtein, levenshtein_within};
pub use phonetic::{metaphone, soundex};
pub use wratio::{partial_ratio, ratio, token_set_ratio, token_sort_ratio, wratio};

use crate::index::ngram::{gram_set, NGRAM_SIZES};
use crate::types::FuzzyAlgorithm;

/// Pairs of phrase tokens at or above this similarity count as aligned.
const ALIGNMENT_THRESHOLD: f32 = 0.8;
/// Score bonus when a long query shares a phonetic code with the candidate.
/// Small enough to only break ties.
const PHONETIC_TIE_BONUS: f32 = 0.01;
/// Query length beyond which the phonetic fallback kicks in.
const PHONETIC_FALLBACK_LEN: usize = 8;

/// A scored candidate with the diagnostics the planner forwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyScore {
    pub score: f32,
    pub algorithm: FuzzyAlgorithm,
    pub edit_distance: u32,
}

/// Pick the algorithm from the query's shape alone:
/// digits anywhere -> weighted ratio; length <= 3 -> Jaro-Winkler;
/// everything longer -> weighted ratio (phonetic tie-nudge past 8 chars).
pub fn select_algorithm(query: &str) -> FuzzyAlgorithm {
    if query.chars().any(|c| c.is_ascii_digit()) {
        return FuzzyAlgorithm::WeightedRatio;
    }
    match query.chars().count() {
        0..=3 => FuzzyAlgorithm::JaroWinkler,
        _ => FuzzyAlgorithm::WeightedRatio,
    }
}

/// Raw similarity for one algorithm, uncorrected, in [0, 1].
pub fn base_score(algorithm: FuzzyAlgorithm, query: &str, candidate: &str) -> f32 {
    match algorithm {
        FuzzyAlgorithm::WeightedRatio => wratio(query, candidate),
        FuzzyAlgorithm::Levenshtein => levenshtein::similarity(query, candidate),
        FuzzyAlgorithm::JaroWinkler => jaro_winkler(query, candidate),
        FuzzyAlgorithm::Soundex => {
            let code = soundex(query);
            if code != "0000" && code == soundex(candidate) {
                levenshtein::similarity(query, candidate)
            } else {
                0.0
            }
        }
        FuzzyAlgorithm::Metaphone => {
            let code = metaphone(query);
            if !code.is_empty() && code == metaphone(candidate) {
                levenshtein::similarity(query, candidate)
            } else {
                0.0
            }
        }
        FuzzyAlgorithm::NGram => ngram_similarity(query, candidate),
    }
}

/// The n-gram index's combined score exposed as a direct pairwise scorer.
pub fn ngram_similarity(a: &str, b: &str) -> f32 {
    let grams_a = gram_set(a, &NGRAM_SIZES);
    let grams_b = gram_set(b, &NGRAM_SIZES);
    if grams_a.is_empty() || grams_b.is_empty() {
        return 0.0;
    }
    let shared = grams_a.intersection(&grams_b).count() as f32;
    let union = (grams_a.len() + grams_b.len()) as f32 - shared;
    let jaccard = shared / union;
    let overlap = shared / grams_a.len() as f32;
    0.7 * jaccard + 0.3 * overlap
}

/// Fraction of phrase tokens that align across the two sides.
///
/// Greedy bipartite matching by edit-distance similarity: each token on the
/// shorter side claims its closest unclaimed counterpart; a pair counts when
/// the similarity clears [`ALIGNMENT_THRESHOLD`]. Exact assignment is not
/// worth the trouble for <= 8-token phrases.
pub fn phrase_alignment(a: &str, b: &str) -> f32 {
    let tokens_a: Vec<&str> = a.split_whitespace().collect();
    let tokens_b: Vec<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let (fewer, more) = if tokens_a.len() <= tokens_b.len() {
        (&tokens_a, &tokens_b)
    } else {
        (&tokens_b, &tokens_a)
    };

    let mut claimed = vec![false; more.len()];
    let mut aligned = 0usize;
    for &token in fewer.iter() {
        let mut best: Option<(usize, f32)> = None;
        for (j, &other) in more.iter().enumerate() {
            if claimed[j] {
                continue;
            }
            let sim = levenshtein::similarity(token, other);
            if best.map_or(true, |(_, s)| sim > s) {
                best = Some((j, sim));
            }
        }
        if let Some((j, sim)) = best {
            claimed[j] = true;
            if sim >= ALIGNMENT_THRESHOLD {
                aligned += 1;
            }
        }
    }

    aligned as f32 / tokens_a.len().max(tokens_b.len()) as f32
}

/// Apply the length correction to a base score.
///
/// - single word vs single word: `s · (0.5 + 0.5·lr)`
/// - phrase vs phrase: `s · (0.75 + 0.25·aligned_fraction)`
/// - mixed: `s · lr`
///
/// where `lr = min(|q|,|c|) / max(|q|,|c|)`.
pub fn length_corrected(score: f32, query: &str, candidate: &str) -> f32 {
    let lq = query.chars().count();
    let lc = candidate.chars().count();
    if lq == 0 || lc == 0 {
        return 0.0;
    }
    let lr = lq.min(lc) as f32 / lq.max(lc) as f32;

    match (query.contains(' '), candidate.contains(' ')) {
        (false, false) => score * (0.5 + 0.5 * lr),
        (true, true) => score * (0.75 + 0.25 * phrase_alignment(query, candidate)),
        _ => score * lr,
    }
}

/// Full pipeline for one candidate: select, score, correct, clamp.
pub fn score_candidate(query: &str, candidate: &str) -> FuzzyScore {
    let algorithm = select_algorithm(query);
    let mut score = base_score(algorithm, query, candidate);
    score = length_corrected(score, query, candidate);

    // Phonetic fallback for long queries: equal codes win ties.
    if algorithm == FuzzyAlgorithm::WeightedRatio
        && query.chars().count() > PHONETIC_FALLBACK_LEN
        && !query.contains(' ')
    {
        let code = metaphone(query);
        if !code.is_empty() && code == metaphone(candidate) {
            score += PHONETIC_TIE_BONUS;
        }
    }

    FuzzyScore {
        score: score.clamp(0.0, 1.0),
        algorithm,
        edit_distance: levenshtein(query, candidate) as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_follows_query_shape() {
        assert_eq!(select_algorithm("ab1"), FuzzyAlgorithm::WeightedRatio);
        assert_eq!(select_algorithm("ab"), FuzzyAlgorithm::JaroWinkler);
        assert_eq!(select_algorithm("abc"), FuzzyAlgorithm::JaroWinkler);
        assert_eq!(select_algorithm("abcd"), FuzzyAlgorithm::WeightedRatio);
        assert_eq!(
            select_algorithm("abcdefghij"),
            FuzzyAlgorithm::WeightedRatio
        );
    }

    #[test]
    fn length_correction_demotes_short_candidates() {
        // Same base score, one candidate length-matched, one not.
        let matched = length_corrected(0.9, "enui", "nnui");
        let shorter = length_corrected(0.9, "enui", "en");
        assert!(matched > shorter);
        // Exact length match leaves the score untouched.
        assert_eq!(length_corrected(0.9, "abcd", "dcba"), 0.9);
    }

    #[test]
    fn phrase_alignment_rewards_token_matches() {
        assert_eq!(phrase_alignment("en coulisse", "en coulisse"), 1.0);
        // One-edit token still aligns.
        assert_eq!(phrase_alignment("en coulise", "en coulisse"), 1.0);
        // Disjoint phrases do not.
        assert_eq!(phrase_alignment("machine learning", "a la carte"), 0.0);
    }

    #[test]
    fn mixed_word_phrase_pays_length_ratio() {
        let s = length_corrected(1.0, "route", "en route");
        assert!((s - 5.0 / 8.0).abs() < 1e-6);
    }

    #[test]
    fn enui_beats_en_end_to_end() {
        let ennui = score_candidate("enui", "ennui");
        let en = score_candidate("enui", "en");
        assert!(ennui.score >= 0.75, "got {}", ennui.score);
        assert!(ennui.score > en.score);
        assert_eq!(ennui.edit_distance, 1);
    }

    #[test]
    fn phrase_match_keeps_alignment_bonus() {
        let m = score_candidate("en coulise", "en coulisse");
        assert!(m.score >= 0.80, "got {}", m.score);
    }

    #[test]
    fn scores_clamped_to_unit_interval() {
        let m = score_candidate("identical", "identical");
        assert!(m.score <= 1.0 && m.score >= 0.0);
        assert_eq!(m.score, 1.0);
    }
}
