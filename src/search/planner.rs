// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The query planner: pick methods, run them concurrently, merge.
//!
//! Method selection is a function of query shape, nothing else:
//!
//! ```text
//! phrase (has space)   -> exact + semantic + fuzzy
//! <= 3 chars           -> prefix + exact
//! <= 8 chars           -> exact + fuzzy
//! >  8 chars           -> exact + fuzzy + semantic
//! ```
//!
//! Each selected method runs on its own scoped thread against the shared
//! immutable snapshot. Methods police their own deadline: the fuzzy scorer
//! checks the clock between candidate chunks and returns whatever it has
//! when time runs out. A deadline overrun is a warning on the outcome,
//! never an error, and one method blowing up never takes the query down.
//!
//! The final order comes from the ranking rule alone - method completion
//! order cannot leak into results.

use crate::fuzzy;
use crate::index::{bktree, ngram::NGramCandidate};
use crate::normalize::{self, Normalizer};
use crate::scoring;
use crate::search::merge::ResultMerger;
use crate::search::Snapshot;
use crate::types::{
    Language, MatchMeta, SearchMethod, SearchOutcome, SearchResult, SearchWarning,
};
use crate::vector::EmbeddingMode;
use ahash::AHashSet;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Which methods to run for a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MethodSelection {
    /// Let the planner pick from the query shape.
    #[default]
    Auto,
    /// Run exactly these methods.
    Only(Vec<SearchMethod>),
}

/// Per-query knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub max_results: usize,
    pub min_score: f32,
    pub methods: MethodSelection,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            max_results: scoring::DEFAULT_MAX_RESULTS,
            min_score: scoring::DEFAULT_MIN_SCORE,
            methods: MethodSelection::Auto,
        }
    }
}

impl SearchOptions {
    /// Reject thresholds outside [0, 1]; query shape is never an error but
    /// a nonsense threshold is.
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(0.0..=1.0).contains(&self.min_score) || self.min_score.is_nan() {
            return Err(crate::error::Error::Query(format!(
                "min_score must be within [0, 1], got {}",
                self.min_score
            )));
        }
        Ok(())
    }
}

/// Planner tuning; deadlines are configuration inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    pub method_deadline: Duration,
    pub query_deadline: Duration,
    pub fuzzy_candidates: usize,
    pub bk_candidates: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            method_deadline: scoring::DEFAULT_METHOD_DEADLINE,
            query_deadline: scoring::DEFAULT_QUERY_DEADLINE,
            fuzzy_candidates: scoring::FUZZY_CANDIDATE_LIMIT,
            bk_candidates: scoring::BK_CANDIDATE_LIMIT,
        }
    }
}

/// Shape-driven method selection.
pub fn select_methods(normalized: &str) -> Vec<SearchMethod> {
    if normalized.contains(' ') {
        return vec![
            SearchMethod::Exact,
            SearchMethod::Semantic,
            SearchMethod::Fuzzy,
        ];
    }
    match normalized.chars().count() {
        0..=3 => vec![SearchMethod::Prefix, SearchMethod::Exact],
        4..=8 => vec![SearchMethod::Exact, SearchMethod::Fuzzy],
        _ => vec![
            SearchMethod::Exact,
            SearchMethod::Fuzzy,
            SearchMethod::Semantic,
        ],
    }
}

/// Timing record for one method run; the engine folds these into stats.
#[derive(Debug, Clone, Copy)]
pub struct MethodRun {
    pub method: SearchMethod,
    pub elapsed: Duration,
    pub results: usize,
    pub timed_out: bool,
}

pub(crate) struct PlannedQuery {
    pub outcome: SearchOutcome,
    pub runs: Vec<MethodRun>,
}

/// Run one query against a snapshot.
pub(crate) fn run(
    snapshot: &Snapshot,
    normalizer: &Normalizer,
    config: &PlannerConfig,
    query: &str,
    options: &SearchOptions,
) -> PlannedQuery {
    let normalized = normalizer.normalize(query, Language::En);
    if normalized.is_empty() || options.max_results == 0 {
        return PlannedQuery {
            outcome: SearchOutcome::default(),
            runs: Vec::new(),
        };
    }
    let folded = normalize::fold(&normalized);

    let methods: Vec<SearchMethod> = match &options.methods {
        MethodSelection::Auto => select_methods(&normalized),
        MethodSelection::Only(list) => {
            let mut seen = AHashSet::new();
            list.iter()
                .copied()
                .filter(|m| seen.insert(*m))
                .collect()
        }
    };
    if methods.is_empty() {
        return PlannedQuery {
            outcome: SearchOutcome::default(),
            runs: Vec::new(),
        };
    }

    let started = Instant::now();
    let method_deadline = started + config.method_deadline.min(config.query_deadline);
    let collected: Mutex<Vec<(MethodRun, Vec<SearchResult>)>> = Mutex::new(Vec::new());

    std::thread::scope(|scope| {
        for &method in &methods {
            let normalized = &normalized;
            let folded = &folded;
            let collected = &collected;
            scope.spawn(move || {
                let begun = Instant::now();
                let (results, timed_out) = match method {
                    SearchMethod::Exact => (exact(snapshot, normalized), false),
                    SearchMethod::Prefix => {
                        (prefix(snapshot, normalized, options.max_results), false)
                    }
                    SearchMethod::Fuzzy => {
                        fuzzy_method(snapshot, folded, config, method_deadline)
                    }
                    SearchMethod::Semantic => {
                        let results =
                            semantic(snapshot, normalized, options.max_results);
                        (results, Instant::now() > method_deadline)
                    }
                };
                let run = MethodRun {
                    method,
                    elapsed: begun.elapsed(),
                    results: results.len(),
                    timed_out,
                };
                collected.lock().push((run, results));
            });
        }
    });

    let mut runs = Vec::with_capacity(methods.len());
    let mut warnings = Vec::new();
    let mut merger = ResultMerger::new(&snapshot.corpus);

    let mut collected = collected.into_inner();
    // Method order, not completion order, decides nothing about ranking -
    // but keep the metadata deterministic anyway.
    collected.sort_by_key(|(run, _)| run.method);

    for (run, results) in collected {
        if run.timed_out {
            tracing::warn!(method = %run.method, elapsed = ?run.elapsed, "method deadline exceeded");
            warnings.push(SearchWarning {
                method: run.method,
                message: format!(
                    "deadline exceeded after {:?}; partial results used",
                    run.elapsed
                ),
            });
        }
        runs.push(run);
        merger.merge_all(results);
    }

    PlannedQuery {
        outcome: SearchOutcome {
            results: merger.into_ranked(options.min_score, options.max_results),
            warnings,
        },
        runs,
    }
}

fn result_for(snapshot: &Snapshot, index: u32, method: SearchMethod, score: f32) -> SearchResult {
    let entry = snapshot.corpus.entry(index);
    SearchResult {
        index,
        text: entry.text.clone(),
        score,
        method,
        is_phrase: entry.is_phrase,
        meta: MatchMeta::default(),
    }
}

fn exact(snapshot: &Snapshot, normalized: &str) -> Vec<SearchResult> {
    snapshot
        .trie
        .exact(normalized)
        .map(|index| result_for(snapshot, index, SearchMethod::Exact, scoring::EXACT_SCORE))
        .into_iter()
        .collect()
}

fn prefix(snapshot: &Snapshot, normalized: &str, max_results: usize) -> Vec<SearchResult> {
    let query_chars = normalized.chars().count();
    snapshot
        .trie
        .prefix(normalized, max_results)
        .into_iter()
        .map(|index| {
            let candidate_chars = snapshot.corpus.entry(index).normalized.chars().count();
            result_for(
                snapshot,
                index,
                SearchMethod::Prefix,
                scoring::prefix_score(query_chars, candidate_chars),
            )
        })
        .collect()
}

/// Candidate generation (n-gram union BK-tree) followed by deadline-aware
/// scoring. Partial candidate sets are fine: per-candidate scoring is
/// independent, and the threshold filter runs at the end regardless.
fn fuzzy_method(
    snapshot: &Snapshot,
    folded: &str,
    config: &PlannerConfig,
    deadline: Instant,
) -> (Vec<SearchResult>, bool) {
    let mut candidates: Vec<u32> = snapshot
        .ngram
        .candidates(folded, config.fuzzy_candidates)
        .into_iter()
        .map(|NGramCandidate { index, .. }| index)
        .collect();

    let max_distance = bktree::suggested_max_distance(folded.chars().count());
    candidates.extend(
        snapshot
            .bktree
            .search(folded, max_distance, config.bk_candidates)
            .into_iter()
            .map(|m| m.index),
    );

    let mut seen = AHashSet::with_capacity(candidates.len());
    candidates.retain(|index| seen.insert(*index));

    let mut results = Vec::new();
    let mut timed_out = false;

    for chunk in candidates.chunks(64) {
        if Instant::now() > deadline {
            timed_out = true;
            break;
        }
        for &index in chunk {
            let entry = snapshot.corpus.entry(index);
            let scored = fuzzy::score_candidate(folded, &entry.folded);
            if scored.score <= 0.0 {
                continue;
            }
            let mut result = result_for(snapshot, index, SearchMethod::Fuzzy, scored.score);
            result.meta.algorithm = Some(scored.algorithm);
            result.meta.edit_distance = Some(scored.edit_distance);
            results.push(result);
        }
    }

    (results, timed_out)
}

fn semantic(snapshot: &Snapshot, normalized: &str, max_results: usize) -> Vec<SearchResult> {
    snapshot
        .vectors
        .search(normalized, EmbeddingMode::Fusion, max_results * 2)
        .into_iter()
        .filter_map(|(index, cosine)| {
            let score = scoring::semantic_score(cosine);
            (score > 0.0)
                .then(|| result_for(snapshot, index, SearchMethod::Semantic, score))
        })
        .collect()
}
