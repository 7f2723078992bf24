// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The engine: a sealed snapshot behind a generation swap.
//!
//! A [`Snapshot`] owns the corpus and every index built from it. It is
//! immutable once assembled and shared via `Arc`, so queries read it
//! without locks. Rebuilds construct a whole new snapshot off to the side
//! and swap the `Arc` under a short write lock - in-flight queries keep
//! their old generation until they finish, new queries see the new one.
//! Nobody ever observes a half-built index.

pub mod merge;
pub mod planner;

pub use planner::{MethodSelection, MethodRun, PlannerConfig, SearchOptions};

use crate::corpus::{Corpus, CorpusBuilder};
use crate::error::{Error, Result};
use crate::index::{BkTreeIndex, NGramIndex, TrieIndex};
use crate::ingest::{self, IngestOptions, SourceDescriptor};
use crate::normalize::Normalizer;
use crate::types::{SearchOutcome, SearchResult, SearchStats};
use crate::vector::VectorIndex;
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::Arc;

/// One sealed generation: the corpus plus all four indices.
#[derive(Debug)]
pub struct Snapshot {
    pub(crate) corpus: Arc<Corpus>,
    pub(crate) trie: TrieIndex,
    pub(crate) bktree: BkTreeIndex,
    pub(crate) ngram: NGramIndex,
    pub(crate) vectors: VectorIndex,
}

impl Snapshot {
    /// Build every index from a sealed corpus. Single-threaded assembly per
    /// index, rayon inside where the index supports it.
    pub(crate) fn build(corpus: Corpus) -> Self {
        let trie = TrieIndex::build(
            corpus
                .iter()
                .map(|(i, e)| (e.normalized.as_str(), i, e.frequency)),
        );
        let bktree = BkTreeIndex::build(&corpus);
        let ngram = NGramIndex::build(&corpus);
        let vectors = VectorIndex::build(&corpus);
        tracing::debug!(
            entries = corpus.len(),
            trie_keys = trie.len(),
            ngrams = ngram.distinct_grams(),
            "snapshot assembled"
        );
        Snapshot {
            corpus: Arc::new(corpus),
            trie,
            bktree,
            ngram,
            vectors,
        }
    }

    /// Reassemble from loaded parts, cross-checking that they belong to the
    /// same corpus. Catches mixed-generation directories that survived the
    /// per-file integrity checks.
    pub(crate) fn from_parts(
        corpus: Corpus,
        trie: TrieIndex,
        bktree: BkTreeIndex,
        ngram: NGramIndex,
        vectors: VectorIndex,
    ) -> Result<Self> {
        let entries = corpus.len();
        if bktree.len() != entries {
            return Err(Error::Index(format!(
                "bktree holds {} entries, corpus {}",
                bktree.len(),
                entries
            )));
        }
        if ngram.len() != entries {
            return Err(Error::Index(format!(
                "ngram index holds {} entries, corpus {}",
                ngram.len(),
                entries
            )));
        }
        if trie.len() == 0 || trie.len() > entries {
            return Err(Error::Index(format!(
                "trie holds {} keys for a corpus of {}",
                trie.len(),
                entries
            )));
        }
        vectors.validate(entries)?;
        Ok(Snapshot {
            corpus: Arc::new(corpus),
            trie,
            bktree,
            ngram,
            vectors,
        })
    }
}

/// Build-time options: ingestion plus planner tuning for the resulting
/// engine.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub ingest: IngestOptions,
    pub planner: PlannerConfig,
}

/// The unified search engine handle.
#[derive(Debug)]
pub struct SearchEngine {
    snapshot: RwLock<Arc<Snapshot>>,
    normalizer: Normalizer,
    planner: PlannerConfig,
    stats: Mutex<SearchStats>,
    sources: Mutex<Vec<SourceDescriptor>>,
}

impl SearchEngine {
    /// Ingest the sources, seal generation 1, build all indices.
    pub fn build(sources: &[SourceDescriptor], options: &BuildOptions) -> Result<Self> {
        let builder = ingest::ingest(sources, &options.ingest)?;
        let corpus = builder.build(1)?;
        Ok(Self::assemble(
            Snapshot::build(corpus),
            Normalizer::new(options.ingest.normalizer),
            options.planner.clone(),
            sources.to_vec(),
        ))
    }

    /// Wrap an already-sealed corpus (tests, embedded word lists).
    pub fn from_corpus(corpus: Corpus) -> Self {
        Self::assemble(
            Snapshot::build(corpus),
            Normalizer::default(),
            PlannerConfig::default(),
            Vec::new(),
        )
    }

    /// Stage raw `(text, language, frequency, is_idiom)` items directly.
    pub fn from_entries<'a, I>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, crate::types::Language, f32)>,
    {
        let mut builder = CorpusBuilder::default();
        for (text, language, frequency) in items {
            builder.add(text, language, Some(frequency), false);
        }
        Ok(Self::from_corpus(builder.build(1)?))
    }

    fn assemble(
        snapshot: Snapshot,
        normalizer: Normalizer,
        planner: PlannerConfig,
        sources: Vec<SourceDescriptor>,
    ) -> Self {
        SearchEngine {
            snapshot: RwLock::new(Arc::new(snapshot)),
            normalizer,
            planner,
            stats: Mutex::new(SearchStats::default()),
            sources: Mutex::new(sources),
        }
    }

    /// Load a persisted engine from a store directory.
    pub fn load(dir: &Path) -> Result<Self> {
        let (snapshot, manifest) = crate::store::load(dir)?;
        Ok(Self::assemble(
            snapshot,
            Normalizer::default(),
            PlannerConfig::default(),
            manifest.sources,
        ))
    }

    /// Persist the current generation to a store directory.
    pub fn save(&self, dir: &Path) -> Result<()> {
        let snapshot = self.snapshot.read().clone();
        let sources = self.sources.lock().clone();
        crate::store::save(&snapshot, &sources, dir)
    }

    /// The unified query entrypoint; results only.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        self.search_detailed(query, options).map(|o| o.results)
    }

    /// Query with warnings attached (deadline overruns and the like).
    pub fn search_detailed(&self, query: &str, options: &SearchOptions) -> Result<SearchOutcome> {
        options.validate()?;
        let snapshot = self.snapshot.read().clone();
        let planned = planner::run(&snapshot, &self.normalizer, &self.planner, query, options);

        let mut stats = self.stats.lock();
        stats.searches += 1;
        for run in &planned.runs {
            let m = &mut stats.methods[run.method as usize];
            m.invocations += 1;
            m.results += run.results as u64;
            m.timeouts += u64::from(run.timed_out);
            m.total_time += run.elapsed;
        }
        drop(stats);

        Ok(planned.outcome)
    }

    /// Prefix/autocomplete surface: ranked completions of `prefix`.
    pub fn prefix(&self, prefix: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let options = SearchOptions {
            max_results,
            min_score: 0.0,
            methods: MethodSelection::Only(vec![crate::types::SearchMethod::Prefix]),
        };
        self.search(prefix, &options)
    }

    /// Counters plus the current generation's shape.
    pub fn stats(&self) -> SearchStats {
        let snapshot = self.snapshot.read();
        let mut stats = self.stats.lock().clone();
        stats.corpus_len = snapshot.corpus.len();
        stats.generation = snapshot.corpus.generation();
        stats
    }

    /// Shared handle to the sealed corpus.
    pub fn corpus(&self) -> Arc<Corpus> {
        self.snapshot.read().corpus.clone()
    }

    pub fn generation(&self) -> u64 {
        self.snapshot.read().corpus.generation()
    }

    /// Re-ingest and swap in a new generation. In-flight queries finish on
    /// the old snapshot; the swap itself is a pointer write.
    pub fn rebuild(&self, sources: &[SourceDescriptor], options: &IngestOptions) -> Result<()> {
        let builder = ingest::ingest(sources, options)?;
        let next_generation = self.generation() + 1;
        let corpus = builder.build(next_generation)?;
        let snapshot = Snapshot::build(corpus);

        *self.snapshot.write() = Arc::new(snapshot);
        *self.sources.lock() = sources.to_vec();
        tracing::info!(generation = next_generation, "rebuild swapped in");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Language;

    fn engine() -> SearchEngine {
        SearchEngine::from_entries([
            ("hello", Language::En, 5.0),
            ("help", Language::En, 10.0),
            ("helpful", Language::En, 2.0),
            ("world", Language::En, 7.0),
        ])
        .unwrap()
    }

    #[test]
    fn exact_query_scores_one() {
        let engine = engine();
        let results = engine.search("hello", &SearchOptions::default()).unwrap();
        assert_eq!(results[0].text, "hello");
        assert_eq!(results[0].score, 1.0);
    }

    #[test]
    fn prefix_surface_ranks_by_frequency_hints() {
        let engine = engine();
        let results = engine.prefix("hel", 10).unwrap();
        let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts[0], "help");
        assert!(texts.contains(&"hello"));
        assert!(texts.contains(&"helpful"));
    }

    #[test]
    fn stats_track_invocations() {
        let engine = engine();
        engine.search("hello", &SearchOptions::default()).unwrap();
        engine.search("help", &SearchOptions::default()).unwrap();
        let stats = engine.stats();
        assert_eq!(stats.searches, 2);
        assert_eq!(stats.corpus_len, 4);
        assert!(stats.method(crate::types::SearchMethod::Exact).invocations >= 2);
    }

    #[test]
    fn empty_query_is_empty_not_error() {
        let engine = engine();
        let outcome = engine
            .search_detailed("", &SearchOptions::default())
            .unwrap();
        assert!(outcome.results.is_empty());
        assert!(outcome.warnings.is_empty());
    }
}
