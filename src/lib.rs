// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Multilingual lexical search over an in-memory vocabulary.
//!
//! Glossa resolves a query against hundreds of thousands of words, phrases,
//! and idioms, and returns the best matches ranked by a relevance score in
//! [0, 1]. Four complementary index structures back one query planner:
//!
//! ```text
//! ┌──────────────┐   ┌────────────┐   ┌───────────────────────────────┐
//! │ LexiconIngest│──▶│   Corpus   │──▶│ TrieIndex  BkTreeIndex        │
//! │ (fetch+parse)│   │  (sealed)  │   │ NGramIndex VectorIndex        │
//! └──────────────┘   └────────────┘   └───────────────┬───────────────┘
//!                                                     │
//!                      ┌────────────┐   ┌─────────────▼───────────────┐
//!                      │ CorpusStore│◀──│        QueryPlanner         │
//!                      │  (disk)    │   │ select · dispatch · merge   │
//!                      └────────────┘   └─────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use glossa::{SearchEngine, SearchOptions, ingest};
//!
//! # fn main() -> glossa::Result<()> {
//! let engine = SearchEngine::build(
//!     &ingest::default_catalog(),
//!     &glossa::BuildOptions::default(),
//! )?;
//!
//! let results = engine.search("enui", &SearchOptions::default())?;
//! assert_eq!(results[0].text, "ennui");
//! # Ok(())
//! # }
//! ```
//!
//! # Design in one paragraph
//!
//! Everything is built once and then read-only: the corpus seals with a
//! SHA-256 content hash, the indices are immutable, and queries share the
//! whole generation through an `Arc`. Rebuilds assemble a new generation
//! and swap a pointer. Query methods run concurrently with per-method
//! deadlines; a slow method contributes partial results and a warning, and
//! the final ranking depends only on the documented ordering rule, never
//! on completion order.

pub mod corpus;
pub mod error;
pub mod fuzzy;
pub mod index;
pub mod ingest;
pub mod normalize;
pub mod scoring;
pub mod search;
pub mod store;
pub mod types;
pub mod vector;

// The public surface upstream collaborators actually use.
pub use corpus::{Corpus, CorpusBuilder};
pub use error::{Error, Result};
pub use ingest::{default_catalog, FetchOptions, IngestOptions, SourceDescriptor, SourceFormat};
pub use normalize::{Normalizer, NormalizerOptions};
pub use search::{
    BuildOptions, MethodSelection, PlannerConfig, SearchEngine, SearchOptions,
};
pub use store::Manifest;
pub use types::{
    Entry, FuzzyAlgorithm, Language, MatchMeta, SearchMethod, SearchOutcome, SearchResult,
    SearchStats, SearchWarning,
};
pub use vector::EmbeddingMode;
