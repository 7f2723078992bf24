// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The symbolic index structures: one corpus, three complementary views.
//!
//! - [`trie::TrieIndex`] answers exact and ranked-prefix queries.
//! - [`bktree::BkTreeIndex`] answers bounded edit-distance queries.
//! - [`ngram::NGramIndex`] generates fuzzy candidates cheaply.
//!
//! All three are built once from a sealed corpus, are immutable afterward,
//! and are safe for concurrent reads without locks. The query planner
//! composes them explicitly; there is no common index trait because the
//! three answer genuinely different questions.

pub mod bktree;
pub mod ngram;
pub mod trie;

pub use bktree::{suggested_max_distance, BkMatch, BkTreeIndex};
pub use ngram::{NGramCandidate, NGramIndex};
pub use trie::TrieIndex;
