// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The sealed corpus: every index answers in terms of its dense indices.
//!
//! Construction is a single pass: candidate entries are merged by
//! `(normalized, language)`, sorted, and frozen. After [`CorpusBuilder::build`]
//! returns, nothing mutates - the corpus is shared behind an `Arc` and read
//! concurrently without locks. Rebuilds produce a whole new generation.
//!
//! The content hash is SHA-256 over the sorted `(normalized, language)`
//! pairs. Two builds from the same sources in the same order hash
//! identically, which is what makes the on-disk cache keys stable.

use crate::error::{Error, Result};
use crate::normalize::{self, Normalizer};
use crate::types::{Entry, Language};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Immutable, content-hashed container of entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Corpus {
    entries: Vec<Entry>,
    /// `(normalized, language)` -> index. The pair is unique by construction.
    by_key: AHashMap<(String, Language), u32>,
    /// `normalized` -> smallest index across languages, for language-less
    /// lookups from the query path.
    by_normalized: AHashMap<String, u32>,
    /// Hex SHA-256 over the sorted `(normalized, language)` pairs.
    content_hash: String,
    /// Monotonic rebuild counter, supplied by the engine.
    generation: u64,
    /// Largest frequency in the corpus; 0 for an all-unknown-frequency build.
    max_frequency: f32,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry by dense index. Panics on out-of-range in debug the way slice
    /// indexing does; the indices stored in the search structures are valid
    /// by construction.
    pub fn entry(&self, index: u32) -> &Entry {
        &self.entries[index as usize]
    }

    pub fn get(&self, index: u32) -> Option<&Entry> {
        self.entries.get(index as usize)
    }

    pub fn index_of(&self, normalized: &str) -> Option<u32> {
        self.by_normalized.get(normalized).copied()
    }

    pub fn index_of_in(&self, normalized: &str, language: Language) -> Option<u32> {
        self.by_key
            .get(&(normalized.to_string(), language))
            .copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Entry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i as u32, e))
    }

    pub fn iter_words(&self) -> impl Iterator<Item = (u32, &Entry)> {
        self.iter().filter(|(_, e)| !e.is_phrase)
    }

    pub fn iter_phrases(&self) -> impl Iterator<Item = (u32, &Entry)> {
        self.iter().filter(|(_, e)| e.is_phrase)
    }

    /// Logical per-language filter; indices stay global.
    pub fn subview(&self, language: Language) -> impl Iterator<Item = u32> + '_ {
        self.iter()
            .filter(move |(_, e)| e.language == language)
            .map(|(i, _)| i)
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn max_frequency(&self) -> f32 {
        self.max_frequency
    }
}

/// Is this normalized form worth indexing? Mirrors the ingest filter: at
/// least two characters, nothing outside letters / digits / space / hyphen /
/// apostrophe.
pub fn is_indexable(normalized: &str) -> bool {
    normalized.chars().count() >= 2
        && normalized
            .chars()
            .all(|c| c.is_alphanumeric() || c == ' ' || c == '-' || c == '\'')
}

/// Single-writer accumulation stage. Duplicate `(normalized, language)` keys
/// merge: higher frequency keeps its surface text, idiom flags OR together.
#[derive(Debug, Default)]
pub struct CorpusBuilder {
    normalizer: Normalizer,
    merged: AHashMap<(String, Language), Entry>,
}

impl CorpusBuilder {
    pub fn new(normalizer: Normalizer) -> Self {
        CorpusBuilder {
            normalizer,
            merged: AHashMap::new(),
        }
    }

    /// Normalize and stage one raw item. Returns false when the item is
    /// dropped by the indexability filter.
    pub fn add(
        &mut self,
        text: &str,
        language: Language,
        frequency: Option<f32>,
        is_idiom: bool,
    ) -> bool {
        let normalized = self.normalizer.normalize(text, language);
        if !is_indexable(&normalized) {
            return false;
        }
        let folded = normalize::fold(&normalized);
        let entry = Entry {
            text: text.trim().to_string(),
            is_phrase: normalize::is_phrase(&normalized),
            is_idiom,
            language,
            frequency: frequency.unwrap_or(0.0).max(0.0),
            normalized,
            folded,
        };
        self.stage(entry);
        true
    }

    /// Stage a pre-built entry (tests and corpus surgery). The entry must
    /// already satisfy the normalizer invariant.
    pub fn stage(&mut self, entry: Entry) {
        let key = (entry.normalized.clone(), entry.language);
        match self.merged.get_mut(&key) {
            Some(existing) => {
                if entry.frequency > existing.frequency {
                    let was_idiom = existing.is_idiom;
                    *existing = entry;
                    existing.is_idiom |= was_idiom;
                } else {
                    existing.is_idiom |= entry.is_idiom;
                }
            }
            None => {
                self.merged.insert(key, entry);
            }
        }
    }

    pub fn staged(&self) -> usize {
        self.merged.len()
    }

    /// Seal the corpus: deterministic sort, dense indices, content hash.
    pub fn build(self, generation: u64) -> Result<Corpus> {
        if self.merged.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        let mut entries: Vec<Entry> = self.merged.into_values().collect();
        entries.sort_by(|a, b| {
            (a.language, a.normalized.as_str()).cmp(&(b.language, b.normalized.as_str()))
        });

        let mut hasher = Sha256::new();
        let mut by_key = AHashMap::with_capacity(entries.len());
        let mut by_normalized: AHashMap<String, u32> = AHashMap::with_capacity(entries.len());
        let mut max_frequency = 0.0f32;

        for (i, entry) in entries.iter().enumerate() {
            hasher.update(entry.normalized.as_bytes());
            hasher.update([0x1f]);
            hasher.update(entry.language.as_str().as_bytes());
            hasher.update([0x1e]);

            by_key.insert((entry.normalized.clone(), entry.language), i as u32);
            by_normalized
                .entry(entry.normalized.clone())
                .or_insert(i as u32);
            max_frequency = max_frequency.max(entry.frequency);
        }

        let content_hash = hex(&hasher.finalize());
        tracing::info!(
            entries = entries.len(),
            generation,
            hash = %content_hash,
            "corpus sealed"
        );

        Ok(Corpus {
            entries,
            by_key,
            by_normalized,
            content_hash,
            generation,
            max_frequency,
        })
    }
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(words: &[(&str, Language, f32)]) -> Corpus {
        let mut builder = CorpusBuilder::default();
        for (text, lang, freq) in words {
            builder.add(text, *lang, Some(*freq), false);
        }
        builder.build(1).unwrap()
    }

    #[test]
    fn dense_indices_sorted_by_language_then_form() {
        let corpus = build(&[
            ("zebra", Language::En, 1.0),
            ("café", Language::Fr, 1.0),
            ("apple", Language::En, 1.0),
        ]);
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.entry(0).normalized, "apple");
        assert_eq!(corpus.entry(1).normalized, "zebra");
        assert_eq!(corpus.entry(2).normalized, "café");
    }

    #[test]
    fn duplicate_merge_keeps_higher_frequency_and_ors_idiom() {
        let mut builder = CorpusBuilder::default();
        builder.add("hello", Language::En, Some(1.0), true);
        builder.add("Hello", Language::En, Some(5.0), false);
        let corpus = builder.build(1).unwrap();
        assert_eq!(corpus.len(), 1);
        let e = corpus.entry(0);
        assert_eq!(e.frequency, 5.0);
        assert!(e.is_idiom);
        assert_eq!(e.text, "Hello");
    }

    #[test]
    fn same_form_different_language_is_distinct() {
        let corpus = build(&[("pain", Language::En, 1.0), ("pain", Language::Fr, 2.0)]);
        assert_eq!(corpus.len(), 2);
        assert!(corpus.index_of_in("pain", Language::En).is_some());
        assert!(corpus.index_of_in("pain", Language::Fr).is_some());
        // Language-less lookup resolves to the smallest index.
        assert_eq!(corpus.index_of("pain"), Some(0));
    }

    #[test]
    fn content_hash_is_order_independent() {
        let a = build(&[("alpha", Language::En, 1.0), ("beta", Language::En, 1.0)]);
        let b = build(&[("beta", Language::En, 1.0), ("alpha", Language::En, 1.0)]);
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn content_hash_changes_with_content() {
        let a = build(&[("alpha", Language::En, 1.0)]);
        let b = build(&[("alpha", Language::Fr, 1.0)]);
        assert_ne!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn short_and_empty_forms_rejected() {
        let mut builder = CorpusBuilder::default();
        assert!(!builder.add("", Language::En, None, false));
        assert!(!builder.add("a", Language::En, None, false));
        assert!(!builder.add("?!", Language::En, None, false));
        assert!(builder.build(1).is_err());
    }

    #[test]
    fn normalizer_invariant_holds() {
        let corpus = build(&[("Don't Panic", Language::En, 1.0)]);
        let entry = corpus.entry(0);
        assert_eq!(
            Normalizer::default().normalize(&entry.text, entry.language),
            entry.normalized
        );
        assert!(entry.is_phrase);
    }
}
