// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Deterministic entry embedders: character, subword, and TF-IDF n-gram.
//!
//! None of these are learned. Character and subword vectors come from a
//! seeded splitmix64 mix, so the same seed always produces the same basis -
//! rebuilds are reproducible and the saved index never drifts from the
//! query-time embedder. What the modes capture:
//!
//! - **Character**: raw morphology. "running" and "runnign" nearly collide.
//! - **Subword**: shared 2-5 grams, weighted toward frequent corpus grams.
//! - **TF-IDF**: discriminative grams; common grams get down-weighted.
//!
//! Query embedding MUST go through the same embedder instance that built
//! the matrix; the store serializes embedders next to their vectors for
//! exactly that reason.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// splitmix64: the standard 64-bit finalizer. Good avalanche, trivially
/// reproducible across platforms.
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Component k of the pseudo-random unit-range vector for `token`.
fn component(seed: u64, token: u64, k: usize) -> f32 {
    let h = splitmix64(seed ^ splitmix64(token.wrapping_add(k as u64)));
    // Map the top 24 bits onto [-1, 1).
    ((h >> 40) as f32 / 8_388_608.0) - 1.0
}

fn hash_str(s: &str) -> u64 {
    // FNV-1a, fixed basis: stable across runs and platforms.
    let mut h = 0xcbf2_9ce4_8422_2325u64;
    for b in s.as_bytes() {
        h ^= u64::from(*b);
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    h
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Character-level mean-pool embedder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterEmbedder {
    pub dim: usize,
    pub max_len: usize,
    pub seed: u64,
}

impl Default for CharacterEmbedder {
    fn default() -> Self {
        CharacterEmbedder {
            dim: 64,
            max_len: 20,
            seed: 0x6c65_7869_636f_6e00, // arbitrary fixed seed
        }
    }
}

impl CharacterEmbedder {
    /// Mean-pool over the first `max_len` characters, L2-normalized.
    /// Empty input embeds to the zero vector.
    pub fn encode(&self, text: &str) -> Vec<f32> {
        let mut pooled = vec![0.0f32; self.dim];
        let mut count = 0usize;
        for c in text.chars().take(self.max_len) {
            for k in 0..self.dim {
                pooled[k] += component(self.seed, u64::from(u32::from(c)), k);
            }
            count += 1;
        }
        if count > 0 {
            for x in &mut pooled {
                *x /= count as f32;
            }
        }
        l2_normalize(&mut pooled);
        pooled
    }
}

/// Subword n-gram embedder with a corpus-derived vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubwordEmbedder {
    pub dim: usize,
    pub min_n: usize,
    pub max_n: usize,
    pub min_count: u32,
    pub seed: u64,
    /// Grams that survived the frequency threshold; unknown grams are
    /// silently ignored at encode time.
    vocab: ahash::AHashSet<String>,
}

impl SubwordEmbedder {
    /// Build the gram vocabulary from the corpus forms.
    pub fn fit<'a, I>(forms: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut embedder = SubwordEmbedder {
            dim: 128,
            min_n: 2,
            max_n: 5,
            min_count: 2,
            seed: 0x7375_6277_6f72_6400,
            vocab: ahash::AHashSet::new(),
        };

        let mut counts: AHashMap<String, u32> = AHashMap::new();
        for form in forms {
            for gram in boundary_grams(form, embedder.min_n, embedder.max_n) {
                *counts.entry(gram).or_insert(0) += 1;
            }
        }
        embedder.vocab = counts
            .into_iter()
            .filter(|(_, count)| *count >= embedder.min_count)
            .map(|(gram, _)| gram)
            .collect();
        embedder
    }

    pub fn vocab_len(&self) -> usize {
        self.vocab.len()
    }

    /// Mean-pool over known grams of `^text$`, L2-normalized. All-unknown
    /// input embeds to the zero vector.
    pub fn encode(&self, text: &str) -> Vec<f32> {
        let mut pooled = vec![0.0f32; self.dim];
        let mut count = 0usize;
        for gram in boundary_grams(text, self.min_n, self.max_n) {
            if self.vocab.contains(&gram) {
                let token = hash_str(&gram);
                for k in 0..self.dim {
                    pooled[k] += component(self.seed, token, k);
                }
                count += 1;
            }
        }
        if count > 0 {
            for x in &mut pooled {
                *x /= count as f32;
            }
        }
        l2_normalize(&mut pooled);
        pooled
    }
}

/// Character n-grams of `^text$` for all n in [min_n, max_n], with
/// multiplicity.
fn boundary_grams(text: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let wrapped: Vec<char> = std::iter::once('^')
        .chain(text.chars())
        .chain(std::iter::once('$'))
        .collect();
    let mut grams = Vec::new();
    for n in min_n..=max_n {
        if wrapped.len() >= n {
            for window in wrapped.windows(n) {
                grams.push(window.iter().collect());
            }
        }
    }
    grams
}

/// Plain character n-grams (no boundary markers), with multiplicity.
fn plain_grams(text: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut grams = Vec::new();
    for n in min_n..=max_n {
        if chars.len() >= n {
            for window in chars.windows(n) {
                grams.push(window.iter().collect());
            }
        }
    }
    grams
}

/// Sparse TF-IDF vector, sorted by feature id.
pub type SparseVector = Vec<(u32, f32)>;

/// TF-IDF over character n-grams, vocabulary capped by document frequency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfEmbedder {
    pub min_n: usize,
    pub max_n: usize,
    pub max_features: usize,
    /// gram -> feature id.
    vocab: AHashMap<String, u32>,
    /// Smoothed IDF per feature id.
    idf: Vec<f32>,
}

impl TfidfEmbedder {
    /// Fit vocabulary and IDF from the corpus forms. Features are the
    /// `max_features` most document-frequent grams; ties break
    /// alphabetically so fits are deterministic.
    pub fn fit<'a, I>(forms: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let (min_n, max_n, max_features) = (2, 4, 10_000);

        let mut df: AHashMap<String, u32> = AHashMap::new();
        let mut n_docs = 0usize;
        for form in forms {
            n_docs += 1;
            let mut seen = ahash::AHashSet::new();
            for gram in plain_grams(form, min_n, max_n) {
                if seen.insert(gram.clone()) {
                    *df.entry(gram).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(String, u32)> = df.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(max_features);

        let mut vocab = AHashMap::with_capacity(ranked.len());
        let mut idf = Vec::with_capacity(ranked.len());
        for (id, (gram, doc_freq)) in ranked.into_iter().enumerate() {
            vocab.insert(gram, id as u32);
            idf.push(((n_docs as f32 + 1.0) / (doc_freq as f32 + 1.0)).ln() + 1.0);
        }

        TfidfEmbedder {
            min_n,
            max_n,
            max_features,
            vocab,
            idf,
        }
    }

    pub fn vocab_len(&self) -> usize {
        self.vocab.len()
    }

    /// Sparse `tf * idf`, L2-normalized. Unknown grams drop out.
    pub fn encode(&self, text: &str) -> SparseVector {
        let mut tf: AHashMap<u32, f32> = AHashMap::new();
        for gram in plain_grams(text, self.min_n, self.max_n) {
            if let Some(&id) = self.vocab.get(&gram) {
                *tf.entry(id).or_insert(0.0) += 1.0;
            }
        }

        let mut vector: SparseVector = tf
            .into_iter()
            .map(|(id, count)| (id, count * self.idf[id as usize]))
            .collect();
        vector.sort_by_key(|(id, _)| *id);

        let norm = vector.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut vector {
                *w /= norm;
            }
        }
        vector
    }
}

/// Dot product of two sorted sparse vectors.
pub fn sparse_dot(a: &SparseVector, b: &SparseVector) -> f32 {
    let (mut i, mut j) = (0usize, 0usize);
    let mut dot = 0.0f32;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_encoding_is_deterministic_and_unit() {
        let embedder = CharacterEmbedder::default();
        let a = embedder.encode("hello");
        let b = embedder.encode("hello");
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn character_similar_strings_closer_than_dissimilar() {
        let embedder = CharacterEmbedder::default();
        let hello = embedder.encode("hello");
        let helo = embedder.encode("helo");
        let zyx = embedder.encode("zyxwv");
        let close: f32 = hello.iter().zip(&helo).map(|(a, b)| a * b).sum();
        let far: f32 = hello.iter().zip(&zyx).map(|(a, b)| a * b).sum();
        assert!(close > far);
    }

    #[test]
    fn empty_input_embeds_to_zero() {
        let embedder = CharacterEmbedder::default();
        assert!(embedder.encode("").iter().all(|&x| x == 0.0));
    }

    #[test]
    fn subword_vocabulary_thresholds_rare_grams() {
        let forms = ["hello", "help", "helmet", "zzz"];
        let embedder = SubwordEmbedder::fit(forms);
        // "^he" appears 3 times, survives; grams unique to "zzz" do not.
        assert!(embedder.vocab_len() > 0);
        let known = embedder.encode("help");
        let unknown = embedder.encode("qqqq");
        assert!(known.iter().any(|&x| x != 0.0));
        assert!(unknown.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn tfidf_sparse_encoding_is_unit_norm() {
        let forms = ["hello", "help", "world", "helper"];
        let embedder = TfidfEmbedder::fit(forms);
        let v = embedder.encode("hello");
        assert!(!v.is_empty());
        let norm: f32 = v.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        // Sorted by feature id for the merge-style dot product.
        assert!(v.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn sparse_dot_self_is_one_for_unit_vectors() {
        let forms = ["hello", "help", "world"];
        let embedder = TfidfEmbedder::fit(forms);
        let v = embedder.encode("hello");
        assert!((sparse_dot(&v, &v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn tfidf_ignores_unknown_grams() {
        let forms = ["hello", "help"];
        let embedder = TfidfEmbedder::fit(forms);
        assert!(embedder.encode("качество").is_empty());
    }
}
