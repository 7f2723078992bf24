// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Dense/sparse vector index for semantic-shape similarity.
//!
//! One row per corpus entry, three embedding modes plus a fusion view.
//! Search is exact flat inner-product over unit vectors - no approximate
//! structure. For the corpus sizes this engine targets (up to ~10^6
//! entries) a rayon-parallel scan beats the constant factors of an ANN
//! graph, and exactness keeps the ranking invariants testable.
//!
//! # The fusion identity
//!
//! The fusion vector is `concat(w_c·char, w_s·subword, w_t·tfidf)`,
//! L2-normalized. Because each component is already unit-length, the
//! concatenation's norm is the constant `sqrt(w_c² + w_s² + w_t²)`, and so
//!
//! ```text
//! cos_fusion = (w_c²·cos_char + w_s²·cos_subword + w_t²·cos_tfidf)
//!              / (w_c² + w_s² + w_t²)
//! ```
//!
//! The index exploits that: fusion search combines the three per-mode
//! similarities instead of materializing a concatenated matrix. Same
//! numbers, a third of the memory.

pub mod embed;

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use embed::{
    sparse_dot, CharacterEmbedder, SparseVector, SubwordEmbedder, TfidfEmbedder,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Which embedding space a semantic query runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMode {
    Character,
    Subword,
    Tfidf,
    #[default]
    Fusion,
}

impl EmbeddingMode {
    pub const ALL: [EmbeddingMode; 4] = [
        EmbeddingMode::Character,
        EmbeddingMode::Subword,
        EmbeddingMode::Tfidf,
        EmbeddingMode::Fusion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EmbeddingMode::Character => "char",
            EmbeddingMode::Subword => "subword",
            EmbeddingMode::Tfidf => "tfidf",
            EmbeddingMode::Fusion => "fusion",
        }
    }
}

/// Row-major dense matrix of unit vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseMatrix {
    pub dim: usize,
    pub data: Vec<f32>,
}

impl DenseMatrix {
    pub fn rows(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }
}

/// Character-mode model: embedder + its matrix. Serialized as one store
/// section so the query-time embedder can never drift from the rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterModel {
    pub embedder: CharacterEmbedder,
    pub matrix: DenseMatrix,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubwordModel {
    pub embedder: SubwordEmbedder,
    pub matrix: DenseMatrix,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfModel {
    pub embedder: TfidfEmbedder,
    pub rows: Vec<SparseVector>,
}

/// Fusion weights for (char, subword, tfidf).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionSpec {
    pub weights: [f32; 3],
}

impl Default for FusionSpec {
    fn default() -> Self {
        FusionSpec {
            weights: [0.3, 0.5, 0.2],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    pub character: CharacterModel,
    pub subword: SubwordModel,
    pub tfidf: TfidfModel,
    pub fusion: FusionSpec,
}

/// A scored row: `(entry index, cosine in [-1, 1])`.
pub type VectorHit = (u32, f32);

impl VectorIndex {
    /// Embed every corpus entry in every mode. Rayon-parallel per mode.
    pub fn build(corpus: &Corpus) -> Self {
        let forms: Vec<&str> = corpus.iter().map(|(_, e)| e.normalized.as_str()).collect();

        let char_embedder = CharacterEmbedder::default();
        let subword_embedder = SubwordEmbedder::fit(forms.iter().copied());
        let tfidf_embedder = TfidfEmbedder::fit(forms.iter().copied());

        let char_data: Vec<f32> = forms
            .par_iter()
            .flat_map_iter(|form| char_embedder.encode(form))
            .collect();
        let subword_data: Vec<f32> = forms
            .par_iter()
            .flat_map_iter(|form| subword_embedder.encode(form))
            .collect();
        let tfidf_rows: Vec<SparseVector> = forms
            .par_iter()
            .map(|form| tfidf_embedder.encode(form))
            .collect();

        VectorIndex {
            character: CharacterModel {
                matrix: DenseMatrix {
                    dim: char_embedder.dim,
                    data: char_data,
                },
                embedder: char_embedder,
            },
            subword: SubwordModel {
                matrix: DenseMatrix {
                    dim: subword_embedder.dim,
                    data: subword_data,
                },
                embedder: subword_embedder,
            },
            tfidf: TfidfModel {
                embedder: tfidf_embedder,
                rows: tfidf_rows,
            },
            fusion: FusionSpec::default(),
        }
    }

    pub fn rows(&self) -> usize {
        self.tfidf.rows.len()
    }

    /// Cross-check the parallel arrays; a mismatch means a corrupt or
    /// mixed-generation load.
    pub fn validate(&self, expected_rows: usize) -> Result<()> {
        let char_rows = self.character.matrix.rows();
        let subword_rows = self.subword.matrix.rows();
        let tfidf_rows = self.tfidf.rows.len();
        if char_rows != expected_rows || subword_rows != expected_rows || tfidf_rows != expected_rows
        {
            return Err(Error::Index(format!(
                "vector row mismatch: char {char_rows}, subword {subword_rows}, \
                 tfidf {tfidf_rows}, corpus {expected_rows}"
            )));
        }
        if self.character.matrix.dim != self.character.embedder.dim {
            return Err(Error::Index(format!(
                "character dimension mismatch: matrix {} vs embedder {}",
                self.character.matrix.dim, self.character.embedder.dim
            )));
        }
        if self.subword.matrix.dim != self.subword.embedder.dim {
            return Err(Error::Index(format!(
                "subword dimension mismatch: matrix {} vs embedder {}",
                self.subword.matrix.dim, self.subword.embedder.dim
            )));
        }
        Ok(())
    }

    /// Top-k rows by cosine for a query string in the given mode.
    ///
    /// Raw cosines come back in [-1, 1]; the score policy upstairs decides
    /// how to clamp them. Ties break on entry index, ascending.
    pub fn search(&self, query: &str, mode: EmbeddingMode, k: usize) -> Vec<VectorHit> {
        if query.is_empty() || k == 0 || self.rows() == 0 {
            return Vec::new();
        }

        let mut scored: Vec<VectorHit> = match mode {
            EmbeddingMode::Character => {
                let q = self.character.embedder.encode(query);
                dense_scan(&self.character.matrix, &q)
            }
            EmbeddingMode::Subword => {
                let q = self.subword.embedder.encode(query);
                dense_scan(&self.subword.matrix, &q)
            }
            EmbeddingMode::Tfidf => {
                let q = self.tfidf.embedder.encode(query);
                self.tfidf
                    .rows
                    .par_iter()
                    .enumerate()
                    .map(|(i, row)| (i as u32, sparse_dot(row, &q)))
                    .collect()
            }
            EmbeddingMode::Fusion => {
                let qc = self.character.embedder.encode(query);
                let qs = self.subword.embedder.encode(query);
                let qt = self.tfidf.embedder.encode(query);
                let [wc, ws, wt] = self.fusion.weights;
                let (wc2, ws2, wt2) = (wc * wc, ws * ws, wt * wt);
                let total = wc2 + ws2 + wt2;

                (0..self.rows())
                    .into_par_iter()
                    .map(|i| {
                        let sc = dot(self.character.matrix.row(i), &qc);
                        let ss = dot(self.subword.matrix.row(i), &qs);
                        let st = sparse_dot(&self.tfidf.rows[i], &qt);
                        (i as u32, (wc2 * sc + ws2 * ss + wt2 * st) / total)
                    })
                    .collect()
            }
        };

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);
        scored
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn dense_scan(matrix: &DenseMatrix, query: &[f32]) -> Vec<VectorHit> {
    (0..matrix.rows())
        .into_par_iter()
        .map(|i| (i as u32, dot(matrix.row(i), query)))
        .collect()
}
