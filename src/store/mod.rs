// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Corpus store: one directory per sealed generation.
//!
//! ```text
//! <dir>/
//!   corpus.bin          entries, hash, generation
//!   trie.bin            prefix index
//!   bktree.bin          edit-distance index
//!   ngram.bin           candidate generator
//!   vectors/char.bin    character model (embedder + matrix)
//!   vectors/subword.bin subword model
//!   vectors/tfidf.bin   TF-IDF model
//!   vectors/fusion.bin  fusion weights
//!   manifest.json       sizes, CRCs, corpus hash, build time, sources
//! ```
//!
//! Writes are atomic at the directory level: everything lands in a sibling
//! temp directory first, then a rename swaps it in. A reader watching the
//! path sees the old generation or the new one, never a mix.
//!
//! Loads verify three layers before anything is trusted: per-file CRC32
//! against the manifest, the frame checks inside each section, and the
//! corpus content hash against the manifest's record.

pub mod format;

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::index::{BkTreeIndex, NGramIndex, TrieIndex};
use crate::ingest::SourceDescriptor;
use crate::search::Snapshot;
use crate::vector::{
    CharacterModel, FusionSpec, SubwordModel, TfidfModel, VectorIndex,
};
use format::SectionKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const MANIFEST_NAME: &str = "manifest.json";

/// One file the manifest vouches for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub bytes: u64,
    pub crc32: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u8,
    pub generation: u64,
    pub corpus_hash: String,
    /// Unix seconds at write time.
    pub created_unix: u64,
    pub sources: Vec<SourceDescriptor>,
    pub files: Vec<FileRecord>,
}

/// Persist a snapshot. `dir` may or may not exist; the swap handles both.
pub fn save(snapshot: &Snapshot, sources: &[SourceDescriptor], dir: &Path) -> Result<()> {
    let generation = snapshot.corpus.generation();
    let tmp = sibling(dir, &format!("tmp-{generation}"))?;
    if tmp.exists() {
        std::fs::remove_dir_all(&tmp)?;
    }
    std::fs::create_dir_all(tmp.join("vectors"))?;

    let mut files = Vec::new();
    let mut record = |name: &str, written: (u64, u32)| {
        files.push(FileRecord {
            name: name.to_string(),
            bytes: written.0,
            crc32: written.1,
        });
    };

    record(
        "corpus.bin",
        format::write_section(&tmp.join("corpus.bin"), SectionKind::Corpus, snapshot.corpus.as_ref())?,
    );
    record(
        "trie.bin",
        format::write_section(&tmp.join("trie.bin"), SectionKind::Trie, &snapshot.trie)?,
    );
    record(
        "bktree.bin",
        format::write_section(&tmp.join("bktree.bin"), SectionKind::BkTree, &snapshot.bktree)?,
    );
    record(
        "ngram.bin",
        format::write_section(&tmp.join("ngram.bin"), SectionKind::NGram, &snapshot.ngram)?,
    );
    record(
        "vectors/char.bin",
        format::write_section(
            &tmp.join("vectors/char.bin"),
            SectionKind::VectorChar,
            &snapshot.vectors.character,
        )?,
    );
    record(
        "vectors/subword.bin",
        format::write_section(
            &tmp.join("vectors/subword.bin"),
            SectionKind::VectorSubword,
            &snapshot.vectors.subword,
        )?,
    );
    record(
        "vectors/tfidf.bin",
        format::write_section(
            &tmp.join("vectors/tfidf.bin"),
            SectionKind::VectorTfidf,
            &snapshot.vectors.tfidf,
        )?,
    );
    record(
        "vectors/fusion.bin",
        format::write_section(
            &tmp.join("vectors/fusion.bin"),
            SectionKind::VectorFusion,
            &snapshot.vectors.fusion,
        )?,
    );

    let manifest = Manifest {
        format_version: format::VERSION,
        generation,
        corpus_hash: snapshot.corpus.content_hash().to_string(),
        created_unix: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs()),
        sources: sources.to_vec(),
        files,
    };
    std::fs::write(
        tmp.join(MANIFEST_NAME),
        serde_json::to_string_pretty(&manifest)?,
    )?;

    swap_into_place(&tmp, dir, generation)?;
    tracing::info!(dir = %dir.display(), generation, "store written");
    Ok(())
}

/// Replace `dir` with `tmp` as atomically as a filesystem allows: the old
/// directory is renamed aside, the new one renamed in, then the old one is
/// deleted. Readers see old or new, never a mix.
fn swap_into_place(tmp: &Path, dir: &Path, generation: u64) -> Result<()> {
    if dir.exists() {
        let old = sibling(dir, &format!("old-{generation}"))?;
        if old.exists() {
            std::fs::remove_dir_all(&old)?;
        }
        std::fs::rename(dir, &old)?;
        std::fs::rename(tmp, dir)?;
        if let Err(e) = std::fs::remove_dir_all(&old) {
            tracing::warn!(dir = %old.display(), error = %e, "stale generation left behind");
        }
    } else {
        if let Some(parent) = dir.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(tmp, dir)?;
    }
    Ok(())
}

fn sibling(dir: &Path, suffix: &str) -> Result<PathBuf> {
    let name = dir
        .file_name()
        .ok_or_else(|| Error::Config(format!("store path '{}' has no name", dir.display())))?;
    let mut sib = name.to_os_string();
    sib.push(".");
    sib.push(suffix);
    Ok(dir.with_file_name(sib))
}

/// Load a snapshot, verifying integrity at every layer.
pub fn load(dir: &Path) -> Result<(Snapshot, Manifest)> {
    let manifest_path = dir.join(MANIFEST_NAME);
    let manifest: Manifest = serde_json::from_str(&std::fs::read_to_string(&manifest_path)?)?;

    if manifest.format_version != format::VERSION {
        return Err(Error::Index(format!(
            "store format version {} (expected {})",
            manifest.format_version,
            format::VERSION
        )));
    }

    for record in &manifest.files {
        let path = dir.join(&record.name);
        let meta = std::fs::metadata(&path)
            .map_err(|_| Error::CorruptStore(format!("{} missing", record.name)))?;
        if meta.len() != record.bytes {
            return Err(Error::CorruptStore(format!(
                "{}: {} bytes, manifest says {}",
                record.name,
                meta.len(),
                record.bytes
            )));
        }
        if format::file_crc32(&path)? != record.crc32 {
            return Err(Error::CorruptStore(format!(
                "{}: CRC disagrees with manifest",
                record.name
            )));
        }
    }

    let corpus: Corpus = format::read_section(&dir.join("corpus.bin"), SectionKind::Corpus)?;
    if corpus.content_hash() != manifest.corpus_hash {
        return Err(Error::CorruptStore(
            "corpus content hash disagrees with manifest".to_string(),
        ));
    }
    if corpus.generation() != manifest.generation {
        return Err(Error::CorruptStore(format!(
            "corpus generation {} disagrees with manifest {}",
            corpus.generation(),
            manifest.generation
        )));
    }

    let trie: TrieIndex = format::read_section(&dir.join("trie.bin"), SectionKind::Trie)?;
    let bktree: BkTreeIndex = format::read_section(&dir.join("bktree.bin"), SectionKind::BkTree)?;
    let ngram: NGramIndex = format::read_section(&dir.join("ngram.bin"), SectionKind::NGram)?;
    let character: CharacterModel =
        format::read_section(&dir.join("vectors/char.bin"), SectionKind::VectorChar)?;
    let subword: SubwordModel =
        format::read_section(&dir.join("vectors/subword.bin"), SectionKind::VectorSubword)?;
    let tfidf: TfidfModel =
        format::read_section(&dir.join("vectors/tfidf.bin"), SectionKind::VectorTfidf)?;
    let fusion: FusionSpec =
        format::read_section(&dir.join("vectors/fusion.bin"), SectionKind::VectorFusion)?;

    let vectors = VectorIndex {
        character,
        subword,
        tfidf,
        fusion,
    };
    let snapshot = Snapshot::from_parts(corpus, trie, bktree, ngram, vectors)?;
    tracing::info!(
        dir = %dir.display(),
        generation = manifest.generation,
        entries = snapshot.corpus.len(),
        "store loaded"
    );
    Ok((snapshot, manifest))
}
