// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Framed binary sections: the one on-disk encoding for every index file.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ magic: [u8; 4] = "GLSX"                      │
//! │ version: u8 = 1                              │
//! │ kind: u8 (SectionKind)                       │
//! │ flags: u8 (reserved; quantization will live  │
//! │          here without a version bump)        │
//! │ reserved: u8                                 │
//! │ payload_len: u64 LE                          │
//! ├──────────────────────────────────────────────┤
//! │ payload: brotli(bincode(T))                  │
//! ├──────────────────────────────────────────────┤
//! │ crc32 over everything above, u32 LE          │
//! │ footer magic: [u8; 4] = "XSLG"               │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The format is meant to be safely parsed from untrusted files: sizes are
//! validated against hard limits before any allocation, the CRC32 footer
//! catches corruption and truncation, and a wrong section kind (trie bytes
//! in a corpus file) fails before deserialization rather than after.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{Read, Write};
use std::path::Path;

/// Header magic: "GLSX".
pub const MAGIC: [u8; 4] = *b"GLSX";

/// Footer magic: "XSLG" (reversed, marks a complete file).
pub const FOOTER_MAGIC: [u8; 4] = *b"XSLG";

/// Current format version.
pub const VERSION: u8 = 1;

/// Fixed header size in bytes.
const HEADER_LEN: usize = 16;

/// Fixed footer size in bytes.
const FOOTER_LEN: usize = 8;

/// Hard cap on a compressed section payload (prevents hostile allocations).
pub const MAX_PAYLOAD_SIZE: u64 = 1 << 30; // 1 GiB

/// Brotli quality: 5 is the knee of the curve for bincode payloads.
const BROTLI_QUALITY: u32 = 5;
const BROTLI_LGWIN: u32 = 22;
const BROTLI_BUFFER: usize = 4096;

/// What a section contains. The byte value is part of the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SectionKind {
    Corpus = 1,
    Trie = 2,
    BkTree = 3,
    NGram = 4,
    VectorChar = 5,
    VectorSubword = 6,
    VectorTfidf = 7,
    VectorFusion = 8,
}

impl SectionKind {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(SectionKind::Corpus),
            2 => Some(SectionKind::Trie),
            3 => Some(SectionKind::BkTree),
            4 => Some(SectionKind::NGram),
            5 => Some(SectionKind::VectorChar),
            6 => Some(SectionKind::VectorSubword),
            7 => Some(SectionKind::VectorTfidf),
            8 => Some(SectionKind::VectorFusion),
            _ => None,
        }
    }
}

/// Serialize, compress, frame, and write one section.
///
/// Returns `(file_bytes, crc32_of_file)` for the manifest.
pub fn write_section<T: Serialize>(path: &Path, kind: SectionKind, value: &T) -> Result<(u64, u32)> {
    let payload = bincode::serialize(value)?;

    let mut compressed = Vec::new();
    {
        let mut writer = brotli::CompressorWriter::new(
            &mut compressed,
            BROTLI_BUFFER,
            BROTLI_QUALITY,
            BROTLI_LGWIN,
        );
        writer.write_all(&payload)?;
    }

    let mut buf = Vec::with_capacity(HEADER_LEN + compressed.len() + FOOTER_LEN);
    buf.extend_from_slice(&MAGIC);
    buf.push(VERSION);
    buf.push(kind as u8);
    buf.push(0); // flags
    buf.push(0); // reserved
    buf.extend_from_slice(&(compressed.len() as u64).to_le_bytes());
    buf.extend_from_slice(&compressed);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&buf);
    let crc = hasher.finalize();
    buf.extend_from_slice(&crc.to_le_bytes());
    buf.extend_from_slice(&FOOTER_MAGIC);

    let mut file_hasher = crc32fast::Hasher::new();
    file_hasher.update(&buf);
    let file_crc = file_hasher.finalize();

    std::fs::write(path, &buf)?;
    Ok((buf.len() as u64, file_crc))
}

/// Read, validate, decompress, and deserialize one section.
pub fn read_section<T: DeserializeOwned>(path: &Path, kind: SectionKind) -> Result<T> {
    let buf = std::fs::read(path)?;
    let name = path.display();

    if buf.len() < HEADER_LEN + FOOTER_LEN {
        return Err(Error::CorruptStore(format!("{name}: truncated header")));
    }
    if buf[0..4] != MAGIC {
        return Err(Error::CorruptStore(format!("{name}: bad magic")));
    }
    if buf[4] != VERSION {
        return Err(Error::Index(format!(
            "{name}: format version {} (expected {VERSION})",
            buf[4]
        )));
    }
    match SectionKind::from_byte(buf[5]) {
        Some(found) if found == kind => {}
        Some(found) => {
            return Err(Error::CorruptStore(format!(
                "{name}: section kind {found:?} where {kind:?} expected"
            )));
        }
        None => {
            return Err(Error::CorruptStore(format!(
                "{name}: unknown section kind {}",
                buf[5]
            )));
        }
    }

    let payload_len = u64::from_le_bytes(
        buf[8..16]
            .try_into()
            .map_err(|_| Error::CorruptStore(format!("{name}: bad header")))?,
    );
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(Error::CorruptStore(format!(
            "{name}: payload length {payload_len} exceeds limit"
        )));
    }
    let expected_len = HEADER_LEN + payload_len as usize + FOOTER_LEN;
    if buf.len() != expected_len {
        return Err(Error::CorruptStore(format!(
            "{name}: {} bytes on disk, frame says {expected_len}",
            buf.len()
        )));
    }

    let body_end = buf.len() - FOOTER_LEN;
    if buf[body_end + 4..] != FOOTER_MAGIC {
        return Err(Error::CorruptStore(format!("{name}: bad footer magic")));
    }
    let stored_crc = u32::from_le_bytes(
        buf[body_end..body_end + 4]
            .try_into()
            .map_err(|_| Error::CorruptStore(format!("{name}: bad footer")))?,
    );
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&buf[..body_end]);
    if hasher.finalize() != stored_crc {
        return Err(Error::CorruptStore(format!("{name}: CRC mismatch")));
    }

    let mut payload = Vec::new();
    brotli::Decompressor::new(&buf[HEADER_LEN..body_end], BROTLI_BUFFER)
        .read_to_end(&mut payload)
        .map_err(|e| Error::CorruptStore(format!("{name}: decompression failed: {e}")))?;

    Ok(bincode::deserialize(&payload)?)
}

/// CRC32 of a whole file, for manifest cross-checks.
pub fn file_crc32(path: &Path) -> Result<u32> {
    let buf = std::fs::read(path)?;
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&buf);
    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        words: Vec<String>,
        scores: Vec<f32>,
    }

    fn sample() -> Sample {
        Sample {
            words: vec!["hello".into(), "café".into()],
            scores: vec![0.5, 1.0],
        }
    }

    fn temp_file(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("glossa-format-test");
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn roundtrip() {
        let path = temp_file("roundtrip.bin");
        write_section(&path, SectionKind::Corpus, &sample()).unwrap();
        let back: Sample = read_section(&path, SectionKind::Corpus).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn wrong_kind_rejected() {
        let path = temp_file("kind.bin");
        write_section(&path, SectionKind::Trie, &sample()).unwrap();
        let err = read_section::<Sample>(&path, SectionKind::Corpus).unwrap_err();
        assert!(matches!(err, Error::CorruptStore(_)));
    }

    #[test]
    fn flipped_byte_fails_crc() {
        let path = temp_file("crc.bin");
        write_section(&path, SectionKind::Corpus, &sample()).unwrap();
        let mut bytes = std::fs::read(&path).unwrap();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xff;
        std::fs::write(&path, &bytes).unwrap();
        let err = read_section::<Sample>(&path, SectionKind::Corpus).unwrap_err();
        assert!(matches!(err, Error::CorruptStore(_)));
    }

    #[test]
    fn truncated_file_rejected() {
        let path = temp_file("trunc.bin");
        write_section(&path, SectionKind::Corpus, &sample()).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 5]).unwrap();
        assert!(read_section::<Sample>(&path, SectionKind::Corpus).is_err());
    }

    #[test]
    fn garbage_rejected_without_panic() {
        let path = temp_file("garbage.bin");
        std::fs::write(&path, b"not a section at all").unwrap();
        assert!(read_section::<Sample>(&path, SectionKind::Corpus).is_err());
    }
}
