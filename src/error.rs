// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the search core.
//!
//! The containment policy matters more than the variants: parser and
//! per-source fetch failures are logged and skipped (a build succeeds if at
//! least one source yielded entries), per-method query failures never poison
//! the rest of the result set, and deadline overruns surface as
//! [`SearchWarning`](crate::types::SearchWarning)s rather than errors.
//! Configuration problems fail fast at build time.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed source descriptor, invalid language tag, bad thresholds.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Network failure after retries exhausted.
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Malformed source payload. Source-local; the build skips the source.
    #[error("parse error in source '{source_name}': {reason}")]
    Parse { source_name: String, reason: String },

    /// Every configured source failed or yielded nothing.
    #[error("no lexicon source yielded entries")]
    NoSources,

    /// The corpus builder received zero valid entries.
    #[error("corpus contains no valid entries")]
    EmptyCorpus,

    /// On-disk state failed an integrity check: bad magic, CRC mismatch,
    /// content-hash mismatch, or a manifest that disagrees with its files.
    #[error("corrupt store: {0}")]
    CorruptStore(String),

    /// Index-level failure: mismatched vector dimension, truncated section,
    /// format version mismatch.
    #[error("index error: {0}")]
    Index(String),

    /// Truly invalid query inputs only. Shape-of-query problems (empty
    /// string, no matches) are not errors.
    #[error("invalid query: {0}")]
    Query(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Payload (de)serialization failure inside a store section.
    #[error("codec error: {0}")]
    Codec(String),
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Codec(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Codec(err.to_string())
    }
}
