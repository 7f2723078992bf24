// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Lexicon ingestion: source descriptors in, staged corpus entries out.
//!
//! Fetch and parse fan out over a small worker pool (default 8 threads,
//! one task per source); the corpus builder itself is fed on the calling
//! thread, in source order, so builds stay deterministic no matter how the
//! downloads race.
//!
//! Failure containment: a source that fails to fetch or parse is logged and
//! skipped. The build only fails when *every* source came up empty -
//! [`Error::NoSources`].

pub mod fetch;
pub mod parser;
pub mod source;

pub use fetch::{FetchOptions, Fetcher};
pub use parser::RawItem;
pub use source::{default_catalog, SourceDescriptor, SourceFormat};

use crate::corpus::CorpusBuilder;
use crate::error::{Error, Result};
use crate::normalize::{Normalizer, NormalizerOptions};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Ingestion tuning.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub fetch: FetchOptions,
    pub normalizer: NormalizerOptions,
    /// Cap on concurrent source downloads.
    pub max_concurrent_fetches: usize,
}

impl IngestOptions {
    fn workers(&self, sources: usize) -> usize {
        let cap = if self.max_concurrent_fetches == 0 {
            8
        } else {
            self.max_concurrent_fetches
        };
        cap.min(sources).max(1)
    }
}

/// Fetch, parse, and stage every source into a corpus builder.
///
/// The returned builder still needs [`CorpusBuilder::build`]; the engine
/// owns the generation counter.
pub fn ingest(sources: &[SourceDescriptor], options: &IngestOptions) -> Result<CorpusBuilder> {
    if sources.is_empty() {
        return Err(Error::NoSources);
    }
    for source in sources {
        source.validate()?;
    }

    let fetcher = Fetcher::new(options.fetch.clone())?;
    let cursor = AtomicUsize::new(0);
    let parsed: Mutex<Vec<(usize, Vec<RawItem>)>> = Mutex::new(Vec::new());
    let workers = options.workers(sources.len());

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let i = cursor.fetch_add(1, Ordering::Relaxed);
                let Some(source) = sources.get(i) else { break };

                let outcome = fetcher
                    .fetch(&source.url)
                    .and_then(|payload| parser::parse(source, &payload));
                match outcome {
                    Ok(items) => {
                        tracing::debug!(
                            source = %source.name,
                            items = items.len(),
                            "source parsed"
                        );
                        parsed.lock().push((i, items));
                    }
                    Err(e) => {
                        tracing::warn!(source = %source.name, error = %e, "source skipped");
                    }
                }
            });
        }
    });

    let mut parsed = parsed.into_inner();
    if parsed.is_empty() {
        return Err(Error::NoSources);
    }
    // Source order, not completion order: the builder must see a
    // deterministic stream.
    parsed.sort_by_key(|(i, _)| *i);

    let mut builder = CorpusBuilder::new(Normalizer::new(options.normalizer));
    let mut accepted = 0usize;
    let mut total = 0usize;
    for (i, items) in parsed {
        let source = &sources[i];
        total += items.len();
        for item in items {
            let is_idiom = item.is_idiom.unwrap_or(source.is_idiom);
            if builder.add(&item.text, source.language, item.frequency, is_idiom) {
                accepted += 1;
            }
        }
    }

    tracing::info!(
        sources = sources.len(),
        parsed = total,
        accepted,
        staged = builder.staged(),
        "ingestion complete"
    );
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Language;
    use std::io::Write;

    fn temp_source(name: &str, contents: &[u8], format: SourceFormat) -> SourceDescriptor {
        let dir = std::env::temp_dir().join("glossa-ingest-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents).unwrap();
        SourceDescriptor::new(name, path.to_str().unwrap(), format, Language::En)
    }

    #[test]
    fn ingests_local_sources_concurrently() {
        let sources = vec![
            temp_source("words-a.txt", b"hello\nworld\n", SourceFormat::TextLines),
            temp_source("words-b.txt", b"ennui\ncoulisse\n", SourceFormat::TextLines),
        ];
        let builder = ingest(&sources, &IngestOptions::default()).unwrap();
        assert_eq!(builder.staged(), 4);
    }

    #[test]
    fn failed_source_is_skipped_not_fatal() {
        let sources = vec![
            temp_source("words-c.txt", b"hello\n", SourceFormat::TextLines),
            SourceDescriptor::new(
                "missing",
                "/no/such/file",
                SourceFormat::TextLines,
                Language::En,
            ),
        ];
        let builder = ingest(&sources, &IngestOptions::default()).unwrap();
        assert_eq!(builder.staged(), 1);
    }

    #[test]
    fn all_sources_failing_is_no_sources() {
        let sources = vec![SourceDescriptor::new(
            "missing",
            "/no/such/file",
            SourceFormat::TextLines,
            Language::En,
        )];
        assert!(matches!(
            ingest(&sources, &IngestOptions::default()),
            Err(Error::NoSources)
        ));
    }

    #[test]
    fn empty_source_list_is_no_sources() {
        assert!(matches!(
            ingest(&[], &IngestOptions::default()),
            Err(Error::NoSources)
        ));
    }

    #[test]
    fn idiom_default_flows_from_descriptor() {
        let source = temp_source("idioms.txt", b"kick the bucket\n", SourceFormat::TextLines)
            .idioms();
        let builder = ingest(&[source], &IngestOptions::default()).unwrap();
        let corpus = builder.build(1).unwrap();
        assert!(corpus.entry(0).is_idiom);
    }
}
