//! Shared fixtures for the integration suites.

use glossa::{Corpus, CorpusBuilder, Language, SearchEngine};

/// The reference corpus used across the end-to-end scenarios: a mix of
/// English and French words, phrases, and accented forms, all at equal
/// frequency so ranking differences come from scores alone.
pub const FIXTURE: &[(&str, Language)] = &[
    ("ennui", Language::En),
    ("en coulisse", Language::Fr),
    ("coulisse", Language::Fr),
    ("en route", Language::Fr),
    ("en effet", Language::Fr),
    ("café", Language::Fr),
    ("résumé", Language::Fr),
    ("à la carte", Language::Fr),
    ("machine learning", Language::En),
    ("hello", Language::En),
    ("help", Language::En),
    ("helpful", Language::En),
    ("world", Language::En),
];

pub fn fixture_corpus() -> Corpus {
    let mut builder = CorpusBuilder::default();
    for (text, language) in FIXTURE {
        builder.add(text, *language, Some(1.0), false);
    }
    builder.build(1).unwrap()
}

pub fn fixture_engine() -> SearchEngine {
    SearchEngine::from_corpus(fixture_corpus())
}
