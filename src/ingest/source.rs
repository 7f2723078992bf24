// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Lexicon source descriptors.
//!
//! A source is a URL (or local path) plus a parser selector. The catalog at
//! the bottom lists the verified public sources the engine was tuned
//! against; callers can pass their own descriptors or start from
//! [`default_catalog`] and filter by language.

use crate::types::Language;
use serde::{Deserialize, Serialize};

/// Parser selector. Dispatch is a plain match in `parser.rs` - adding a
/// format means adding a variant and an arm, nothing dynamic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// One entry per line; blank lines and `#` comments ignored.
    TextLines,
    /// `word frequency` pairs, whitespace-separated, extra columns ignored.
    FrequencyList,
    /// JSON array of idiom strings, objects with an idiom-ish field, or an
    /// object wrapping the array under `"idioms"`.
    JsonIdioms,
    /// JSON object; the keys are the entries.
    JsonDict,
    /// JSON array of strings.
    JsonArray,
    /// CSV with the idiom in the first column.
    CsvIdioms,
    /// `NNNNN word` diceware tables.
    Diceware,
}

/// One configured lexicon source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub name: String,
    /// `http(s)://` URL, `file://` URL, or a bare filesystem path.
    pub url: String,
    pub format: SourceFormat,
    pub language: Language,
    /// Entries from this source default to idiom status (individual parsed
    /// items may still override).
    #[serde(default)]
    pub is_idiom: bool,
}

impl SourceDescriptor {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        format: SourceFormat,
        language: Language,
    ) -> Self {
        SourceDescriptor {
            name: name.into(),
            url: url.into(),
            format,
            language,
            is_idiom: false,
        }
    }

    pub fn idioms(mut self) -> Self {
        self.is_idiom = true;
        self
    }

    /// Fail fast on descriptors that cannot possibly work.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.name.trim().is_empty() {
            return Err(crate::error::Error::Config(
                "source descriptor needs a non-empty name".to_string(),
            ));
        }
        if self.url.trim().is_empty() {
            return Err(crate::error::Error::Config(format!(
                "source '{}' needs a non-empty url",
                self.name
            )));
        }
        Ok(())
    }
}

/// The verified public source catalog: English words, frequencies, idioms
/// and phrases, plus the French dictionaries.
pub fn default_catalog() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor::new(
            "dwyl_english_words",
            "https://raw.githubusercontent.com/dwyl/english-words/master/words_alpha.txt",
            SourceFormat::TextLines,
            Language::En,
        ),
        SourceDescriptor::new(
            "english_frequency_50k",
            "https://raw.githubusercontent.com/hermitdave/FrequencyWords/master/content/2018/en/en_50k.txt",
            SourceFormat::FrequencyList,
            Language::En,
        ),
        SourceDescriptor::new(
            "english_idioms",
            "https://raw.githubusercontent.com/zaghloul404/englishidioms/main/data/idioms.json",
            SourceFormat::JsonIdioms,
            Language::En,
        )
        .idioms(),
        SourceDescriptor::new(
            "useful_english_phrases",
            "https://raw.githubusercontent.com/khvorostin/useful-english-phrases/master/phrases.txt",
            SourceFormat::TextLines,
            Language::En,
        ),
        SourceDescriptor::new(
            "generated_english_phrases",
            "https://raw.githubusercontent.com/WithEnglishWeCan/generated-english-phrases/main/phrases.json",
            SourceFormat::JsonArray,
            Language::En,
        ),
        SourceDescriptor::new(
            "french_dictionary",
            "https://raw.githubusercontent.com/hbenbel/French-Dictionary/master/dictionary/francais.txt",
            SourceFormat::TextLines,
            Language::Fr,
        ),
        SourceDescriptor::new(
            "french_words_array",
            "https://raw.githubusercontent.com/words/an-array-of-french-words/master/index.json",
            SourceFormat::JsonArray,
            Language::Fr,
        ),
        SourceDescriptor::new(
            "french_frequency_50k",
            "https://raw.githubusercontent.com/hermitdave/FrequencyWords/master/content/2016/fr/fr_50k.txt",
            SourceFormat::FrequencyList,
            Language::Fr,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_descriptors_validate() {
        for source in default_catalog() {
            source.validate().unwrap();
        }
    }

    #[test]
    fn blank_fields_rejected() {
        let source = SourceDescriptor::new("", "http://x", SourceFormat::TextLines, Language::En);
        assert!(source.validate().is_err());
        let source = SourceDescriptor::new("x", " ", SourceFormat::TextLines, Language::En);
        assert!(source.validate().is_err());
    }

    #[test]
    fn descriptor_serde_roundtrip() {
        let source = SourceDescriptor::new(
            "test",
            "file:///tmp/words.txt",
            SourceFormat::FrequencyList,
            Language::Fr,
        )
        .idioms();
        let json = serde_json::to_string(&source).unwrap();
        assert!(json.contains("\"frequency_list\""));
        let back: SourceDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, source);
    }
}
