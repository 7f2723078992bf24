// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Canonicalization of raw lexicon strings.
//!
//! Every string that enters the corpus goes through the same deterministic
//! pipeline, in this order:
//!
//! 1. Unicode NFC normalization
//! 2. Unicode-aware lowercasing
//! 3. Curly quote / apostrophe / dash variants mapped to ASCII `'` and `-`
//! 4. English contraction expansion (closed table, English entries only)
//! 5. Punctuation removal, keeping `-`, `'`, whitespace, letters, digits
//! 6. Whitespace collapse + trim
//!
//! Diacritics are NOT stripped here - "café" stays "café" so results surface
//! accented forms intact. The accent-insensitive view used by the fuzzy
//! layers comes from [`fold`], which additionally applies NFD and drops
//! combining marks. Keep the two separate or French stops looking French.
//!
//! An input that collapses to nothing normalizes to the empty string; callers
//! treat empty as "not indexable".

use crate::types::Language;
use std::collections::HashSet;
use std::sync::LazyLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Contractions with irregular expansions, checked before the suffix rules.
static IRREGULAR_CONTRACTIONS: &[(&str, &str)] = &[
    ("won't", "will not"),
    ("can't", "cannot"),
    ("shan't", "shall not"),
];

/// Suffix-driven expansions, applied to whole whitespace tokens.
/// `n't` must come first so "don't" does not hit the `'d`-style rules.
static SUFFIX_CONTRACTIONS: &[(&str, &str)] = &[
    ("n't", " not"),
    ("'re", " are"),
    ("'ve", " have"),
    ("'ll", " will"),
    ("'d", " would"),
    ("'m", " am"),
];

/// Stems for which `'s` safely means "is". Possessive `'s` on ordinary nouns
/// is left alone; see [`NormalizerOptions::expand_possessive_s`].
static IS_CONTRACTION_STEMS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "it", "he", "she", "that", "there", "here", "this", "what", "who", "where", "when",
        "why", "how", "one",
    ]
    .into_iter()
    .collect()
});

/// Knobs for the pipeline. Only one so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizerOptions {
    /// Expand `'s` to ` is` on pronoun-like stems ("it's" -> "it is").
    /// On by default for English; the expansion conflates possessives with
    /// contractions, which is tolerable for indexing (wider recall) but
    /// wrong for languages where `'s` never contracts "is".
    pub expand_possessive_s: bool,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        NormalizerOptions {
            expand_possessive_s: true,
        }
    }
}

/// The pipeline, packaged so ingestion and the query path share one instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    options: NormalizerOptions,
}

impl Normalizer {
    pub fn new(options: NormalizerOptions) -> Self {
        Normalizer { options }
    }

    /// Run the full pipeline. Contraction expansion only fires for English
    /// (and the multilingual bucket, which is recall-biased by definition).
    pub fn normalize(&self, raw: &str, language: Language) -> String {
        // Steps 1-3: NFC, lowercase, canonicalize quote/dash variants.
        let canonical: String = raw
            .nfc()
            .collect::<String>()
            .to_lowercase()
            .chars()
            .map(canonicalize_char)
            .collect();

        // Step 4: contraction expansion, token by token.
        let expanded = if matches!(language, Language::En | Language::Multi) {
            self.expand_contractions(&canonical)
        } else {
            canonical
        };

        // Step 5: strip punctuation, keep letters/digits/space/hyphen/apostrophe.
        let stripped: String = expanded
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '\'')
            .collect();

        // Step 6: collapse whitespace runs and trim.
        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn expand_contractions(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for (i, token) in text.split_whitespace().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            self.expand_token(token, &mut out);
        }
        out
    }

    fn expand_token(&self, token: &str, out: &mut String) {
        if let Some((_, expansion)) = IRREGULAR_CONTRACTIONS
            .iter()
            .find(|(form, _)| *form == token)
        {
            out.push_str(expansion);
            return;
        }

        for (suffix, expansion) in SUFFIX_CONTRACTIONS {
            if let Some(stem) = token.strip_suffix(suffix) {
                // A bare suffix ("'re" alone) has no stem to attach to.
                if !stem.is_empty() && !stem.ends_with('\'') {
                    out.push_str(stem);
                    out.push_str(expansion);
                    return;
                }
            }
        }

        if self.options.expand_possessive_s {
            if let Some(stem) = token.strip_suffix("'s") {
                if IS_CONTRACTION_STEMS.contains(stem) {
                    out.push_str(stem);
                    out.push_str(" is");
                    return;
                }
            }
        }

        out.push_str(token);
    }
}

/// Map quote and dash variants onto ASCII `'` and `-`.
fn canonicalize_char(c: char) -> char {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '`' | '\u{00B4}' | '\u{02BC}' => '\'',
        '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}' | '\u{2212}' => '-',
        other => other,
    }
}

/// Accent-insensitive view of an already-normalized string.
///
/// NFD decomposition followed by combining-mark removal: "café" -> "cafe",
/// "résumé" -> "resume". The corpus keeps both forms; this one never reaches
/// the user.
pub fn fold(normalized: &str) -> String {
    normalized
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// A phrase is anything with whitespace, or two-plus hyphen-joined
/// alphabetic parts ("avant-garde" counts, "x-23" does not).
pub fn is_phrase(normalized: &str) -> bool {
    if normalized.contains(' ') {
        return true;
    }
    normalized
        .split('-')
        .filter(|part| part.chars().any(char::is_alphabetic))
        .count()
        >= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str) -> String {
        Normalizer::default().normalize(raw, Language::En)
    }

    #[test]
    fn lowercases_and_collapses_whitespace() {
        assert_eq!(norm("  Hello   WORLD  "), "hello world");
    }

    #[test]
    fn preserves_diacritics() {
        assert_eq!(norm("Café"), "café");
        assert_eq!(
            Normalizer::default().normalize("RÉSUMÉ", Language::Fr),
            "résumé"
        );
    }

    #[test]
    fn fold_strips_diacritics() {
        assert_eq!(fold("café"), "cafe");
        assert_eq!(fold("résumé"), "resume");
        assert_eq!(fold("à la carte"), "a la carte");
    }

    #[test]
    fn strips_punctuation_keeps_hyphen_apostrophe_digits() {
        assert_eq!(norm("hello, world!"), "hello world");
        assert_eq!(norm("avant-garde."), "avant-garde");
        assert_eq!(norm("rock'n'roll"), "rock'n'roll");
        assert_eq!(norm("catch-22"), "catch-22");
    }

    #[test]
    fn expands_contractions() {
        assert_eq!(norm("don't"), "do not");
        assert_eq!(norm("won't"), "will not");
        assert_eq!(norm("can't"), "cannot");
        assert_eq!(norm("we're"), "we are");
        assert_eq!(norm("I'll"), "i will");
        assert_eq!(norm("it's"), "it is");
        // Possessive on an ordinary noun is left alone.
        assert_eq!(norm("the cat's whiskers"), "the cat's whiskers");
    }

    #[test]
    fn curly_apostrophes_canonicalized_before_expansion() {
        assert_eq!(norm("don\u{2019}t"), "do not");
    }

    #[test]
    fn contraction_expansion_skipped_for_french() {
        let n = Normalizer::default();
        assert_eq!(n.normalize("l'heure", Language::Fr), "l'heure");
    }

    #[test]
    fn possessive_s_flag_off() {
        let n = Normalizer::new(NormalizerOptions {
            expand_possessive_s: false,
        });
        assert_eq!(n.normalize("it's", Language::En), "it's");
    }

    #[test]
    fn dash_variants_become_hyphens() {
        assert_eq!(norm("en\u{2013}route"), "en-route");
    }

    #[test]
    fn empty_and_punctuation_only_collapse_to_empty() {
        assert_eq!(norm(""), "");
        assert_eq!(norm("..!?,,"), "");
        assert_eq!(norm("   "), "");
    }

    #[test]
    fn phrase_detection() {
        assert!(is_phrase("machine learning"));
        assert!(is_phrase("avant-garde"));
        assert!(is_phrase("state-of-the-art"));
        assert!(!is_phrase("hello"));
        assert!(!is_phrase("x-23"));
        assert!(!is_phrase(""));
    }
}
