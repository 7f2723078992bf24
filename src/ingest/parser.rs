// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Per-format payload parsers.
//!
//! Each parser turns raw bytes into a stream of `(text, frequency?, idiom?)`
//! tuples and nothing more - normalization and filtering happen later, once,
//! in the corpus builder. Malformed *lines* are skipped silently (frequency
//! lists in the wild are full of them); a malformed *payload* (invalid
//! UTF-8, broken JSON) is a [`Error::Parse`] and the source is dropped.

use crate::error::{Error, Result};
use crate::ingest::source::{SourceDescriptor, SourceFormat};
use serde_json::Value;

/// One parsed item, pre-normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawItem {
    pub text: String,
    pub frequency: Option<f32>,
    /// Set when the format itself knows (e.g. idiom collections); `None`
    /// defers to the source descriptor's default.
    pub is_idiom: Option<bool>,
}

impl RawItem {
    fn plain(text: impl Into<String>) -> Self {
        RawItem {
            text: text.into(),
            frequency: None,
            is_idiom: None,
        }
    }
}

/// Parse a payload according to the source's format selector.
pub fn parse(source: &SourceDescriptor, payload: &[u8]) -> Result<Vec<RawItem>> {
    let text = std::str::from_utf8(payload).map_err(|e| Error::Parse {
        source_name: source.name.clone(),
        reason: format!("payload is not UTF-8: {e}"),
    })?;

    match source.format {
        SourceFormat::TextLines => Ok(parse_text_lines(text)),
        SourceFormat::FrequencyList => Ok(parse_frequency_list(text)),
        SourceFormat::JsonIdioms => parse_json_idioms(&source.name, text),
        SourceFormat::JsonDict => parse_json_dict(&source.name, text),
        SourceFormat::JsonArray => parse_json_array(&source.name, text),
        SourceFormat::CsvIdioms => Ok(parse_csv_idioms(text)),
        SourceFormat::Diceware => Ok(parse_diceware(text)),
    }
}

fn parse_text_lines(text: &str) -> Vec<RawItem> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(RawItem::plain)
        .collect()
}

fn parse_frequency_list(text: &str) -> Vec<RawItem> {
    text.lines()
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            let word = tokens.next()?;
            let frequency: f32 = tokens.next()?.parse().ok()?;
            Some(RawItem {
                text: word.to_string(),
                frequency: Some(frequency),
                is_idiom: None,
            })
        })
        .collect()
}

fn json_value(source: &str, text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| Error::Parse {
        source_name: source.to_string(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Accepts a bare array, or an object with the array under `"idioms"`.
/// Array items may be strings or objects carrying `idiom`/`phrase`/`text`.
fn parse_json_idioms(source: &str, text: &str) -> Result<Vec<RawItem>> {
    let value = json_value(source, text)?;
    let array = match &value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => map
            .get("idioms")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::Parse {
                source_name: source.to_string(),
                reason: "expected an array or an object with an 'idioms' array".to_string(),
            })?,
        _ => {
            return Err(Error::Parse {
                source_name: source.to_string(),
                reason: "expected a JSON array or object".to_string(),
            })
        }
    };

    Ok(array
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => ["idiom", "phrase", "text"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str).map(String::from)),
            _ => None,
        })
        .map(|text| RawItem {
            text,
            frequency: None,
            is_idiom: Some(true),
        })
        .collect())
}

fn parse_json_dict(source: &str, text: &str) -> Result<Vec<RawItem>> {
    match json_value(source, text)? {
        Value::Object(map) => Ok(map.keys().cloned().map(RawItem::plain).collect()),
        _ => Err(Error::Parse {
            source_name: source.to_string(),
            reason: "expected a JSON object".to_string(),
        }),
    }
}

fn parse_json_array(source: &str, text: &str) -> Result<Vec<RawItem>> {
    match json_value(source, text)? {
        Value::Array(items) => Ok(items
            .iter()
            .filter_map(Value::as_str)
            .map(RawItem::plain)
            .collect()),
        _ => Err(Error::Parse {
            source_name: source.to_string(),
            reason: "expected a JSON array".to_string(),
        }),
    }
}

/// First comma-separated field is the idiom; a leading `idiom,...` header
/// row is skipped.
fn parse_csv_idioms(text: &str) -> Vec<RawItem> {
    text.lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let field = line.split(',').next()?.trim().trim_matches('"');
            if field.is_empty() || (i == 0 && field.eq_ignore_ascii_case("idiom")) {
                return None;
            }
            Some(RawItem {
                text: field.to_string(),
                frequency: None,
                is_idiom: Some(true),
            })
        })
        .collect()
}

/// `NNNNN word` pairs; the dice roll is discarded.
fn parse_diceware(text: &str) -> Vec<RawItem> {
    text.lines()
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            let roll = tokens.next()?;
            if !roll.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            tokens.next().map(RawItem::plain)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Language;

    fn descriptor(format: SourceFormat) -> SourceDescriptor {
        SourceDescriptor::new("test", "file:///dev/null", format, Language::En)
    }

    #[test]
    fn text_lines_skip_comments_and_blanks() {
        let items = parse(
            &descriptor(SourceFormat::TextLines),
            b"hello\n# comment\n\n  world  \n",
        )
        .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text, "hello");
        assert_eq!(items[1].text, "world");
    }

    #[test]
    fn frequency_list_parses_pairs_and_skips_garbage() {
        let items = parse(
            &descriptor(SourceFormat::FrequencyList),
            b"the 22038615\nof 12545825 extra columns ignored\nbareword\nbad notanumber\n",
        )
        .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text, "the");
        assert_eq!(items[0].frequency, Some(22_038_615.0));
        assert_eq!(items[1].text, "of");
    }

    #[test]
    fn json_idioms_accepts_all_three_shapes() {
        let bare = br#"["kick the bucket", "hit the sack"]"#;
        let wrapped = br#"{"idioms": ["kick the bucket"]}"#;
        let objects = br#"[{"idiom": "kick the bucket"}, {"phrase": "hit the sack"}, {"junk": 1}]"#;

        let d = descriptor(SourceFormat::JsonIdioms);
        assert_eq!(parse(&d, bare).unwrap().len(), 2);
        assert_eq!(parse(&d, wrapped).unwrap().len(), 1);
        let parsed = parse(&d, objects).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].is_idiom, Some(true));
    }

    #[test]
    fn json_dict_takes_keys() {
        let items = parse(
            &descriptor(SourceFormat::JsonDict),
            br#"{"hello": 1, "world": {"anything": true}}"#,
        )
        .unwrap();
        let mut texts: Vec<&str> = items.iter().map(|i| i.text.as_str()).collect();
        texts.sort_unstable();
        assert_eq!(texts, vec!["hello", "world"]);
    }

    #[test]
    fn json_array_of_strings() {
        let items = parse(&descriptor(SourceFormat::JsonArray), br#"["a b", "c"]"#).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn csv_idioms_skips_header() {
        let items = parse(
            &descriptor(SourceFormat::CsvIdioms),
            b"idiom,definition\n\"break a leg\",good luck\nburn the midnight oil,work late\n",
        )
        .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text, "break a leg");
        assert_eq!(items[1].text, "burn the midnight oil");
    }

    #[test]
    fn diceware_drops_rolls() {
        let items = parse(
            &descriptor(SourceFormat::Diceware),
            b"11111 abacus\n11112 abdomen\nnot-a-roll word\n",
        )
        .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text, "abacus");
    }

    #[test]
    fn broken_json_is_a_parse_error() {
        let err = parse(&descriptor(SourceFormat::JsonArray), b"[not json").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let err = parse(&descriptor(SourceFormat::TextLines), &[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }
}
