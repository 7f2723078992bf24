// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Phonetic codes: Soundex and a compact Metaphone.
//!
//! Phonetic matching is a fallback, not a primary scorer. Code equality
//! alone says "sounds alike", which lumps "robert" with "rupert"; the fuzzy
//! layer therefore ranks equal-code candidates by plain string similarity.
//! Both codes are ASCII-oriented, so callers pass the folded form.

/// Four-character Soundex code, "0000" for inputs with no letters.
pub fn soundex(word: &str) -> String {
    let mut chars = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase());

    let Some(first) = chars.next() else {
        return "0000".to_string();
    };

    let mut code = String::with_capacity(4);
    code.push(first);
    let mut last_digit = soundex_digit(first);

    for c in chars {
        let digit = soundex_digit(c);
        match digit {
            Some(d) => {
                if last_digit != Some(d) {
                    code.push(d);
                    if code.len() == 4 {
                        break;
                    }
                }
                last_digit = Some(d);
            }
            None => {
                // H and W are transparent to the duplicate rule; vowels reset it.
                if !matches!(c, 'H' | 'W') {
                    last_digit = None;
                }
            }
        }
    }

    while code.len() < 4 {
        code.push('0');
    }
    code
}

fn soundex_digit(c: char) -> Option<char> {
    match c {
        'B' | 'F' | 'P' | 'V' => Some('1'),
        'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => Some('2'),
        'D' | 'T' => Some('3'),
        'L' => Some('4'),
        'M' | 'N' => Some('5'),
        'R' => Some('6'),
        _ => None,
    }
}

/// Compact Metaphone code, capped at 8 characters. Empty for inputs with no
/// letters.
pub fn metaphone(word: &str) -> String {
    let chars: Vec<char> = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let mut code = String::new();
    let mut i = 0usize;

    while i < chars.len() && code.len() < 8 {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        match c {
            'A' | 'E' | 'I' | 'O' | 'U' => {
                if i == 0 {
                    code.push(c);
                }
            }
            'B' => code.push('B'),
            'C' => {
                if matches!(next, Some('H') | Some('I')) {
                    code.push('X');
                } else {
                    code.push('K');
                }
            }
            'D' | 'T' => code.push('T'),
            'F' | 'V' => code.push('F'),
            'G' | 'H' => code.push('G'),
            'J' | 'Y' => code.push('J'),
            'K' | 'Q' => code.push('K'),
            'L' => code.push('L'),
            'M' | 'N' => code.push('M'),
            'P' => {
                if next == Some('H') {
                    code.push('F');
                    i += 1;
                } else {
                    code.push('P');
                }
            }
            'R' => code.push('R'),
            'S' | 'Z' => code.push('S'),
            'W' => {
                if matches!(next, Some('A' | 'E' | 'I' | 'O' | 'U')) {
                    code.push('W');
                }
            }
            'X' => code.push_str("KS"),
            _ => {}
        }
        i += 1;
    }

    code.truncate(8);
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soundex_classics() {
        assert_eq!(soundex("robert"), "R163");
        assert_eq!(soundex("rupert"), "R163");
        assert_eq!(soundex("ashcraft"), "A261");
        assert_eq!(soundex("tymczak"), "T522");
        assert_eq!(soundex("pfister"), "P236");
    }

    #[test]
    fn soundex_empty_and_nonletters() {
        assert_eq!(soundex(""), "0000");
        assert_eq!(soundex("123"), "0000");
    }

    #[test]
    fn metaphone_groups_sound_alikes() {
        assert_eq!(metaphone("phone"), metaphone("fone"));
        assert_eq!(metaphone("cat"), metaphone("kat"));
        assert_ne!(metaphone("cat"), metaphone("dog"));
    }

    #[test]
    fn metaphone_empty() {
        assert_eq!(metaphone(""), "");
        assert_eq!(metaphone("42"), "");
    }

    #[test]
    fn metaphone_caps_length() {
        assert!(metaphone("antidisestablishmentarianism").len() <= 8);
    }
}
