// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The weighted-ratio family: partial, token-sort, and token-set ratios
//! composed with the classical WRatio weights.
//!
//! All ratios are indel-based: substitutions count as delete + insert, so
//! `ratio` is `2·LCS / (|a| + |b|)`. That makes "machine learning" vs
//! "learning machine" score high through the token-sort path while plain
//! edit distance would butcher it.
//!
//! # WRatio composition
//!
//! | Condition             | Candidates taken into the max                  |
//! |-----------------------|------------------------------------------------|
//! | length ratio < 1.5    | ratio, 0.95·token_sort, 0.95·token_set         |
//! | length ratio >= 1.5   | ratio, p·partial, 0.95·p·partial_token_{sort,set} |
//!
//! where `p` is 0.9, dropping to 0.6 once the lengths differ by more than
//! 8x. These are the well-known WRatio constants; changing them silently
//! changes every fuzzy score in the engine.

/// Unbase scale applied to token-reordered ratios.
const UNBASE_SCALE: f32 = 0.95;
/// Partial scale for moderately length-mismatched pairs.
const PARTIAL_SCALE: f32 = 0.9;
/// Partial scale once lengths differ by more than 8x.
const PARTIAL_SCALE_FAR: f32 = 0.6;

/// Longest common subsequence length over chars.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut dp = vec![0usize; b.len() + 1];
    for &ac in a {
        let mut prev = 0usize;
        for (j, &bc) in b.iter().enumerate() {
            let temp = dp[j + 1];
            dp[j + 1] = if ac == bc {
                prev + 1
            } else {
                dp[j + 1].max(dp[j])
            };
            prev = temp;
        }
    }
    dp[b.len()]
}

/// Indel similarity: `2·LCS / (|a| + |b|)`.
pub fn ratio(a: &str, b: &str) -> f32 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    ratio_chars(&a_chars, &b_chars)
}

fn ratio_chars(a: &[char], b: &[char]) -> f32 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * lcs_len(a, b) as f32 / total as f32
}

/// Best ratio of the shorter string against any same-length window of the
/// longer one.
pub fn partial_ratio(a: &str, b: &str) -> f32 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (shorter, longer) = if a_chars.len() <= b_chars.len() {
        (&a_chars, &b_chars)
    } else {
        (&b_chars, &a_chars)
    };

    if shorter.is_empty() {
        return 0.0;
    }
    if shorter.len() == longer.len() {
        return ratio_chars(shorter, longer);
    }

    let mut best = 0.0f32;
    for start in 0..=(longer.len() - shorter.len()) {
        let window = &longer[start..start + shorter.len()];
        let score = ratio_chars(shorter, window);
        if score > best {
            best = score;
        }
        if best >= 1.0 {
            break;
        }
    }
    best
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Ratio after sorting tokens alphabetically on both sides.
pub fn token_sort_ratio(a: &str, b: &str) -> f32 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

pub fn partial_token_sort_ratio(a: &str, b: &str) -> f32 {
    partial_ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Intersection/difference decomposition of the two token sets.
fn token_set_parts(a: &str, b: &str) -> (String, String, String) {
    let set_a: std::collections::BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: std::collections::BTreeSet<&str> = b.split_whitespace().collect();

    let inter: Vec<&str> = set_a.intersection(&set_b).copied().collect();
    let diff_a: Vec<&str> = set_a.difference(&set_b).copied().collect();
    let diff_b: Vec<&str> = set_b.difference(&set_a).copied().collect();

    let sect = inter.join(" ");
    let combined_a = join_nonempty(&sect, &diff_a.join(" "));
    let combined_b = join_nonempty(&sect, &diff_b.join(" "));
    (sect, combined_a, combined_b)
}

fn join_nonempty(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{a} {b}"),
    }
}

/// Token-set ratio: the shared-token core counts fully, extras cost little.
pub fn token_set_ratio(a: &str, b: &str) -> f32 {
    let (sect, combined_a, combined_b) = token_set_parts(a, b);
    ratio(&sect, &combined_a)
        .max(ratio(&sect, &combined_b))
        .max(ratio(&combined_a, &combined_b))
}

pub fn partial_token_set_ratio(a: &str, b: &str) -> f32 {
    let (sect, combined_a, combined_b) = token_set_parts(a, b);
    partial_ratio(&sect, &combined_a)
        .max(partial_ratio(&sect, &combined_b))
        .max(partial_ratio(&combined_a, &combined_b))
}

/// The weighted ratio: general-purpose composite, in [0, 1].
pub fn wratio(a: &str, b: &str) -> f32 {
    let la = a.chars().count();
    let lb = b.chars().count();
    if la == 0 || lb == 0 {
        return 0.0;
    }

    let base = ratio(a, b);
    let len_ratio = la.max(lb) as f32 / la.min(lb) as f32;

    if len_ratio < 1.5 {
        return base
            .max(token_sort_ratio(a, b) * UNBASE_SCALE)
            .max(token_set_ratio(a, b) * UNBASE_SCALE);
    }

    let partial_scale = if len_ratio > 8.0 {
        PARTIAL_SCALE_FAR
    } else {
        PARTIAL_SCALE
    };
    base.max(partial_ratio(a, b) * partial_scale)
        .max(partial_token_sort_ratio(a, b) * UNBASE_SCALE * partial_scale)
        .max(partial_token_set_ratio(a, b) * UNBASE_SCALE * partial_scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_basics() {
        assert_eq!(ratio("", ""), 1.0);
        assert_eq!(ratio("abc", "abc"), 1.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
        // lcs("enui","ennui") = 4 -> 8/9.
        assert!((ratio("enui", "ennui") - 8.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn partial_finds_substring() {
        assert_eq!(partial_ratio("en", "ennui"), 1.0);
        assert_eq!(partial_ratio("world", "hello world"), 1.0);
        assert!(partial_ratio("xyz", "hello") < 0.5);
    }

    #[test]
    fn token_sort_ignores_order() {
        assert_eq!(token_sort_ratio("machine learning", "learning machine"), 1.0);
        assert!(ratio("machine learning", "learning machine") < 1.0);
    }

    #[test]
    fn token_set_forgives_extras() {
        let score = token_set_ratio("new york", "new york city");
        assert_eq!(score, 1.0);
    }

    #[test]
    fn wratio_prefers_best_view() {
        // Same length: plain ratio path.
        assert_eq!(wratio("hello", "hello"), 1.0);
        // Reordered phrase goes through token_sort at 0.95.
        let reordered = wratio("machine learning", "learning machine");
        assert!((reordered - 0.95).abs() < 1e-6);
        // Big length gap: partial path, capped at 0.9.
        let partial = wratio("en", "enui");
        assert!((partial - 0.9).abs() < 1e-6);
    }

    #[test]
    fn wratio_empty_is_zero() {
        assert_eq!(wratio("", "anything"), 0.0);
    }
}
