//! End-to-end query scenarios over the reference corpus.

mod common;

use common::fixture_engine;
use glossa::{MethodSelection, SearchMethod, SearchOptions, SearchResult};

fn auto() -> SearchOptions {
    SearchOptions::default()
}

fn assert_ranked(results: &[SearchResult], engine: &glossa::SearchEngine) {
    let corpus = engine.corpus();
    for pair in results.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let freq = |r: &SearchResult| corpus.entry(r.index).frequency;
        assert!(
            a.score > b.score
                || (a.score == b.score && freq(a) > freq(b))
                || (a.score == b.score && freq(a) == freq(b) && a.index < b.index),
            "ranking violated between {:?} and {:?}",
            a.text,
            b.text
        );
    }
}

#[test]
fn exact_query_wins_with_full_score() {
    let engine = fixture_engine();
    let results = engine.search("ennui", &auto()).unwrap();
    assert!(!results.is_empty());
    assert_eq!(results[0].text, "ennui");
    assert_eq!(results[0].method, SearchMethod::Exact);
    assert_eq!(results[0].score, 1.0);
    assert_ranked(&results, &engine);
}

#[test]
fn typo_recovers_through_fuzzy() {
    let engine = fixture_engine();
    let results = engine.search("enui", &auto()).unwrap();
    assert!(!results.is_empty());
    assert_eq!(results[0].text, "ennui");
    assert_eq!(results[0].method, SearchMethod::Fuzzy);
    assert!(results[0].score >= 0.75, "score {}", results[0].score);
    // Length correction keeps short near-misses below the real word.
    for r in &results[1..] {
        assert!(r.score <= results[0].score);
        assert!(r.text.chars().count() > 2, "short candidate outranked: {:?}", r.text);
    }
    assert_ranked(&results, &engine);
}

#[test]
fn phrase_typo_gets_alignment_bonus() {
    let engine = fixture_engine();
    let results = engine.search("en coulise", &auto()).unwrap();
    assert!(!results.is_empty());
    assert_eq!(results[0].text, "en coulisse");
    assert_eq!(results[0].method, SearchMethod::Fuzzy);
    assert!(results[0].score >= 0.80, "score {}", results[0].score);
    assert!(results[0].is_phrase);
    assert_ranked(&results, &engine);
}

#[test]
fn short_query_autocompletes() {
    let engine = fixture_engine();
    let results = engine.search("hel", &auto()).unwrap();
    let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
    for expected in ["hello", "help", "helpful"] {
        assert!(texts.contains(&expected), "{expected} missing from {texts:?}");
    }
    for r in &results {
        assert_eq!(r.method, SearchMethod::Prefix);
        assert!(r.score >= 0.75);
    }
    assert_ranked(&results, &engine);
}

#[test]
fn accents_survive_the_roundtrip() {
    let engine = fixture_engine();
    let results = engine.search("cafe", &auto()).unwrap();
    assert!(!results.is_empty());
    assert_eq!(results[0].text, "café", "diacritics must surface intact");
    assert_eq!(results[0].method, SearchMethod::Fuzzy);
    assert_eq!(results[0].meta.edit_distance, Some(0));
}

#[test]
fn empty_query_is_empty() {
    let engine = fixture_engine();
    assert!(engine.search("", &auto()).unwrap().is_empty());
    assert!(engine.search("   ", &auto()).unwrap().is_empty());
    assert!(engine.search("?!.", &auto()).unwrap().is_empty());
}

#[test]
fn exact_results_always_score_one() {
    let engine = fixture_engine();
    for (text, _) in common::FIXTURE {
        let results = engine.search(text, &auto()).unwrap();
        for r in &results {
            if r.method == SearchMethod::Exact {
                assert_eq!(r.score, 1.0, "exact hit for {text:?}");
            }
        }
    }
}

#[test]
fn solo_method_agrees_with_auto() {
    let engine = fixture_engine();
    let solo = engine
        .search(
            "enui",
            &SearchOptions {
                methods: MethodSelection::Only(vec![SearchMethod::Fuzzy]),
                ..auto()
            },
        )
        .unwrap();
    let combined = engine.search("enui", &auto()).unwrap();

    // The fuzzy method's internal ordering survives the merge: results the
    // solo run produced appear in the same relative order in the combined
    // run (for this query no other method finds anything to upgrade them).
    let combined_order: Vec<u32> = combined.iter().map(|r| r.index).collect();
    let solo_order: Vec<u32> = solo
        .iter()
        .map(|r| r.index)
        .filter(|i| combined_order.contains(i))
        .collect();
    let filtered: Vec<u32> = combined_order
        .iter()
        .copied()
        .filter(|i| solo_order.contains(i))
        .collect();
    assert_eq!(solo_order, filtered);
    assert_eq!(solo[0].index, combined[0].index);
}

#[test]
fn explicit_method_selection_is_honored() {
    let engine = fixture_engine();
    let results = engine
        .search(
            "hello",
            &SearchOptions {
                methods: MethodSelection::Only(vec![SearchMethod::Semantic]),
                min_score: 0.1,
                ..auto()
            },
        )
        .unwrap();
    assert!(results.iter().all(|r| r.method == SearchMethod::Semantic));
}

#[test]
fn losing_methods_retained_in_metadata() {
    let engine = fixture_engine();
    // "coulisse" exactly: exact wins, fuzzy also finds it.
    let results = engine.search("coulisse", &auto()).unwrap();
    let top = &results[0];
    assert_eq!(top.method, SearchMethod::Exact);
    assert!(
        top.meta
            .also_found
            .iter()
            .any(|(m, _)| *m == SearchMethod::Fuzzy),
        "fuzzy should have lost the dedup for {:?}",
        top.meta.also_found
    );
}

#[test]
fn max_results_caps_output() {
    let engine = fixture_engine();
    let results = engine
        .search(
            "en",
            &SearchOptions {
                max_results: 2,
                min_score: 0.0,
                ..auto()
            },
        )
        .unwrap();
    assert!(results.len() <= 2);
}

#[test]
fn nonsense_threshold_is_a_query_error() {
    let engine = fixture_engine();
    let bad = SearchOptions {
        min_score: 2.0,
        ..auto()
    };
    assert!(engine.search("hello", &bad).is_err());
}

#[test]
fn stats_accumulate_across_queries() {
    let engine = fixture_engine();
    engine.search("hello", &auto()).unwrap();
    engine.search("enui", &auto()).unwrap();
    engine.search("hel", &auto()).unwrap();
    let stats = engine.stats();
    assert_eq!(stats.searches, 3);
    assert_eq!(stats.corpus_len, common::FIXTURE.len());
    assert!(stats.method(SearchMethod::Exact).invocations >= 2);
    assert!(stats.method(SearchMethod::Prefix).invocations >= 1);
    assert!(stats.method(SearchMethod::Fuzzy).invocations >= 2);
}
