//! Name resolution against a catalog shaped like the live API's

use pinballmap_core::catalog::Machine;
use pinballmap_core::config::MatchingConfig;
use pinballmap_core::NameMatcher;
use pretty_assertions::assert_eq;
use serde_json::json;

fn catalog() -> Vec<Machine> {
    serde_json::from_value(json!([
        {"id": 10, "name": "Star Wars (Data East)", "manufacturer": "Data East", "year": 1992},
        {"id": 11, "name": "Star Wars (Pro)", "manufacturer": "Stern", "year": 2017},
        {"id": 12, "name": "Star Wars (Premium)", "manufacturer": "Stern", "year": 2017},
        {"id": 13, "name": "Star Wars", "manufacturer": "Stern", "year": 2017},
        {"id": 14, "name": "Star Trek: The Next Generation", "manufacturer": "Williams", "year": 1993},
        {"id": 15, "name": "Star Wars Episode I", "manufacturer": "Williams", "year": 1999},
        {"id": 16, "name": "The Addams Family", "manufacturer": "Bally", "year": 1992},
        {"id": 17, "name": "Twilight Zone", "manufacturer": "Bally", "year": 1993}
    ]))
    .unwrap()
}

#[test]
fn test_exact_title_wins_and_truncates() {
    let matcher = NameMatcher::default();
    let index = matcher.index(catalog());

    let hits = matcher.search("Star Wars", &index, 2);
    let ids: Vec<u64> = hits.iter().map(|hit| hit.item.id).collect();

    assert_eq!(hits[0].score, 150);
    assert_eq!(ids[0], 13);
    assert_eq!(hits.len(), 4);
}

#[test]
fn test_stop_words_do_not_block_a_match() {
    let matcher = NameMatcher::default();
    let index = matcher.index(catalog());

    let hits = matcher.search("addams family", &index, 2);
    assert_eq!(hits[0].item.name, "The Addams Family");
    assert_eq!(hits[0].score, 150);
}

#[test]
fn test_punctuation_is_ignored() {
    let matcher = NameMatcher::default();
    let index = matcher.index(catalog());

    let hits = matcher.search("star trek next generation", &index, 2);
    assert_eq!(hits[0].item.id, 14);
    assert_eq!(hits[0].score, 150);
}

#[test]
fn test_no_hit_below_threshold() {
    let matcher = NameMatcher::default();
    let index = matcher.index(catalog());

    let hits = matcher.search("twilight", &index, 20);
    assert!(hits.iter().all(|hit| hit.score >= 20));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].item.id, 17);
}

#[test]
fn test_matcher_from_config_honours_custom_lists() {
    let config = MatchingConfig {
        stop_words: vec!["episode".to_string()],
        model_endings: vec![],
        min_score: 2,
    };
    let matcher = config.matcher();
    let index = matcher.index(catalog());

    // "Star Wars Episode I" canonicalizes to "star wars i"
    let hits = matcher.search("Star Wars I", &index, config.min_score);
    assert_eq!(hits[0].item.id, 15);
    assert_eq!(hits[0].score, 150);
}
