//! Tests for tables.rs and the phrase extractors.

use mathtext_shared::phrase::{tokenize, PhraseAnswerExtractor};
use mathtext_shared::tables::{AnswerCategory, AnswerEquivalenceTable, KeywordTable};

#[test]
fn test_yes_class_spellings() {
    let table = AnswerEquivalenceTable::global();
    for spelling in ["y", "yeah", "ok", "sure", "1", "true", "yep"] {
        assert_eq!(table.lookup(spelling).map(|c| c.canonical), Some("yes"), "{}", spelling);
    }
    assert_eq!(table.lookup("nope").map(|c| c.canonical), Some("no"));
}

#[test]
fn test_class_satisfies_expected_answer() {
    let table = AnswerEquivalenceTable::global();
    let yes = table.class("yes").unwrap();
    assert!(yes.satisfies("yes"));
    assert!(yes.satisfies("true"));
    assert!(!yes.satisfies("no"));
    let lte = table.lookup("lte").unwrap();
    assert_eq!(lte.canonical, "<=");
    assert_eq!(lte.category, AnswerCategory::Comparison);
}

#[test]
fn test_weekday_display_literal() {
    let table = AnswerEquivalenceTable::global();
    assert_eq!(table.lookup("mon").map(|c| c.display), Some("Monday"));
    assert_eq!(table.lookup("thurs").map(|c| c.display), Some("Thursday"));
}

#[test]
fn test_keyword_misspellings() {
    let table = KeywordTable::global();
    assert_eq!(table.lookup("manu"), Some("menu"));
    assert_eq!(table.lookup("menus"), Some("menu"));
    assert_eq!(table.lookup("hints"), Some("hint"));
    assert_eq!(table.lookup("374"), None);
    assert!(table.canonical_keywords().contains(&"stop"));
}

#[test]
fn test_multiple_hits_in_order() {
    let extractor = PhraseAnswerExtractor::new();
    let tokens = tokenize("that'd be c");
    let hits = extractor.matched_classes(&tokens);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].display, "C");
}
