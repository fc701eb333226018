//! Tests for normalize.rs

use mathtext_shared::normalize::{compact, normalize_message, normalize_text, MAX_MESSAGE_CHARS};
use mathtext_shared::NormalizedPair;

#[test]
fn test_normalize_trims_lowercases_and_drops_separator() {
    assert_eq!(normalize_text("  5,000 Apples "), "5000 apples");
}

#[test]
fn test_normalize_is_idempotent() {
    let spaced = "x ".repeat(80);
    let over_limit = format!("{} tail", "a".repeat(99));
    let samples: [&str; 8] = [
        "  Hello, World  ",
        "1,234",
        " ,5",
        "5 ,",
        "MAYBE 2000",
        "No 😕",
        &spaced,
        &over_limit,
    ];
    for sample in samples {
        let once = normalize_message(sample, MAX_MESSAGE_CHARS);
        let twice = normalize_message(&once, MAX_MESSAGE_CHARS);
        assert_eq!(once, twice, "not idempotent for {:?}", sample);
    }
}

#[test]
fn test_message_truncated_answer_not() {
    let long = "9".repeat(150);
    let pair = NormalizedPair::new(&long, &long, MAX_MESSAGE_CHARS);
    assert_eq!(pair.message.len(), MAX_MESSAGE_CHARS);
    assert_eq!(pair.answer.len(), 150);
}

#[test]
fn test_compact_removes_inner_whitespace() {
    assert_eq!(compact("17 : 03"), "17:03");
    let pair = NormalizedPair::new("4 . 4", "4.4", MAX_MESSAGE_CHARS);
    assert_eq!(pair.compact_message(), pair.compact_answer());
}
