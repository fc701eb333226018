//! Tests for verdict.rs

use approx::assert_relative_eq;
use mathtext_shared::verdict::ERROR_SENTINEL;
use mathtext_shared::{AnswerOutcome, IntentResult, Verdict, VerdictKind};

#[test]
fn test_canned_timeout_verdict() {
    let verdict = Verdict::timeout();
    assert_eq!(verdict.kind, VerdictKind::Timeout);
    assert_eq!(verdict.data, ERROR_SENTINEL);
    assert_eq!(verdict.confidence, 0.0);
    assert_eq!(verdict.intents.len(), 3);
}

#[test]
fn test_classifier_verdict_carries_ranking() {
    let ranked = vec![IntentResult::new("help", 0.82), IntentResult::new("stop", 0.1)];
    let verdict = Verdict::from_classifier(VerdictKind::Intent, "help", 0.82, &ranked);
    assert_relative_eq!(verdict.confidence, 0.82);
    assert_eq!(verdict.intents.len(), 2);
    assert_eq!(verdict.intents[0].kind, VerdictKind::Intent);
    assert_eq!(verdict.intents[1].data, "stop");
}

#[test]
fn test_outcome_mapping() {
    assert_eq!(
        Verdict::single_event(VerdictKind::CorrectAnswer, "1").outcome(),
        AnswerOutcome::Correct
    );
    assert_eq!(
        Verdict::single_event(VerdictKind::WrongAnswer, "2").outcome(),
        AnswerOutcome::Wrong
    );
    assert_eq!(Verdict::out_of_scope("hi").outcome(), AnswerOutcome::Other);
    assert_eq!(Verdict::error().outcome().as_str(), "other");
}

#[test]
fn test_wire_round_trip_keeps_type_names() {
    let verdict = Verdict::single_event(VerdictKind::Keyword, "menu");
    let json = verdict.to_json().unwrap();
    assert!(json.contains(r#""type":"keyword""#));
    let back: Verdict = serde_json::from_str(&json).unwrap();
    assert_eq!(back, verdict);
}
