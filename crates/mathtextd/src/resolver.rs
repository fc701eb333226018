//! Post-classification resolvers.
//!
//! Applied in order once the rule cascade has abstained:
//! 1. numeric answer extraction when the classifier says `math_answer`
//! 2. yes/no resolution for yes/no questions
//! 3. approved navigational intents
//!
//! Pure functions over the ranked classifier output.

use mathtext_shared::numbers::{first_number_in, parse_canonical_number};
use mathtext_shared::{IntentResult, NormalizedPair, Verdict, VerdictKind};

pub const MATH_ANSWER_LABEL: &str = "math_answer";
pub const YES_LABEL: &str = "yes";
pub const OUT_OF_SCOPE_LABEL: &str = "out_of_scope";

/// Thresholds and the approved label set.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Inclusive: `math_answer` must reach this
    pub answer_intent_threshold: f64,
    /// Exclusive: yes/approved labels must exceed this
    pub approved_intent_threshold: f64,
    pub approved_intents: Vec<String>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            answer_intent_threshold: 0.5,
            approved_intent_threshold: 0.5,
            approved_intents: [
                "change_topic",
                "help",
                "stop",
                "math_question",
                "math_answer",
                "break",
                "safety",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// True when any `math_answer` label reaches the threshold.
pub fn is_answer_attempt(ranked: &[IntentResult], threshold: f64) -> bool {
    ranked
        .iter()
        .any(|i| i.label == MATH_ANSWER_LABEL && i.confidence >= threshold)
}

/// First number in the message, judged against the expected answer.
pub fn resolve_numeric_answer(pair: &NormalizedPair, expected_literal: &str) -> Option<Verdict> {
    let found = first_number_in(&pair.message)?;
    let correct = found.display() == pair.answer
        || parse_canonical_number(&pair.answer)
            .map_or(false, |expected| found.numerically_equals(&expected));
    Some(if correct {
        Verdict::single_event(VerdictKind::CorrectAnswer, expected_literal)
    } else {
        Verdict::single_event(VerdictKind::WrongAnswer, found.display())
    })
}

/// For yes/no questions: a confident "yes" label answers them.
pub fn resolve_yes_no(
    ranked: &[IntentResult],
    normalized_answer: &str,
    threshold: f64,
) -> Option<Verdict> {
    let kind = match normalized_answer {
        "yes" => VerdictKind::CorrectAnswer,
        "no" => VerdictKind::WrongAnswer,
        _ => return None,
    };
    ranked
        .iter()
        .find(|i| i.label == YES_LABEL && i.confidence > threshold)
        .map(|yes| Verdict::from_classifier(kind, YES_LABEL, yes.confidence, ranked))
}

/// Top label, if it is approved and confident enough.
pub fn resolve_approved_intent(
    ranked: &[IntentResult],
    approved: &[String],
    threshold: f64,
) -> Option<Verdict> {
    let top = ranked
        .iter()
        .reduce(|best, i| if i.confidence > best.confidence { i } else { best })?;
    if top.label == OUT_OF_SCOPE_LABEL
        || top.confidence <= threshold
        || !approved.iter().any(|a| *a == top.label)
    {
        return None;
    }
    Some(Verdict::from_classifier(
        VerdictKind::Intent,
        top.label.clone(),
        top.confidence,
        ranked,
    ))
}

/// Runs the resolvers in order; `None` means fall through to the default.
pub fn resolve(
    ranked: &[IntentResult],
    pair: &NormalizedPair,
    expected_literal: &str,
    settings: &ResolverSettings,
) -> Option<Verdict> {
    if is_answer_attempt(ranked, settings.answer_intent_threshold) {
        if let Some(verdict) = resolve_numeric_answer(pair, expected_literal) {
            return Some(verdict);
        }
    }
    resolve_yes_no(ranked, &pair.answer, settings.approved_intent_threshold).or_else(|| {
        resolve_approved_intent(
            ranked,
            &settings.approved_intents,
            settings.approved_intent_threshold,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundaries() {
        let ranked = vec![IntentResult::new("math_answer", 0.5)];
        assert!(is_answer_attempt(&ranked, 0.5));
        let approved = vec!["math_answer".to_string()];
        assert!(resolve_approved_intent(&ranked, &approved, 0.5).is_none());
    }

    #[test]
    fn test_out_of_scope_label_never_approved() {
        let ranked = vec![IntentResult::new("out_of_scope", 0.99)];
        let approved = vec!["out_of_scope".to_string()];
        assert!(resolve_approved_intent(&ranked, &approved, 0.5).is_none());
    }
}
