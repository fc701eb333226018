//! Verdict types and the wire shape returned to callers.
//!
//! Every evaluation ends in exactly one `Verdict`. The constructors here are
//! the only place the wire format is assembled, including the legacy quirk of
//! duplicating a rule verdict three times into `intents`.

use serde::{Deserialize, Serialize};

/// Data carried by canned timeout and error verdicts.
/// Only ever emitted on the wire; internally "no result" is `None`.
pub const ERROR_SENTINEL: &str = "32202";

/// Confidence attached to verdicts decided by a rule stage.
pub const RULE_CONFIDENCE: f64 = 1.0;

/// Number of copies of a rule verdict placed in `intents`.
const LEGACY_INTENT_COPIES: usize = 3;

/// Raw request as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub student_message: String,
    pub expected_answer: String,
}

impl EvaluationRequest {
    pub fn new(student_message: impl Into<String>, expected_answer: impl Into<String>) -> Self {
        Self {
            student_message: student_message.into(),
            expected_answer: expected_answer.into(),
        }
    }
}

/// Closed set of verdict types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictKind {
    CorrectAnswer,
    WrongAnswer,
    Keyword,
    Intent,
    Comparison,
    OutOfScope,
    Error,
    Timeout,
}

impl VerdictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CorrectAnswer => "correct_answer",
            Self::WrongAnswer => "wrong_answer",
            Self::Keyword => "keyword",
            Self::Intent => "intent",
            Self::Comparison => "comparison",
            Self::OutOfScope => "out_of_scope",
            Self::Error => "error",
            Self::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One classifier label with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub label: String,
    pub confidence: f64,
}

impl IntentResult {
    /// Confidence is clamped into [0, 1]; NaN becomes 0.
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence: clamp_confidence(confidence),
        }
    }
}

/// Entry of the `intents` list on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictEntry {
    #[serde(rename = "type")]
    pub kind: VerdictKind,
    pub data: String,
    pub confidence: f64,
}

impl From<&IntentResult> for VerdictEntry {
    fn from(intent: &IntentResult) -> Self {
        Self {
            kind: VerdictKind::Intent,
            data: intent.label.clone(),
            confidence: intent.confidence,
        }
    }
}

/// Outcome contributed to the external mastery estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    Correct,
    Wrong,
    Other,
}

impl AnswerOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correct => "correct_answer",
            Self::Wrong => "wrong_answer",
            Self::Other => "other",
        }
    }
}

/// Structured outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(rename = "type")]
    pub kind: VerdictKind,
    pub data: String,
    pub confidence: f64,
    pub intents: Vec<VerdictEntry>,
}

impl Verdict {
    /// Rule verdict at full confidence, duplicated into `intents`.
    pub fn single_event(kind: VerdictKind, data: impl Into<String>) -> Self {
        Self::single_event_with_confidence(kind, data, RULE_CONFIDENCE)
    }

    pub fn single_event_with_confidence(
        kind: VerdictKind,
        data: impl Into<String>,
        confidence: f64,
    ) -> Self {
        let data = data.into();
        let confidence = clamp_confidence(confidence);
        let entry = VerdictEntry {
            kind,
            data: data.clone(),
            confidence,
        };
        Self {
            kind,
            data,
            confidence,
            intents: vec![entry; LEGACY_INTENT_COPIES],
        }
    }

    /// Verdict decided from classifier output; `intents` carries the ranking.
    pub fn from_classifier(
        kind: VerdictKind,
        data: impl Into<String>,
        confidence: f64,
        ranked: &[IntentResult],
    ) -> Self {
        Self {
            kind,
            data: data.into(),
            confidence: clamp_confidence(confidence),
            intents: ranked.iter().map(VerdictEntry::from).collect(),
        }
    }

    /// Default when every stage abstained. Echoes the original message.
    pub fn out_of_scope(original_message: impl Into<String>) -> Self {
        Self {
            kind: VerdictKind::OutOfScope,
            data: original_message.into(),
            confidence: 0.0,
            intents: Vec::new(),
        }
    }

    /// Canned verdict when the evaluation budget elapses.
    pub fn timeout() -> Self {
        Self::single_event_with_confidence(VerdictKind::Timeout, ERROR_SENTINEL, 0.0)
    }

    /// Canned verdict from the last-resort handler.
    pub fn error() -> Self {
        Self::single_event_with_confidence(VerdictKind::Error, ERROR_SENTINEL, 0.0)
    }

    pub fn is_answer(&self) -> bool {
        matches!(self.kind, VerdictKind::CorrectAnswer | VerdictKind::WrongAnswer)
    }

    pub fn outcome(&self) -> AnswerOutcome {
        match self.kind {
            VerdictKind::CorrectAnswer => AnswerOutcome::Correct,
            VerdictKind::WrongAnswer => AnswerOutcome::Wrong,
            _ => AnswerOutcome::Other,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
