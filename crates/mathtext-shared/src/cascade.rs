//! Rule cascade: an ordered list of matchers with short-circuit semantics.
//!
//! Ordering is data (`StageKind` list), so alternate cascades are a config
//! change. A matcher that fails is logged and treated as abstaining.
//!
//! The cascade itself never calls the intent classifier. A matcher that
//! needs it returns `MatchOutcome::NeedsAnswerIntent` and the async caller
//! decides.

use crate::error::NluError;
use crate::matchers::{CanonicalNumberExtractor, ExactMatcher, RegexNumericExtractor};
use crate::normalize::NormalizedPair;
use crate::phrase::{PhraseAnswerExtractor, PhraseKeywordExtractor};
use crate::safety::SafetyGate;
use crate::verdict::{EvaluationRequest, Verdict, VerdictKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, warn};

/// Everything a matcher may look at for one request.
#[derive(Debug, Clone, Copy)]
pub struct MatchInput<'a> {
    pub request: &'a EvaluationRequest,
    pub pair: &'a NormalizedPair,
}

impl<'a> MatchInput<'a> {
    pub fn new(request: &'a EvaluationRequest, pair: &'a NormalizedPair) -> Self {
        Self { request, pair }
    }

    /// Original, non-normalized expected answer (echoed in verdicts).
    pub fn expected_literal(&self) -> &'a str {
        &self.request.expected_answer
    }
}

/// Result of one matcher attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Decided(Verdict),
    Abstain,
    /// An answer-shaped literal that is not the expected answer. Becomes
    /// `wrong_answer` only if the classifier confirms a math answer attempt.
    NeedsAnswerIntent { literal: String },
}

impl MatchOutcome {
    pub fn is_decided(&self) -> bool {
        matches!(self, Self::Decided(_))
    }
}

/// Common capability of every rule stage.
pub trait Matcher: Send + Sync {
    fn name(&self) -> &'static str;

    fn attempt(&self, input: &MatchInput<'_>) -> Result<MatchOutcome, NluError>;

    /// Stages that run even when the message is too long for rule matching.
    fn bypasses_length_gate(&self) -> bool {
        false
    }
}

/// Runs one matcher; failures are logged and become `Abstain`.
pub fn attempt_guarded(matcher: &dyn Matcher, input: &MatchInput<'_>) -> MatchOutcome {
    match matcher.attempt(input) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(stage = matcher.name(), code = e.code(), "Matcher failed, abstaining: {}", e);
            MatchOutcome::Abstain
        }
    }
}

/// Rule stage names, as used in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Safety,
    Exact,
    PhraseAnswer,
    PhraseKeyword,
    RegexNumeric,
    CanonicalNumber,
}

impl StageKind {
    pub fn default_order() -> Vec<StageKind> {
        vec![
            StageKind::Safety,
            StageKind::Exact,
            StageKind::PhraseAnswer,
            StageKind::PhraseKeyword,
            StageKind::RegexNumeric,
            StageKind::CanonicalNumber,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safety => "safety",
            Self::Exact => "exact",
            Self::PhraseAnswer => "phrase_answer",
            Self::PhraseKeyword => "phrase_keyword",
            Self::RegexNumeric => "regex_numeric",
            Self::CanonicalNumber => "canonical_number",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "safety" => Ok(Self::Safety),
            "exact" => Ok(Self::Exact),
            "phrase_answer" => Ok(Self::PhraseAnswer),
            "phrase_keyword" => Ok(Self::PhraseKeyword),
            "regex_numeric" => Ok(Self::RegexNumeric),
            "canonical_number" => Ok(Self::CanonicalNumber),
            other => Err(format!("unknown stage: {}", other)),
        }
    }
}

/// Ordered matchers. Built once, shared read-only across requests.
pub struct RuleCascade {
    matchers: Vec<Box<dyn Matcher>>,
}

impl RuleCascade {
    /// Standard order with the built-in safety lists.
    pub fn standard() -> Self {
        Self::from_stages(&StageKind::default_order(), SafetyGate::new())
    }

    /// Builds matchers in the given order. Duplicate stages are kept once.
    pub fn from_stages(stages: &[StageKind], safety: SafetyGate) -> Self {
        let mut seen = Vec::new();
        let mut matchers: Vec<Box<dyn Matcher>> = Vec::with_capacity(stages.len());
        for stage in stages {
            if seen.contains(stage) {
                warn!(stage = %stage, "Duplicate cascade stage ignored");
                continue;
            }
            seen.push(*stage);
            let matcher: Box<dyn Matcher> = match stage {
                StageKind::Safety => Box::new(safety.clone()),
                StageKind::Exact => Box::new(ExactMatcher),
                StageKind::PhraseAnswer => Box::new(PhraseAnswerExtractor::new()),
                StageKind::PhraseKeyword => Box::new(PhraseKeywordExtractor::new()),
                StageKind::RegexNumeric => Box::new(RegexNumericExtractor),
                StageKind::CanonicalNumber => Box::new(CanonicalNumberExtractor),
            };
            matchers.push(matcher);
        }
        Self { matchers }
    }

    /// Cascade over caller-supplied matchers, run in the given order.
    pub fn from_matchers(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }

    pub fn matchers(&self) -> &[Box<dyn Matcher>] {
        &self.matchers
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }

    /// Classifier-free evaluation: deferred answer checks abstain and the
    /// default is `out_of_scope`. Used for offline runs.
    pub fn run_offline(&self, input: &MatchInput<'_>, rules_enabled: bool) -> Verdict {
        for matcher in &self.matchers {
            let matcher: &dyn Matcher = matcher.as_ref();
            if !rules_enabled && !matcher.bypasses_length_gate() {
                continue;
            }
            match attempt_guarded(matcher, input) {
                MatchOutcome::Decided(verdict) => {
                    debug!(stage = matcher.name(), kind = %verdict.kind, "Rule stage decided");
                    return verdict;
                }
                MatchOutcome::NeedsAnswerIntent { literal } => {
                    debug!(stage = matcher.name(), literal = %literal, "Deferred answer check skipped offline");
                }
                MatchOutcome::Abstain => {}
            }
        }
        Verdict::out_of_scope(input.request.student_message.clone())
    }
}

impl std::fmt::Debug for RuleCascade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleCascade")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Shorthand used by matchers for a full-confidence answer verdict.
pub(crate) fn answer(kind: VerdictKind, data: impl Into<String>) -> MatchOutcome {
    MatchOutcome::Decided(Verdict::single_event(kind, data))
}
