//! AnswerEvaluator - runs one request through the rule cascade, the
//! classifier and the resolvers under a single latency budget.
//!
//! Always answers: a panic inside the evaluation becomes the canned `error`
//! verdict, an elapsed budget the canned `timeout` verdict, and a failing
//! classifier degrades to `out_of_scope`.

use mathtext_shared::budget::{check_stage_budget, EvaluationBudget, Stage};
use mathtext_shared::cascade::attempt_guarded;
use mathtext_shared::{
    EvaluationRequest, IntentResult, MatchInput, MatchOutcome, Matcher, NormalizedPair,
    RuleCascade, Verdict, VerdictKind,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

use crate::classifier::IntentClassifier;
use crate::config::Config;
use crate::resolver::{self, ResolverSettings};
use crate::verdict_log::VerdictLogger;

/// Evaluation knobs, usually derived from `Config`.
#[derive(Debug, Clone)]
pub struct EvaluatorSettings {
    pub max_message_chars: usize,
    pub rule_stage_max_chars: usize,
    pub budget: EvaluationBudget,
    pub resolvers: ResolverSettings,
}

impl Default for EvaluatorSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl EvaluatorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_message_chars: config.nlu.max_message_chars,
            rule_stage_max_chars: config.nlu.rule_stage_max_chars,
            budget: config.evaluation_budget(),
            resolvers: ResolverSettings {
                answer_intent_threshold: config.nlu.answer_intent_threshold,
                approved_intent_threshold: config.nlu.approved_intent_threshold,
                approved_intents: config.nlu.approved_intents.clone(),
            },
        }
    }

    fn rules_enabled(&self, request: &EvaluationRequest) -> bool {
        request.student_message.chars().count() < self.rule_stage_max_chars
    }
}

struct EvaluatorCore {
    cascade: RuleCascade,
    classifier: Arc<dyn IntentClassifier>,
    settings: EvaluatorSettings,
}

/// Cloneable, shareable evaluator. Holds no per-request state.
#[derive(Clone)]
pub struct AnswerEvaluator {
    core: Arc<EvaluatorCore>,
    logger: Option<VerdictLogger>,
}

impl AnswerEvaluator {
    pub fn new(
        cascade: RuleCascade,
        classifier: Arc<dyn IntentClassifier>,
        settings: EvaluatorSettings,
    ) -> Self {
        Self {
            core: Arc::new(EvaluatorCore {
                cascade,
                classifier,
                settings,
            }),
            logger: None,
        }
    }

    pub fn from_config(config: &Config, classifier: Arc<dyn IntentClassifier>) -> Self {
        Self::new(
            config.build_cascade(),
            classifier,
            EvaluatorSettings::from_config(config),
        )
    }

    /// Every verdict is also handed to `logger` (never awaited).
    pub fn with_logger(mut self, logger: VerdictLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn settings(&self) -> &EvaluatorSettings {
        &self.core.settings
    }

    /// Full evaluation under the configured budget.
    pub async fn evaluate(&self, request: EvaluationRequest) -> Verdict {
        let started = Instant::now();
        let budget = self.core.settings.budget;
        let core = Arc::clone(&self.core);
        let task_request = request.clone();
        let mut task = tokio::spawn(async move { core.run(&task_request).await });

        let verdict = match tokio::time::timeout(Duration::from_millis(budget.total_ms), &mut task).await {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(e)) => {
                error!("Evaluation task failed, returning error verdict: {}", e);
                Verdict::error()
            }
            Err(_) => {
                task.abort();
                warn!(budget_ms = budget.total_ms, "Evaluation budget elapsed");
                Verdict::timeout()
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        debug!(kind = %verdict.kind, elapsed_ms, "Evaluation finished");
        self.log(&request, &verdict);
        verdict
    }

    /// Rule cascade only; the classifier is never called.
    pub fn evaluate_offline(&self, request: EvaluationRequest) -> Verdict {
        let settings = &self.core.settings;
        let pair = NormalizedPair::new(
            &request.student_message,
            &request.expected_answer,
            settings.max_message_chars,
        );
        let input = MatchInput::new(&request, &pair);
        let rules_enabled = settings.rules_enabled(&request);
        let verdict = match catch_unwind(AssertUnwindSafe(|| {
            self.core.cascade.run_offline(&input, rules_enabled)
        })) {
            Ok(verdict) => verdict,
            Err(_) => {
                error!("Offline evaluation panicked, returning error verdict");
                Verdict::error()
            }
        };
        self.log(&request, &verdict);
        verdict
    }

    fn log(&self, request: &EvaluationRequest, verdict: &Verdict) {
        if let Some(logger) = &self.logger {
            logger.record(request, verdict);
        }
    }
}

impl EvaluatorCore {
    async fn run(&self, request: &EvaluationRequest) -> Verdict {
        let settings = &self.settings;
        let pair = NormalizedPair::new(
            &request.student_message,
            &request.expected_answer,
            settings.max_message_chars,
        );
        let input = MatchInput::new(request, &pair);
        let rules_enabled = settings.rules_enabled(request);
        let mut intents: Option<Vec<IntentResult>> = None;

        for matcher in self.cascade.matchers() {
            let matcher: &dyn Matcher = matcher.as_ref();
            if !rules_enabled && !matcher.bypasses_length_gate() {
                continue;
            }
            match attempt_guarded(matcher, &input) {
                MatchOutcome::Decided(verdict) => {
                    debug!(stage = matcher.name(), kind = %verdict.kind, "Rule stage decided");
                    return verdict;
                }
                MatchOutcome::Abstain => {}
                MatchOutcome::NeedsAnswerIntent { literal } => {
                    let ranked = self.intents_for(&pair.message, &mut intents).await;
                    if resolver::is_answer_attempt(ranked, settings.resolvers.answer_intent_threshold) {
                        debug!(stage = matcher.name(), literal = %literal, "Answer-shaped token confirmed");
                        return Verdict::single_event(VerdictKind::WrongAnswer, literal);
                    }
                }
            }
        }

        let ranked = self.intents_for(&pair.message, &mut intents).await;
        resolver::resolve(ranked, &pair, &request.expected_answer, &settings.resolvers)
            .unwrap_or_else(|| Verdict::out_of_scope(request.student_message.clone()))
    }

    /// Classifier output for this request, fetched at most once.
    async fn intents_for<'a>(
        &self,
        text: &str,
        cache: &'a mut Option<Vec<IntentResult>>,
    ) -> &'a [IntentResult] {
        if cache.is_none() {
            *cache = Some(self.classify(text).await);
        }
        match cache {
            Some(ranked) => ranked.as_slice(),
            None => &[],
        }
    }

    /// Errors and the classifier's own timeout both degrade to no intents.
    async fn classify(&self, text: &str) -> Vec<IntentResult> {
        let budget = &self.settings.budget;
        let call_started = Instant::now();
        let result = tokio::time::timeout(
            Duration::from_millis(budget.classifier_ms),
            self.classifier.classify(text),
        )
        .await;
        let elapsed_ms = call_started.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(ranked)) => {
                if check_stage_budget(Stage::Classifier, elapsed_ms, budget).is_exceeded() {
                    warn!(elapsed_ms, budget_ms = budget.classifier_ms, "Classifier over budget");
                }
                debug!(
                    classifier = self.classifier.name(),
                    count = ranked.len(),
                    elapsed_ms,
                    "Classified message"
                );
                ranked
            }
            Ok(Err(e)) => {
                warn!(classifier = self.classifier.name(), "Classifier failed, degrading: {}", e);
                Vec::new()
            }
            Err(_) => {
                warn!(
                    classifier = self.classifier.name(),
                    budget_ms = budget.classifier_ms,
                    "Classifier timed out, degrading"
                );
                Vec::new()
            }
        }
    }
}
