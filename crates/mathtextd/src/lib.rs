//! mathtextd library - answer evaluation service, exposed for testing.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod evaluator;
pub mod resolver;
pub mod verdict_log;

pub use classifier::{ClassifierError, FakeIntentClassifier, IntentClassifier};
pub use config::Config;
pub use evaluator::{AnswerEvaluator, EvaluatorSettings};
pub use verdict_log::{LogStore, LogStoreError, VerdictLogger, VerdictRecord};
