//! Shared types and matchers for the mathtext answer evaluator.
//!
//! Everything in this crate is synchronous and free of I/O. The async
//! orchestration (classifier calls, timeouts, logging) lives in `mathtextd`.
//! v0.3.0: Cascade stages became data (`StageKind`) instead of fixed call order.

pub mod budget;
pub mod cascade;
pub mod error;
pub mod matchers;
pub mod normalize;
pub mod numbers;
pub mod patterns;
pub mod phrase;
pub mod safety;
pub mod tables;
pub mod verdict;

pub use cascade::{MatchInput, MatchOutcome, Matcher, RuleCascade, StageKind};
pub use error::NluError;
pub use normalize::NormalizedPair;
pub use verdict::{AnswerOutcome, EvaluationRequest, IntentResult, Verdict, VerdictEntry, VerdictKind};

/// Crate version, shared by the daemon for its banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
