//! Per-request latency budget.
//!
//! The whole evaluation runs under `total_ms`; the classifier call gets its
//! own, smaller cap so a slow classifier degrades instead of timing out.
//! Pure decision functions for testability.

use serde::{Deserialize, Serialize};

/// Stages timed by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Rules,
    Classifier,
    Resolvers,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rules => write!(f, "rules"),
            Self::Classifier => write!(f, "classifier"),
            Self::Resolvers => write!(f, "resolvers"),
        }
    }
}

/// Budgets in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationBudget {
    /// Entire request, rules through verdict
    pub total_ms: u64,
    /// Single classifier call
    pub classifier_ms: u64,
}

impl Default for EvaluationBudget {
    fn default() -> Self {
        Self {
            total_ms: 3_000,
            classifier_ms: 2_500,
        }
    }
}

/// Budget check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetCheck {
    Ok,
    StageExceeded {
        stage: Stage,
        budget_ms: u64,
        elapsed_ms: u64,
    },
}

impl BudgetCheck {
    pub fn is_exceeded(&self) -> bool {
        !matches!(self, Self::Ok)
    }
}

/// Only the classifier stage has its own budget; other stages report Ok.
pub fn check_stage_budget(stage: Stage, elapsed_ms: u64, budget: &EvaluationBudget) -> BudgetCheck {
    match stage {
        Stage::Classifier if elapsed_ms > budget.classifier_ms => BudgetCheck::StageExceeded {
            stage,
            budget_ms: budget.classifier_ms,
            elapsed_ms,
        },
        _ => BudgetCheck::Ok,
    }
}
