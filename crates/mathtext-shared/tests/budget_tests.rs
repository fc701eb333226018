//! Tests for budget.rs

use mathtext_shared::budget::{check_stage_budget, BudgetCheck, EvaluationBudget, Stage};

#[test]
fn test_budget_defaults() {
    let budget = EvaluationBudget::default();
    assert_eq!(budget.total_ms, 3_000);
    assert_eq!(budget.classifier_ms, 2_500);
}

#[test]
fn test_check_stage_budget() {
    let budget = EvaluationBudget::default();
    assert_eq!(check_stage_budget(Stage::Classifier, 100, &budget), BudgetCheck::Ok);
    assert!(matches!(
        check_stage_budget(Stage::Classifier, 2_600, &budget),
        BudgetCheck::StageExceeded {
            stage: Stage::Classifier,
            budget_ms: 2_500,
            elapsed_ms: 2_600,
        }
    ));
    assert_eq!(check_stage_budget(Stage::Rules, 9_999, &budget), BudgetCheck::Ok);
}

#[test]
fn test_stage_budget_boundary_is_inclusive() {
    let budget = EvaluationBudget::default();
    assert!(!check_stage_budget(Stage::Classifier, 2_500, &budget).is_exceeded());
    assert!(check_stage_budget(Stage::Classifier, 2_501, &budget).is_exceeded());
}
