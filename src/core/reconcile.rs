//! Reconciliation report - read-only consistency check over stored aggregates.
//!
//! Nothing here writes. Drift found by these checks points at a failed
//! rollback or a direct edit to the database.

use crate::{
    entities::{Budget, Expense, ExpenseCategory, budget, expense, expense_category},
    errors::Result,
};
use sea_orm::{QueryOrder, prelude::*};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A category whose running total disagrees with its tagged expenses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryDrift {
    /// The drifting category
    pub category_id: String,
    /// Category name, for display
    pub name: String,
    /// Stored `total_sum`
    pub recorded_total: i64,
    /// Sum of the expenses tagged with the category
    pub expense_total: i64,
}

/// Consistency findings for one user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Owner of the checked rows
    pub user_id: String,
    /// `(budget_remaining, checking + savings)` when the two differ
    pub remaining_mismatch: Option<(i64, i64)>,
    /// Set when `total_spent` is negative
    pub negative_spent: Option<i64>,
    /// Categories whose totals drifted from their expenses
    pub category_drift: Vec<CategoryDrift>,
}

impl ReconciliationReport {
    /// True when no finding was recorded.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.remaining_mismatch.is_none()
            && self.negative_spent.is_none()
            && self.category_drift.is_empty()
    }
}

fn check_budget(report: &mut ReconciliationReport, budget: &budget::Model) {
    let expected = budget.checking_balance + budget.savings_balance;
    if budget.budget_remaining != expected {
        report.remaining_mismatch = Some((budget.budget_remaining, expected));
    }
    if budget.total_spent < 0 {
        report.negative_spent = Some(budget.total_spent);
    }
}

fn check_categories(
    report: &mut ReconciliationReport,
    categories: &[expense_category::Model],
    expenses: &[expense::Model],
) {
    let mut sums: HashMap<&str, i64> = HashMap::new();
    for expense in expenses {
        if let Some(category_id) = expense.category_id.as_deref() {
            *sums.entry(category_id).or_default() += expense.amount_in_cents;
        }
    }

    for category in categories {
        let expense_total = sums.get(category.category_id.as_str()).copied().unwrap_or(0);
        if category.total_sum != expense_total {
            report.category_drift.push(CategoryDrift {
                category_id: category.category_id.clone(),
                name: category.name.clone(),
                recorded_total: category.total_sum,
                expense_total,
            });
        }
    }
}

/// Checks one user's budget and categories.
///
/// A user without a budget only gets the category check.
pub async fn reconcile_user(db: &DatabaseConnection, user_id: &str) -> Result<ReconciliationReport> {
    let mut report = ReconciliationReport {
        user_id: user_id.to_string(),
        ..ReconciliationReport::default()
    };

    if let Some(budget) = Budget::find()
        .filter(budget::Column::UserId.eq(user_id))
        .one(db)
        .await?
    {
        check_budget(&mut report, &budget);
    }

    let categories = ExpenseCategory::find()
        .filter(expense_category::Column::UserId.eq(user_id))
        .order_by_asc(expense_category::Column::Name)
        .all(db)
        .await?;
    let expenses = Expense::find()
        .filter(expense::Column::UserId.eq(user_id))
        .all(db)
        .await?;
    check_categories(&mut report, &categories, &expenses);

    if report.is_consistent() {
        debug!(user_id, "Ledger consistent");
    } else {
        warn!(user_id, ?report, "Ledger drift detected");
    }
    Ok(report)
}

/// Reconciles every user that owns a budget, ordered by user id.
pub async fn reconcile_all(db: &DatabaseConnection) -> Result<Vec<ReconciliationReport>> {
    let budgets = Budget::find()
        .order_by_asc(budget::Column::UserId)
        .all(db)
        .await?;

    let mut reports = Vec::with_capacity(budgets.len());
    for budget in budgets {
        reports.push(reconcile_user(db, &budget.user_id).await?);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::ledger::apply_manual_balance_update;
    use crate::core::types::{BalanceType, UpdateDirection};
    use crate::test_utils::*;
    use sea_orm::{ActiveModelTrait, Set};

    #[tokio::test]
    async fn test_consistent_after_ledger_operations() -> Result<()> {
        let (db, _) = setup_with_budget("user1", 10_000, 5_000).await?;
        let category = create_test_category(&db, "user1", "Groceries").await?;
        create_test_expense(&db, "user1", Some(&category.category_id), 1_500).await?;
        create_test_expense(&db, "user1", None, 200).await?;
        apply_manual_balance_update(
            &db,
            "user1",
            BalanceType::Savings,
            UpdateDirection::Add,
            700,
        )
        .await?;

        let report = reconcile_user(&db, "user1").await?;
        assert!(report.is_consistent(), "{report:?}");

        Ok(())
    }

    #[tokio::test]
    async fn test_detects_drift() -> Result<()> {
        let (db, budget) = setup_with_budget("user1", 10_000, 5_000).await?;
        let category = create_test_category(&db, "user1", "Groceries").await?;
        create_test_expense(&db, "user1", Some(&category.category_id), 1_500).await?;

        let mut broken: budget::ActiveModel = budget.into();
        broken.budget_remaining = Set(1);
        broken.total_spent = Set(-5);
        broken.update(&db).await?;

        let mut drifted: expense_category::ActiveModel =
            ExpenseCategory::find_by_id(category.category_id.clone())
                .one(&db)
                .await?
                .unwrap()
                .into();
        drifted.total_sum = Set(99);
        drifted.update(&db).await?;

        let report = reconcile_user(&db, "user1").await?;
        assert!(!report.is_consistent());
        assert_eq!(report.remaining_mismatch, Some((1, 13_500)));
        assert_eq!(report.negative_spent, Some(-5));
        assert_eq!(
            report.category_drift,
            vec![CategoryDrift {
                category_id: category.category_id,
                name: "Groceries".to_string(),
                recorded_total: 99,
                expense_total: 1_500,
            }]
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_reconcile_all_covers_every_budget() -> Result<()> {
        let (db, _) = setup_with_budget("user2", 100, 0).await?;
        crate::core::budget::create_budget(&db, "user1", 50, 50).await?;

        let reports = reconcile_all(&db).await?;
        let users: Vec<&str> = reports.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(users, vec!["user1", "user2"]);
        assert!(reports.iter().all(ReconciliationReport::is_consistent));

        Ok(())
    }
}
