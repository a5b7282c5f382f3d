//! Storage port - the reads and writes the ledger needs, nothing more.
//!
//! Every function is generic over [`ConnectionTrait`] so it runs the same
//! against a pooled [`DatabaseConnection`] or inside a `DatabaseTransaction`.
//! Budget and category writes are compare-and-swap on the `version` column:
//! `UPDATE ... WHERE id = ? AND user_id = ? AND version = ?`. A write that
//! matches no row returns [`Error::Conflict`] and the caller re-reads.

use crate::{
    entities::{Budget, Expense, ExpenseCategory, budget, expense, expense_category},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*, sea_query::Expr};

/// Current running total of a category together with the version it was read at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoryTotal {
    /// Running total in cents
    pub total_sum: i64,
    /// Row version for the compare-and-swap write
    pub version: i64,
}

/// Fetches the single budget owned by `user_id`.
///
/// # Errors
/// [`Error::BudgetNotFound`] when the user has no budget; budgets are never
/// provisioned implicitly.
pub async fn get_budget_by_user<C>(db: &C, user_id: &str) -> Result<budget::Model>
where
    C: ConnectionTrait,
{
    Budget::find()
        .filter(budget::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::BudgetNotFound {
            user_id: user_id.to_string(),
        })
}

/// Persists the balance fields of `next`, keyed by `(budget_id, user_id, version)`.
///
/// Only checking, savings, total, remaining, spent, `updated_at` and `version`
/// are rewritten. Returns the stored row.
pub async fn put_budget<C>(db: &C, next: &budget::Model) -> Result<budget::Model>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let result = Budget::update_many()
        .col_expr(budget::Column::CheckingBalance, Expr::value(next.checking_balance))
        .col_expr(budget::Column::SavingsBalance, Expr::value(next.savings_balance))
        .col_expr(budget::Column::BudgetTotal, Expr::value(next.budget_total))
        .col_expr(budget::Column::BudgetRemaining, Expr::value(next.budget_remaining))
        .col_expr(budget::Column::TotalSpent, Expr::value(next.total_spent))
        .col_expr(budget::Column::UpdatedAt, Expr::value(now))
        .col_expr(budget::Column::Version, Expr::value(next.version + 1))
        .filter(budget::Column::BudgetId.eq(next.budget_id.as_str()))
        .filter(budget::Column::UserId.eq(next.user_id.as_str()))
        .filter(budget::Column::Version.eq(next.version))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::Conflict {
            entity: "budget",
            id: next.budget_id.clone(),
        });
    }

    Ok(budget::Model {
        version: next.version + 1,
        updated_at: now,
        ..next.clone()
    })
}

/// Reads the running total of one of the user's categories.
pub async fn get_category_total<C>(
    db: &C,
    user_id: &str,
    category_id: &str,
) -> Result<CategoryTotal>
where
    C: ConnectionTrait,
{
    let category = ExpenseCategory::find_by_id(category_id.to_string())
        .filter(expense_category::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::CategoryNotFound {
            category_id: category_id.to_string(),
        })?;

    Ok(CategoryTotal {
        total_sum: category.total_sum,
        version: category.version,
    })
}

/// Writes a new running total if the category is still at `expected_version`.
pub async fn put_category_total<C>(
    db: &C,
    user_id: &str,
    category_id: &str,
    expected_version: i64,
    new_total: i64,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = ExpenseCategory::update_many()
        .col_expr(expense_category::Column::TotalSum, Expr::value(new_total))
        .col_expr(
            expense_category::Column::Version,
            Expr::value(expected_version + 1),
        )
        .filter(expense_category::Column::CategoryId.eq(category_id))
        .filter(expense_category::Column::UserId.eq(user_id))
        .filter(expense_category::Column::Version.eq(expected_version))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::Conflict {
            entity: "expense_category",
            id: category_id.to_string(),
        });
    }

    Ok(())
}

/// Fetches one of the user's expenses.
///
/// Expenses owned by another user are reported as not found.
pub async fn get_expense<C>(db: &C, user_id: &str, expense_id: &str) -> Result<expense::Model>
where
    C: ConnectionTrait,
{
    Expense::find_by_id(expense_id.to_string())
        .filter(expense::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::ExpenseNotFound {
            expense_id: expense_id.to_string(),
        })
}

/// Deletes one of the user's expenses. Deleting a missing row is an error, not a no-op.
pub async fn delete_expense<C>(db: &C, expense_id: &str, user_id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Expense::delete_many()
        .filter(expense::Column::ExpenseId.eq(expense_id))
        .filter(expense::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::ExpenseNotFound {
            expense_id: expense_id.to_string(),
        });
    }

    Ok(())
}

/// Inserts a fully-populated expense row.
pub async fn insert_expense<C>(db: &C, model: expense::Model) -> Result<expense::Model>
where
    C: ConnectionTrait,
{
    let active = expense::ActiveModel {
        expense_id: Set(model.expense_id),
        user_id: Set(model.user_id),
        category_id: Set(model.category_id),
        description: Set(model.description),
        expense_type: Set(model.expense_type),
        amount_in_cents: Set(model.amount_in_cents),
        created_at: Set(model.created_at),
    };

    active.insert(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_get_budget_by_user_not_found() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<budget::Model>::new()])
            .into_connection();

        let result = get_budget_by_user(&db, "ghost").await;
        assert!(matches!(
            result,
            Err(Error::BudgetNotFound { user_id }) if user_id == "ghost"
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_put_budget_conflict_when_no_row_matches() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let snapshot = budget_snapshot(100, 100);
        let result = put_budget(&db, &snapshot).await;
        assert!(matches!(
            result,
            Err(Error::Conflict {
                entity: "budget",
                ..
            })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_put_budget_bumps_version() -> Result<()> {
        let (db, budget) = setup_with_budget("user1", 10_000, 5_000).await?;

        let mut next = budget.clone();
        next.checking_balance = 9_000;
        next.budget_remaining = 14_000;
        let stored = put_budget(&db, &next).await?;
        assert_eq!(stored.version, budget.version + 1);

        let reloaded = get_budget_by_user(&db, "user1").await?;
        assert_eq!(reloaded.checking_balance, 9_000);
        assert_eq!(reloaded.budget_remaining, 14_000);
        assert_eq!(reloaded.version, stored.version);

        // writing from the stale snapshot again must not clobber the row
        let stale = put_budget(&db, &next).await;
        assert!(matches!(stale, Err(Error::Conflict { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_category_total_round_trip() -> Result<()> {
        let (db, _budget) = setup_with_budget("user1", 0, 0).await?;
        let category = create_test_category(&db, "user1", "Groceries").await?;

        let total = get_category_total(&db, "user1", &category.category_id).await?;
        assert_eq!(total.total_sum, 0);

        put_category_total(&db, "user1", &category.category_id, total.version, 2_500).await?;
        let updated = get_category_total(&db, "user1", &category.category_id).await?;
        assert_eq!(updated.total_sum, 2_500);
        assert_eq!(updated.version, total.version + 1);

        let stale =
            put_category_total(&db, "user1", &category.category_id, total.version, 1).await;
        assert!(matches!(stale, Err(Error::Conflict { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_category_is_scoped_to_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "user1", "Rent").await?;

        let result = get_category_total(&db, "user2", &category.category_id).await;
        assert!(matches!(result, Err(Error::CategoryNotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_missing_expense_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = delete_expense(&db, "missing", "user1").await;
        assert!(matches!(
            result,
            Err(Error::ExpenseNotFound { expense_id }) if expense_id == "missing"
        ));
        Ok(())
    }
}
