//! Budget business logic - setup, lookup and removal of a user's budget.
//!
//! Balances only change through `core::ledger` once the budget exists.

use crate::{
    core::{calculator::checked_sum, store},
    entities::{Budget, Expense, ExpenseCategory, budget, expense, expense_category},
    errors::{Error, Result},
};
use sea_orm::{Set, SqlErr, TransactionTrait, prelude::*};
use tracing::info;
use uuid::Uuid;

/// Sets up the user's budget from opening checking and savings balances.
///
/// `budget_total` and `budget_remaining` start at checking + savings and
/// `total_spent` at zero. A user can have only one budget.
pub async fn create_budget(
    db: &DatabaseConnection,
    user_id: &str,
    checking_balance: i64,
    savings_balance: i64,
) -> Result<budget::Model> {
    if user_id.trim().is_empty() {
        return Err(Error::InvalidInput {
            message: "User id cannot be empty".to_string(),
        });
    }
    if checking_balance < 0 {
        return Err(Error::InvalidAmount {
            amount: checking_balance,
        });
    }
    if savings_balance < 0 {
        return Err(Error::InvalidAmount {
            amount: savings_balance,
        });
    }

    let opening_total = checked_sum(checking_balance, savings_balance, savings_balance)?;

    let existing = Budget::find()
        .filter(budget::Column::UserId.eq(user_id))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::BudgetAlreadyExists {
            user_id: user_id.to_string(),
        });
    }

    let now = chrono::Utc::now();
    let budget = budget::ActiveModel {
        budget_id: Set(Uuid::new_v4().to_string()),
        user_id: Set(user_id.to_string()),
        checking_balance: Set(checking_balance),
        savings_balance: Set(savings_balance),
        budget_total: Set(opening_total),
        budget_remaining: Set(opening_total),
        total_spent: Set(0),
        version: Set(0),
        updated_at: Set(now),
        created_at: Set(now),
    };

    // a concurrent setup can win between the lookup and the insert
    let result = budget.insert(db).await.map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::BudgetAlreadyExists {
            user_id: user_id.to_string(),
        },
        _ => Error::from(err),
    })?;
    info!(user_id, budget_id = %result.budget_id, opening_total, "Created budget");
    Ok(result)
}

/// Retrieves the user's budget.
pub async fn get_budget(db: &DatabaseConnection, user_id: &str) -> Result<budget::Model> {
    store::get_budget_by_user(db, user_id).await
}

/// Removes everything the user owns: expenses, categories and the budget.
pub async fn delete_user_data(db: &DatabaseConnection, user_id: &str) -> Result<()> {
    let txn = db.begin().await?;

    let expenses = Expense::delete_many()
        .filter(expense::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?
        .rows_affected;
    let categories = ExpenseCategory::delete_many()
        .filter(expense_category::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?
        .rows_affected;
    let budgets = Budget::delete_many()
        .filter(budget::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?
        .rows_affected;

    txn.commit().await?;

    info!(user_id, expenses, categories, budgets, "Deleted user data");
    Ok(())
}
