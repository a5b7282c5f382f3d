//! Shared test utilities for `LedgerBuddy`.
//!
//! Helpers for setting up an in-memory database and creating budgets,
//! categories and expenses with sensible defaults.

use crate::{
    core::{budget, category, expense},
    core::types::BalanceType,
    entities,
    errors::Result,
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// Creates an in-memory `SQLite` database with all tables initialized.
///
/// The pool is pinned to a single connection; every `sqlite::memory:`
/// connection would otherwise open its own empty database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A budget row that was never stored, for the pure calculation tests.
///
/// Remaining and total start at `checking + savings`, spent at zero.
#[must_use]
pub fn budget_snapshot(checking: i64, savings: i64) -> entities::budget::Model {
    let now = chrono::Utc::now();
    entities::budget::Model {
        budget_id: "budget-1".to_string(),
        user_id: "user1".to_string(),
        checking_balance: checking,
        savings_balance: savings,
        budget_total: checking + savings,
        budget_remaining: checking + savings,
        total_spent: 0,
        version: 0,
        updated_at: now,
        created_at: now,
    }
}

/// Sets up a fresh database holding one budget for `user_id`.
pub async fn setup_with_budget(
    user_id: &str,
    checking: i64,
    savings: i64,
) -> Result<(DatabaseConnection, entities::budget::Model)> {
    let db = setup_test_db().await?;
    let budget = budget::create_budget(&db, user_id, checking, savings).await?;
    Ok((db, budget))
}

/// Creates a category with an empty description.
pub async fn create_test_category(
    db: &DatabaseConnection,
    user_id: &str,
    name: &str,
) -> Result<entities::expense_category::Model> {
    category::create_category(db, user_id, name, "").await
}

/// Records a checking expense described as "Test expense".
///
/// The user must already have a budget that covers `amount`.
pub async fn create_test_expense(
    db: &DatabaseConnection,
    user_id: &str,
    category_id: Option<&str>,
    amount: i64,
) -> Result<entities::expense::Model> {
    let input = expense::ExpenseInput {
        category_id: category_id.map(str::to_string),
        description: "Test expense".to_string(),
        expense_type: BalanceType::Checking,
        amount_in_cents: amount,
    };
    Ok(expense::create_expense(db, user_id, &input).await?.expense)
}
