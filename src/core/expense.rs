//! Expense business logic - records expenses and keeps the ledger in step with them.
//!
//! Each function writes the expense row and the matching ledger entries in
//! one database transaction, so an expense never exists without its budget
//! and category effect (or the other way round).

use crate::{
    core::{
        ledger::{LedgerEntry, post_entry, retry_on_conflict, settle},
        store,
        types::BalanceType,
        validator::validate_amount,
    },
    entities::{Expense, budget, expense},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};
use uuid::Uuid;

/// Input for creating or editing an expense.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpenseInput {
    /// Category to tag the expense with, if any
    pub category_id: Option<String>,
    /// Free-form description
    pub description: String,
    /// Balance the expense draws from
    pub expense_type: BalanceType,
    /// Amount in cents, must be positive
    pub amount_in_cents: i64,
}

/// An expense row together with the budget as it stands after the write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpenseReceipt {
    /// The stored expense
    pub expense: expense::Model,
    /// The user's budget after the ledger update
    pub budget: budget::Model,
}

/// Records a new expense and charges it to the budget and its category.
///
/// # Errors
/// * [`Error::InvalidAmount`] for non-positive amounts
/// * [`Error::InsufficientFunds`] if the targeted balance cannot cover it
/// * [`Error::BudgetNotFound`] / [`Error::CategoryNotFound`] for missing references
#[instrument(skip(db))]
pub async fn create_expense(
    db: &DatabaseConnection,
    user_id: &str,
    input: &ExpenseInput,
) -> Result<ExpenseReceipt> {
    validate_amount(input.amount_in_cents)?;

    let entry = LedgerEntry::expense_charge(
        user_id,
        input.category_id.as_deref(),
        input.expense_type,
        input.amount_in_cents,
    );

    let receipt = retry_on_conflict(move || async move {
        let txn = db.begin().await?;
        let outcome: Result<ExpenseReceipt> = async {
            let budget = post_entry(&txn, &entry).await?;
            let expense = store::insert_expense(
                &txn,
                expense::Model {
                    expense_id: Uuid::new_v4().to_string(),
                    user_id: user_id.to_string(),
                    category_id: input.category_id.clone(),
                    description: input.description.trim().to_string(),
                    expense_type: input.expense_type,
                    amount_in_cents: input.amount_in_cents,
                    created_at: chrono::Utc::now(),
                },
            )
            .await?;
            Ok(ExpenseReceipt { expense, budget })
        }
        .await;
        settle(txn, outcome).await
    })
    .await?;

    info!(
        user_id,
        expense_id = %receipt.expense.expense_id,
        amount = receipt.expense.amount_in_cents,
        "Expense created"
    );
    Ok(receipt)
}

/// Edits an expense.
///
/// When the amount, balance type or category changes, the stored expense is
/// refunded and the edited one charged in the same transaction, so only the
/// net difference lands on the budget and categories. The funds check runs
/// against the balance after the refund. Description-only edits leave the
/// ledger untouched.
#[instrument(skip(db))]
pub async fn update_expense(
    db: &DatabaseConnection,
    user_id: &str,
    expense_id: &str,
    input: &ExpenseInput,
) -> Result<ExpenseReceipt> {
    validate_amount(input.amount_in_cents)?;

    let receipt = retry_on_conflict(move || async move {
        let txn = db.begin().await?;
        let outcome: Result<ExpenseReceipt> = async {
            let existing = store::get_expense(&txn, user_id, expense_id).await?;

            let ledger_changed = existing.amount_in_cents != input.amount_in_cents
                || existing.expense_type != input.expense_type
                || existing.category_id != input.category_id;

            let budget = if ledger_changed {
                let refund = LedgerEntry::expense_refund(
                    user_id,
                    existing.category_id.as_deref(),
                    existing.expense_type,
                    existing.amount_in_cents,
                );
                post_entry(&txn, &refund).await?;

                let charge = LedgerEntry::expense_charge(
                    user_id,
                    input.category_id.as_deref(),
                    input.expense_type,
                    input.amount_in_cents,
                );
                post_entry(&txn, &charge).await?
            } else {
                store::get_budget_by_user(&txn, user_id).await?
            };

            let mut active: expense::ActiveModel = existing.into();
            active.category_id = Set(input.category_id.clone());
            active.description = Set(input.description.trim().to_string());
            active.expense_type = Set(input.expense_type);
            active.amount_in_cents = Set(input.amount_in_cents);
            let expense = active.update(&txn).await?;

            Ok(ExpenseReceipt { expense, budget })
        }
        .await;
        settle(txn, outcome).await
    })
    .await?;

    info!(user_id, expense_id, "Expense updated");
    Ok(receipt)
}

/// Deletes an expense and refunds it to the budget and its category.
///
/// Deleting the same expense twice fails with [`Error::ExpenseNotFound`]
/// rather than refunding it again.
#[instrument(skip(db))]
pub async fn delete_expense(
    db: &DatabaseConnection,
    user_id: &str,
    expense_id: &str,
) -> Result<budget::Model> {
    let budget = retry_on_conflict(move || async move {
        let txn = db.begin().await?;
        let outcome: Result<budget::Model> = async {
            let existing = store::get_expense(&txn, user_id, expense_id).await?;
            store::delete_expense(&txn, expense_id, user_id).await?;

            let refund = LedgerEntry::expense_refund(
                user_id,
                existing.category_id.as_deref(),
                existing.expense_type,
                existing.amount_in_cents,
            );
            post_entry(&txn, &refund).await
        }
        .await;
        settle(txn, outcome).await
    })
    .await?;

    info!(user_id, expense_id, "Expense deleted");
    Ok(budget)
}

/// Retrieves one of the user's expenses.
pub async fn get_expense(
    db: &DatabaseConnection,
    user_id: &str,
    expense_id: &str,
) -> Result<expense::Model> {
    store::get_expense(db, user_id, expense_id).await
}

/// Lists all of the user's expenses, newest first.
pub async fn list_expenses(db: &DatabaseConnection, user_id: &str) -> Result<Vec<expense::Model>> {
    Expense::find()
        .filter(expense::Column::UserId.eq(user_id))
        .order_by_desc(expense::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sums the amounts of `expenses` in cents.
#[must_use]
pub fn expenses_total(expenses: &[expense::Model]) -> i64 {
    expenses.iter().map(|e| e.amount_in_cents).sum()
}
