//! Ledger transaction coordinator - keeps the budget and category aggregates in step.
//!
//! Every mutation follows the same sequence inside one database transaction:
//!
//! 1. fetch the user's budget snapshot
//! 2. validate funds (subtractions only) against that snapshot
//! 3. compute the new aggregate from the snapshot
//! 4. persist it with a compare-and-swap on `version`
//! 5. move the category running total, when the entry is tagged with one
//!
//! A rejected validation writes nothing. A failed category step rolls the
//! budget write back and the category error is returned unchanged; only if
//! that rollback fails does the caller see [`Error::PartialFailure`], which
//! carries the skipped [`CategoryAdjustment`] for [`retry_category_adjustment`].
//! Conflicting concurrent writers are retried from step 1 up to
//! [`MAX_CONFLICT_ATTEMPTS`] times.

use crate::{
    core::{
        calculator::recompute_budget_aggregate,
        category, store,
        types::{BalanceType, CategoryAdjustment, CategoryOp, OperationKind, UpdateDirection},
        validator::{validate_amount, validate_sufficient_funds},
    },
    entities::budget,
    errors::{Error, Result},
};
use sea_orm::{DatabaseTransaction, TransactionTrait, prelude::*};
use tracing::{debug, error, info, instrument, warn};

/// How many times a conflicting read-modify-write is attempted before giving up.
pub const MAX_CONFLICT_ATTEMPTS: u32 = 5;

/// One budget movement, optionally mirrored on a category total.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LedgerEntry<'a> {
    pub(crate) user_id: &'a str,
    pub(crate) balance_type: BalanceType,
    pub(crate) direction: UpdateDirection,
    pub(crate) amount: i64,
    pub(crate) kind: OperationKind,
    pub(crate) category_id: Option<&'a str>,
}

impl<'a> LedgerEntry<'a> {
    /// Spending against an expense: subtract and increment the category.
    pub(crate) const fn expense_charge(
        user_id: &'a str,
        category_id: Option<&'a str>,
        balance_type: BalanceType,
        amount: i64,
    ) -> Self {
        Self {
            user_id,
            balance_type,
            direction: UpdateDirection::Subtract,
            amount,
            kind: OperationKind::ExpenseFlow,
            category_id,
        }
    }

    /// Reversing an expense: add back and decrement the category.
    pub(crate) const fn expense_refund(
        user_id: &'a str,
        category_id: Option<&'a str>,
        balance_type: BalanceType,
        amount: i64,
    ) -> Self {
        Self {
            user_id,
            balance_type,
            direction: UpdateDirection::Add,
            amount,
            kind: OperationKind::ExpenseFlow,
            category_id,
        }
    }

    fn category_adjustment(&self) -> Option<CategoryAdjustment> {
        let op = match self.direction {
            UpdateDirection::Subtract => CategoryOp::Increment,
            UpdateDirection::Add => CategoryOp::Decrement,
        };
        self.category_id.map(|category_id| CategoryAdjustment {
            user_id: self.user_id.to_string(),
            category_id: category_id.to_string(),
            amount: self.amount,
            op,
        })
    }
}

/// Runs steps 1-5 for `entry` on `db`, which should be an open transaction.
///
/// A failed category step comes back as [`Error::PartialFailure`] so that
/// [`settle`] can tell it apart from failures that wrote nothing.
pub(crate) async fn post_entry<C>(db: &C, entry: &LedgerEntry<'_>) -> Result<budget::Model>
where
    C: ConnectionTrait,
{
    let snapshot = store::get_budget_by_user(db, entry.user_id).await?;

    if entry.direction == UpdateDirection::Subtract {
        validate_sufficient_funds(&snapshot, entry.balance_type, entry.amount)?;
    }

    let next = recompute_budget_aggregate(
        &snapshot,
        entry.direction,
        entry.balance_type,
        entry.amount,
        entry.kind,
    )?;
    let stored = store::put_budget(db, &next).await?;

    if let Some(adjustment) = entry.category_adjustment() {
        if let Err(source) = category::update_category_total(db, &adjustment).await {
            return Err(Error::PartialFailure {
                adjustment,
                source: Box::new(source),
            });
        }
    }

    Ok(stored)
}

/// Commits `txn` on success and rolls it back on failure.
///
/// A category-step failure is unwrapped to its cause once the rollback has
/// succeeded, because nothing was persisted.
pub(crate) async fn settle<T>(txn: DatabaseTransaction, outcome: Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(Error::PartialFailure { adjustment, source }) => match txn.rollback().await {
            Ok(()) => {
                debug!(%adjustment, "Category step failed; budget write rolled back");
                Err(*source)
            }
            Err(rollback_error) => {
                error!(
                    %adjustment,
                    %rollback_error,
                    "Category step failed and budget write could not be rolled back"
                );
                Err(Error::PartialFailure { adjustment, source })
            }
        },
        Err(err) => {
            if let Err(rollback_error) = txn.rollback().await {
                warn!(%rollback_error, "Rollback after failed ledger operation failed");
            }
            Err(err)
        }
    }
}

/// Re-runs `attempt` while it fails with [`Error::Conflict`].
pub(crate) async fn retry_on_conflict<T, F, Fut>(mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempts = 1;
    loop {
        match attempt().await {
            Err(Error::Conflict { entity, id }) if attempts < MAX_CONFLICT_ATTEMPTS => {
                debug!(entity, %id, attempts, "Concurrent update detected, retrying");
                attempts += 1;
            }
            Err(err @ Error::Conflict { .. }) => {
                warn!(attempts, "Giving up after repeated update conflicts");
                return Err(err);
            }
            other => return other,
        }
    }
}

async fn run_entry(db: &DatabaseConnection, entry: LedgerEntry<'_>) -> Result<budget::Model> {
    validate_amount(entry.amount)?;

    let budget = retry_on_conflict(move || async move {
        let txn = db.begin().await?;
        let outcome = post_entry(&txn, &entry).await;
        settle(txn, outcome).await
    })
    .await?;

    info!(
        user_id = entry.user_id,
        direction = %entry.direction,
        balance_type = %entry.balance_type,
        amount = entry.amount,
        remaining = budget.budget_remaining,
        "Budget updated"
    );
    Ok(budget)
}

/// Deposits into or withdraws from one of the user's balances directly.
///
/// `total_spent` is not affected. Withdrawals are checked for sufficient funds.
#[instrument(skip(db))]
pub async fn apply_manual_balance_update(
    db: &DatabaseConnection,
    user_id: &str,
    balance_type: BalanceType,
    direction: UpdateDirection,
    amount_in_cents: i64,
) -> Result<budget::Model> {
    run_entry(
        db,
        LedgerEntry {
            user_id,
            balance_type,
            direction,
            amount: amount_in_cents,
            kind: OperationKind::DirectAdjustment,
            category_id: None,
        },
    )
    .await
}

/// Charges a newly recorded expense to the budget and its category.
#[instrument(skip(db))]
pub async fn apply_expense_created(
    db: &DatabaseConnection,
    user_id: &str,
    category_id: Option<&str>,
    balance_type: BalanceType,
    amount_in_cents: i64,
) -> Result<budget::Model> {
    run_entry(
        db,
        LedgerEntry::expense_charge(user_id, category_id, balance_type, amount_in_cents),
    )
    .await
}

/// Charges the new amount of an edited expense.
///
/// The previous amount is not reversed here; callers holding the stored
/// expense should use `core::expense::update_expense`, which only lands the
/// net change.
#[instrument(skip(db))]
pub async fn apply_expense_amount_changed(
    db: &DatabaseConnection,
    user_id: &str,
    category_id: Option<&str>,
    balance_type: BalanceType,
    new_amount_in_cents: i64,
) -> Result<budget::Model> {
    run_entry(
        db,
        LedgerEntry::expense_charge(user_id, category_id, balance_type, new_amount_in_cents),
    )
    .await
}

/// Refunds a deleted expense to the budget and takes it off its category.
///
/// Refunds are never rejected for insufficient funds.
#[instrument(skip(db))]
pub async fn apply_expense_deleted(
    db: &DatabaseConnection,
    user_id: &str,
    category_id: Option<&str>,
    balance_type: BalanceType,
    amount_in_cents: i64,
) -> Result<budget::Model> {
    run_entry(
        db,
        LedgerEntry::expense_refund(user_id, category_id, balance_type, amount_in_cents),
    )
    .await
}

/// Replays a category step reported by [`Error::PartialFailure`].
#[instrument(skip(db))]
pub async fn retry_category_adjustment(
    db: &DatabaseConnection,
    adjustment: &CategoryAdjustment,
) -> Result<i64> {
    validate_amount(adjustment.amount)?;

    let total = retry_on_conflict(move || async move {
        let txn = db.begin().await?;
        let outcome = category::update_category_total(&txn, adjustment).await;
        settle(txn, outcome).await
    })
    .await?;

    info!(%adjustment, total, "Category adjustment replayed");
    Ok(total)
}
