//! Balance calculator - pure arithmetic over budget snapshots.
//!
//! Nothing here touches the database. Manual adjustments and expense-driven
//! changes share [`recompute_budget_aggregate`], with [`OperationKind`]
//! selecting whether `total_spent` moves. All arithmetic is checked; an
//! amount that would overflow a balance is rejected as
//! [`Error::InvalidAmount`] before anything is persisted.

use crate::{
    core::types::{BalanceType, OperationKind, UpdateDirection},
    entities::budget,
    errors::{Error, Result},
};

/// Applies a signed change to a balance. No clamping happens at this level.
///
/// # Errors
/// [`Error::InvalidAmount`] if the result does not fit in an `i64`.
pub fn apply_delta(current_balance: i64, amount: i64, direction: UpdateDirection) -> Result<i64> {
    let next = match direction {
        UpdateDirection::Add => current_balance.checked_add(amount),
        UpdateDirection::Subtract => current_balance.checked_sub(amount),
    };
    next.ok_or(Error::InvalidAmount { amount })
}

/// Sums two balances, rejecting `amount` if the sum overflows.
pub(crate) fn checked_sum(left: i64, right: i64, amount: i64) -> Result<i64> {
    left.checked_add(right).ok_or(Error::InvalidAmount { amount })
}

/// Computes the budget that results from moving `amount` in `direction` on one balance.
///
/// The returned value is a copy of `snapshot` with:
/// * the targeted balance moved by `amount`,
/// * `budget_remaining` recomputed as checking + savings,
/// * `budget_total` moved in the same direction,
/// * `total_spent` moved the opposite way for [`OperationKind::ExpenseFlow`] only,
///   clamped at zero.
///
/// Identity fields, `version` and timestamps are copied unchanged; the store
/// bumps them when persisting.
pub fn recompute_budget_aggregate(
    snapshot: &budget::Model,
    direction: UpdateDirection,
    balance_type: BalanceType,
    amount: i64,
    kind: OperationKind,
) -> Result<budget::Model> {
    let mut next = snapshot.clone();

    match balance_type {
        BalanceType::Checking => {
            next.checking_balance = apply_delta(snapshot.checking_balance, amount, direction)?;
        }
        BalanceType::Savings => {
            next.savings_balance = apply_delta(snapshot.savings_balance, amount, direction)?;
        }
    }

    next.budget_remaining = checked_sum(next.checking_balance, next.savings_balance, amount)?;
    next.budget_total = apply_delta(snapshot.budget_total, amount, direction)?;

    if kind == OperationKind::ExpenseFlow {
        // spending adds to total_spent, a refund takes it back
        next.total_spent =
            apply_delta(snapshot.total_spent, amount, direction.reversed())?.max(0);
    }

    Ok(next)
}
