//! Funds validator - rejects subtractions the current snapshot cannot cover.
//!
//! Runs before any write of the operation it guards; refunds and deposits
//! are never validated since they cannot drive a balance negative.

use crate::{
    core::types::BalanceType,
    entities::budget,
    errors::{Error, Result},
};
use tracing::debug;

/// Rejects non-positive amounts.
pub fn validate_amount(amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// Checks that the targeted balance in `snapshot` covers `amount`.
///
/// # Errors
/// * [`Error::InvalidAmount`] when `amount <= 0`
/// * [`Error::InsufficientFunds`] when the targeted balance is below `amount`
pub fn validate_sufficient_funds(
    snapshot: &budget::Model,
    balance_type: BalanceType,
    amount: i64,
) -> Result<()> {
    validate_amount(amount)?;

    let available = match balance_type {
        BalanceType::Checking => snapshot.checking_balance,
        BalanceType::Savings => snapshot.savings_balance,
    };

    if available < amount {
        debug!(
            user_id = %snapshot.user_id,
            %balance_type,
            available,
            amount,
            "Rejecting subtraction for insufficient funds"
        );
        return Err(Error::InsufficientFunds {
            balance_type,
            available,
            required: amount,
        });
    }

    Ok(())
}
