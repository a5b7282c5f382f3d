//! Unified error type for the ledger.
//!
//! Every fallible operation returns [`Result`]. Variants are grouped into the
//! coarse [`ErrorKind`] taxonomy so an outer shell can decide how to respond
//! (reject, report not-found, retry, reconcile) without matching every variant.

use crate::core::types::{BalanceType, CategoryAdjustment};
use thiserror::Error;

/// Coarse classification of [`Error`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller error; nothing was written.
    InvalidInput,
    /// Targeted balance too low for the requested subtraction; nothing was written.
    InsufficientFunds,
    /// Budget, category or expense does not exist for the user.
    NotFound,
    /// The budget side may have been written while the category side was not.
    PartialFailure,
    /// Persistence or configuration failure.
    Storage,
}

/// All errors produced by the ledger.
#[derive(Debug, Error)]
pub enum Error {
    /// Amount is zero, negative, or otherwise unusable for the operation.
    #[error("Invalid amount: {amount} cents")]
    InvalidAmount {
        /// The rejected amount in cents
        amount: i64,
    },

    /// A balance type string that is neither `checking` nor `savings`.
    #[error("Invalid balance type: {value}")]
    InvalidBalanceType {
        /// The rejected input
        value: String,
    },

    /// A direction string that is neither `add` nor `subtract`.
    #[error("Invalid update direction: {value}")]
    InvalidUpdateDirection {
        /// The rejected input
        value: String,
    },

    /// Blank names and similar field-level input problems.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the input
        message: String,
    },

    /// A subtraction larger than the targeted balance.
    #[error("Insufficient funds in {balance_type} account: available {available}, required {required}")]
    InsufficientFunds {
        /// Account the subtraction targeted
        balance_type: BalanceType,
        /// Balance before the operation
        available: i64,
        /// Requested subtraction
        required: i64,
    },

    /// The user has no budget; budgets are never created implicitly.
    #[error("No budget found for user {user_id}")]
    BudgetNotFound {
        /// Owner that has no budget
        user_id: String,
    },

    /// The user already has a budget.
    #[error("A budget already exists for user {user_id}")]
    BudgetAlreadyExists {
        /// Owner that already has a budget
        user_id: String,
    },

    /// The category does not exist or belongs to another user.
    #[error("Category not found: {category_id}")]
    CategoryNotFound {
        /// Missing category
        category_id: String,
    },

    /// The expense does not exist or belongs to another user.
    #[error("Expense not found: {expense_id}")]
    ExpenseNotFound {
        /// Missing expense
        expense_id: String,
    },

    /// A compare-and-swap write found the row changed since it was read.
    #[error("Concurrent update conflict on {entity} {id}")]
    Conflict {
        /// Table the conflict happened on
        entity: &'static str,
        /// Row identifier
        id: String,
    },

    /// The category step failed and the budget write could not be rolled back.
    #[error("Partial failure: budget updated but category adjustment {adjustment} was not applied: {source}")]
    PartialFailure {
        /// The skipped step, replayable with `retry_category_adjustment`
        adjustment: CategoryAdjustment,
        /// Why the category step failed
        source: Box<Error>,
    },

    /// Unreadable or malformed seed configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Any failure reported by the database layer.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl Error {
    /// Classifies this error into the ledger's error taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount { .. }
            | Self::InvalidBalanceType { .. }
            | Self::InvalidUpdateDirection { .. }
            | Self::InvalidInput { .. }
            | Self::BudgetAlreadyExists { .. } => ErrorKind::InvalidInput,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::BudgetNotFound { .. }
            | Self::CategoryNotFound { .. }
            | Self::ExpenseNotFound { .. } => ErrorKind::NotFound,
            Self::PartialFailure { .. } => ErrorKind::PartialFailure,
            Self::Conflict { .. }
            | Self::Config { .. }
            | Self::Database(_) => ErrorKind::Storage,
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CategoryOp;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::InvalidAmount { amount: 0 }.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            Error::from(sea_orm::DbErr::Custom("disk full".to_string())).kind(),
            ErrorKind::Storage
        );
        assert_eq!(
            Error::InvalidBalanceType {
                value: "brokerage".to_string()
            }
            .kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            Error::InsufficientFunds {
                balance_type: BalanceType::Checking,
                available: 7000,
                required: 8000,
            }
            .kind(),
            ErrorKind::InsufficientFunds
        );
        assert_eq!(
            Error::ExpenseNotFound {
                expense_id: "e1".to_string()
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::Conflict {
                entity: "budget",
                id: "b1".to_string()
            }
            .kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn test_partial_failure_carries_adjustment() {
        let err = Error::PartialFailure {
            adjustment: CategoryAdjustment {
                user_id: "user1".to_string(),
                category_id: "c1".to_string(),
                amount: 3000,
                op: CategoryOp::Increment,
            },
            source: Box::new(Error::CategoryNotFound {
                category_id: "c1".to_string(),
            }),
        };
        assert_eq!(err.kind(), ErrorKind::PartialFailure);
        let message = err.to_string();
        assert!(message.contains("increment 3000 on category c1 for user user1"));
        assert!(message.contains("Category not found: c1"));
    }

    #[test]
    fn test_insufficient_funds_message() {
        let err = Error::InsufficientFunds {
            balance_type: BalanceType::Savings,
            available: 0,
            required: 1,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds in savings account: available 0, required 1"
        );
    }
}
