//! Ledger value types - the enumerations that parameterize every budget mutation.
//!
//! Caller-supplied strings are parsed into these closed types at the boundary,
//! so nothing past [`std::str::FromStr`] ever sees an unrecognized balance type
//! or direction.

use crate::errors::{Error, Result};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which of the two sub-accounts an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum BalanceType {
    /// Checking account
    #[sea_orm(string_value = "checking")]
    Checking,
    /// Savings account
    #[sea_orm(string_value = "savings")]
    Savings,
}

impl BalanceType {
    /// Lowercase name used in storage and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Savings => "savings",
        }
    }
}

impl fmt::Display for BalanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BalanceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "checking" => Ok(Self::Checking),
            "savings" => Ok(Self::Savings),
            _ => Err(Error::InvalidBalanceType {
                value: s.to_string(),
            }),
        }
    }
}

/// Whether an operation adds to or subtracts from a balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateDirection {
    /// Deposit or refund
    Add,
    /// Withdrawal or spend
    Subtract,
}

impl UpdateDirection {
    /// The direction that undoes this one.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Add => Self::Subtract,
            Self::Subtract => Self::Add,
        }
    }
}

impl fmt::Display for UpdateDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => f.write_str("add"),
            Self::Subtract => f.write_str("subtract"),
        }
    }
}

impl FromStr for UpdateDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "subtract" => Ok(Self::Subtract),
            _ => Err(Error::InvalidUpdateDirection {
                value: s.to_string(),
            }),
        }
    }
}

/// Distinguishes expense-driven budget changes from manual adjustments.
///
/// Only [`OperationKind::ExpenseFlow`] moves `total_spent`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    /// Recording or reversing a tracked expense
    ExpenseFlow,
    /// Depositing into or withdrawing from the budget directly
    DirectAdjustment,
}

/// How a category running total moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryOp {
    /// Expense recorded against the category
    Increment,
    /// Expense removed from the category; clamps at zero
    Decrement,
}

impl fmt::Display for CategoryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Increment => f.write_str("increment"),
            Self::Decrement => f.write_str("decrement"),
        }
    }
}

/// A pending change to one category running total.
///
/// Carried by [`Error::PartialFailure`] so the skipped step can be replayed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAdjustment {
    /// Owner of the category
    pub user_id: String,
    /// Category whose total moves
    pub category_id: String,
    /// Amount in cents
    pub amount: i64,
    /// Direction of the move
    pub op: CategoryOp,
}

impl fmt::Display for CategoryAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} on category {} for user {}",
            self.op, self.amount, self.category_id, self.user_id
        )
    }
}
