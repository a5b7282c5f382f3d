//! Budget entity - The per-user aggregate of checking and savings balances.
//!
//! Exactly one budget exists per user. `budget_remaining` is derived
//! (checking + savings) and `total_spent` is the cumulative expense spend.
//! The `version` column backs the compare-and-swap writes in `core::store`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    /// Opaque budget identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub budget_id: String,
    /// Owner of the budget (one budget per user)
    #[sea_orm(unique)]
    pub user_id: String,
    /// Checking balance in cents
    pub checking_balance: i64,
    /// Savings balance in cents
    pub savings_balance: i64,
    /// Sum historically allocated to the budget, in cents
    pub budget_total: i64,
    /// Always `checking_balance + savings_balance`
    pub budget_remaining: i64,
    /// Cumulative expense spend in cents, never negative
    pub total_spent: i64,
    /// Incremented on every write
    pub version: i64,
    /// When the budget was last modified
    pub updated_at: DateTimeUtc,
    /// When the budget was set up
    pub created_at: DateTimeUtc,
}

/// Budgets reference no other table
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
