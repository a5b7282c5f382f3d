//! Expense entity - A single tracked spend drawn from checking or savings.
//!
//! `category_id` is a lookup-only reference; the category does not own the
//! expense row, so there is no declared relation.
use crate::core::types::BalanceType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    /// Opaque expense identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub expense_id: String,
    /// Owner of the expense
    pub user_id: String,
    /// Category the expense is tagged with, if any
    pub category_id: Option<String>,
    /// Free-form description
    pub description: String,
    /// Which balance the expense draws from
    pub expense_type: BalanceType,
    /// Amount in cents, always positive
    pub amount_in_cents: i64,
    /// When the expense was recorded
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
