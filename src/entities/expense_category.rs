//! Expense category entity - Groups expenses and keeps their running total.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expense_categories")]
pub struct Model {
    /// Opaque category identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub category_id: String,
    /// Owner of the category
    pub user_id: String,
    /// Display name (e.g., "Groceries")
    pub name: String,
    /// Optional longer description
    pub description: String,
    /// Running total of tagged expenses in cents, never negative
    pub total_sum: i64,
    /// Incremented on every total write
    pub version: i64,
}

/// Categories have no declared relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
