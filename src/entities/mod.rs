//! Entity module - Contains all SeaORM entity definitions for the database.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod budget;
pub mod expense;
pub mod expense_category;

// Re-export specific types to avoid conflicts
pub use budget::{Column as BudgetColumn, Entity as Budget, Model as BudgetModel};
pub use expense::{Column as ExpenseColumn, Entity as Expense, Model as ExpenseModel};
pub use expense_category::{
    Column as ExpenseCategoryColumn, Entity as ExpenseCategory, Model as ExpenseCategoryModel,
};
