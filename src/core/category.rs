//! Expense category business logic - running totals and category lifecycle.
//!
//! The running total (`total_sum`) only moves through [`update_category_total`],
//! which the ledger coordinator calls inside the same database transaction as
//! the budget write.

use crate::{
    core::{
        store,
        types::{CategoryAdjustment, CategoryOp},
    },
    entities::{Expense, ExpenseCategory, expense, expense_category},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Moves a running total by `amount`. Decrements clamp at zero.
///
/// # Errors
/// [`Error::InvalidAmount`] if an increment would overflow the total.
pub fn adjust_category_total(current_total: i64, amount: i64, op: CategoryOp) -> Result<i64> {
    match op {
        CategoryOp::Increment => current_total
            .checked_add(amount)
            .ok_or(Error::InvalidAmount { amount }),
        CategoryOp::Decrement => Ok(current_total.saturating_sub(amount).max(0)),
    }
}

/// Reads, adjusts and writes back one category total.
///
/// # Errors
/// * [`Error::CategoryNotFound`] if the category does not belong to the user
/// * [`Error::Conflict`] if the category changed between read and write
pub async fn update_category_total<C>(db: &C, adjustment: &CategoryAdjustment) -> Result<i64>
where
    C: ConnectionTrait,
{
    let current =
        store::get_category_total(db, &adjustment.user_id, &adjustment.category_id).await?;
    let new_total = adjust_category_total(current.total_sum, adjustment.amount, adjustment.op)?;

    store::put_category_total(
        db,
        &adjustment.user_id,
        &adjustment.category_id,
        current.version,
        new_total,
    )
    .await?;

    debug!(
        category_id = %adjustment.category_id,
        old_total = current.total_sum,
        new_total,
        "Category total updated"
    );
    Ok(new_total)
}

/// Creates a category with a zero running total.
pub async fn create_category(
    db: &DatabaseConnection,
    user_id: &str,
    name: &str,
    description: &str,
) -> Result<expense_category::Model> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput {
            message: "Category name cannot be empty".to_string(),
        });
    }

    let category = expense_category::ActiveModel {
        category_id: Set(Uuid::new_v4().to_string()),
        user_id: Set(user_id.to_string()),
        name: Set(name.trim().to_string()),
        description: Set(description.trim().to_string()),
        total_sum: Set(0),
        version: Set(0),
    };

    let result = category.insert(db).await?;
    info!(user_id, category_id = %result.category_id, "Created category");
    Ok(result)
}

/// Renames or re-describes one of the user's categories.
///
/// Only `name` and `description` are written; the running total and its
/// version are left to the ledger.
pub async fn update_category(
    db: &DatabaseConnection,
    user_id: &str,
    category_id: &str,
    name: &str,
    description: &str,
) -> Result<expense_category::Model> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput {
            message: "Category name cannot be empty".to_string(),
        });
    }

    let result = ExpenseCategory::update_many()
        .col_expr(
            expense_category::Column::Name,
            Expr::value(name.trim().to_string()),
        )
        .col_expr(
            expense_category::Column::Description,
            Expr::value(description.trim().to_string()),
        )
        .filter(expense_category::Column::CategoryId.eq(category_id))
        .filter(expense_category::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::CategoryNotFound {
            category_id: category_id.to_string(),
        });
    }

    let category = ExpenseCategory::find_by_id(category_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::CategoryNotFound {
            category_id: category_id.to_string(),
        })?;

    info!(user_id, category_id, "Updated category");
    Ok(category)
}

/// Lists the user's categories alphabetically.
pub async fn get_categories(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<expense_category::Model>> {
    ExpenseCategory::find()
        .filter(expense_category::Column::UserId.eq(user_id))
        .order_by_asc(expense_category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a category by name for the user. Returns None if it does not exist.
pub async fn get_category_by_name<C>(
    db: &C,
    user_id: &str,
    name: &str,
) -> Result<Option<expense_category::Model>>
where
    C: ConnectionTrait,
{
    ExpenseCategory::find()
        .filter(expense_category::Column::UserId.eq(user_id))
        .filter(expense_category::Column::Name.eq(name.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists the expenses tagged with one of the user's categories, newest first.
pub async fn get_category_expenses(
    db: &DatabaseConnection,
    user_id: &str,
    category_id: &str,
) -> Result<Vec<expense::Model>> {
    // surfaces NotFound for a foreign or missing category
    store::get_category_total(db, user_id, category_id).await?;

    Expense::find()
        .filter(expense::Column::UserId.eq(user_id))
        .filter(expense::Column::CategoryId.eq(category_id))
        .order_by_desc(expense::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes a category and every expense tagged with it.
///
/// The budget is left as it is: the deleted expenses stay counted in
/// `total_spent` and their amounts are not returned to the balances.
/// Returns the number of expenses removed.
pub async fn delete_category(
    db: &DatabaseConnection,
    user_id: &str,
    category_id: &str,
) -> Result<u64> {
    let txn = db.begin().await?;

    store::get_category_total(&txn, user_id, category_id).await?;

    let removed = Expense::delete_many()
        .filter(expense::Column::UserId.eq(user_id))
        .filter(expense::Column::CategoryId.eq(category_id))
        .exec(&txn)
        .await?
        .rows_affected;

    ExpenseCategory::delete_many()
        .filter(expense_category::Column::CategoryId.eq(category_id))
        .filter(expense_category::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if removed > 0 {
        warn!(
            user_id,
            category_id, removed, "Deleted category with expenses; budget totals not reversed"
        );
    } else {
        info!(user_id, category_id, "Deleted category");
    }
    Ok(removed)
}
