//! Database configuration - connection setup and schema creation.
//!
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the
//! Rust models without hand-written SQL.

use crate::entities::{Budget, Expense, ExpenseCategory};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::info;

/// Used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://ledger_buddy.sqlite?mode=rwc";

/// Reads `DATABASE_URL`, falling back to a local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Connects to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    info!(database_url, "Connected to database");
    Ok(db)
}

/// Creates the budget, expense and category tables if they do not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut statements = [
        schema.create_table_from_entity(Budget),
        schema.create_table_from_entity(ExpenseCategory),
        schema.create_table_from_entity(Expense),
    ];

    for statement in &mut statements {
        statement.if_not_exists();
        db.execute(builder.build(&*statement)).await?;
    }

    Ok(())
}
