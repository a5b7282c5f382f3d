//! Seed file loading - opening budgets and categories from TOML.
//!
//! ```toml
//! [[budgets]]
//! user_id = "alice"
//! checking = 250000
//! savings = 1000000
//!
//! [[categories]]
//! user_id = "alice"
//! name = "Groceries"
//! description = "Food and household"
//! ```
//!
//! Amounts are in cents. Seeding skips budgets and categories that already
//! exist, so it is safe to run on every start.

use crate::{
    core::{budget, category},
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Used when `LEDGER_SEED` is not set.
pub const DEFAULT_SEED_PATH: &str = "seed.toml";

/// The whole seed file.
#[derive(Debug, Default, Deserialize)]
pub struct SeedConfig {
    /// Budgets to create
    #[serde(default)]
    pub budgets: Vec<BudgetSeed>,
    /// Categories to create
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
}

/// Opening balances for one user's budget.
#[derive(Debug, Deserialize, Clone)]
pub struct BudgetSeed {
    /// Owner of the budget
    pub user_id: String,
    /// Opening checking balance in cents
    pub checking: i64,
    /// Opening savings balance in cents
    pub savings: i64,
}

/// A category to create for a user.
#[derive(Debug, Deserialize, Clone)]
pub struct CategorySeed {
    /// Owner of the category
    pub user_id: String,
    /// Category name, unique per user for seeding purposes
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
}

/// Reads `LEDGER_SEED`, falling back to `seed.toml`.
#[must_use]
pub fn get_seed_path() -> String {
    std::env::var("LEDGER_SEED").unwrap_or_else(|_| DEFAULT_SEED_PATH.to_string())
}

/// Loads the seed file. A missing file means there is nothing to seed.
///
/// # Errors
/// [`Error::Config`] if the file exists but cannot be read or parsed.
pub fn load_seed<P: AsRef<Path>>(path: P) -> Result<Option<SeedConfig>> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(?path, "No seed file found");
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read seed file {}: {e}", path.display()),
    })?;

    toml::from_str(&contents).map(Some).map_err(|e| Error::Config {
        message: format!("Failed to parse seed file {}: {e}", path.display()),
    })
}

/// Creates the seeded budgets and categories that do not exist yet.
pub async fn seed_ledger(db: &DatabaseConnection, seed: &SeedConfig) -> Result<()> {
    let mut budgets_created = 0;
    for entry in &seed.budgets {
        match budget::create_budget(db, &entry.user_id, entry.checking, entry.savings).await {
            Ok(_) => budgets_created += 1,
            Err(Error::BudgetAlreadyExists { user_id }) => {
                debug!(user_id, "Budget already exists, skipping");
            }
            Err(e) => return Err(e),
        }
    }

    let mut categories_created = 0;
    for entry in &seed.categories {
        if category::get_category_by_name(db, &entry.user_id, &entry.name)
            .await?
            .is_some()
        {
            debug!(user_id = %entry.user_id, name = %entry.name, "Category already exists, skipping");
            continue;
        }
        category::create_category(db, &entry.user_id, &entry.name, &entry.description).await?;
        categories_created += 1;
    }

    info!(budgets_created, categories_created, "Seeding complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;

    const SEED: &str = r#"
        [[budgets]]
        user_id = "alice"
        checking = 250000
        savings = 1000000

        [[categories]]
        user_id = "alice"
        name = "Groceries"
        description = "Food and household"

        [[categories]]
        user_id = "alice"
        name = "Rent"
    "#;

    #[test]
    fn test_parse_seed_config() {
        let seed: SeedConfig = toml::from_str(SEED).unwrap();
        assert_eq!(seed.budgets.len(), 1);
        assert_eq!(seed.budgets[0].user_id, "alice");
        assert_eq!(seed.budgets[0].checking, 250_000);
        assert_eq!(seed.budgets[0].savings, 1_000_000);

        assert_eq!(seed.categories.len(), 2);
        assert_eq!(seed.categories[0].name, "Groceries");
        assert_eq!(seed.categories[1].description, "");
    }

    #[test]
    fn test_load_missing_seed_file() -> Result<()> {
        let seed = load_seed("definitely/not/here/seed.toml")?;
        assert!(seed.is_none());
        Ok(())
    }

    #[test]
    fn test_load_malformed_seed_file() {
        let path = std::env::temp_dir().join(format!("seed-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[[budgets]]\nuser_id = 7\n").unwrap();

        let result = load_seed(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[tokio::test]
    async fn test_seed_ledger_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let seed: SeedConfig = toml::from_str(SEED).unwrap();

        seed_ledger(&db, &seed).await?;
        seed_ledger(&db, &seed).await?;

        let budget = budget::get_budget(&db, "alice").await?;
        assert_eq!(budget.budget_remaining, 1_250_000);
        let categories = category::get_categories(&db, "alice").await?;
        assert_eq!(categories.len(), 2);

        Ok(())
    }
}
