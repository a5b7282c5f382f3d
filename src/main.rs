use dotenvy::dotenv;
use ledger_buddy::{
    config::{database, seed},
    core::reconcile,
    errors::Result,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // non-fatal, env vars can be set externally
    dotenv().ok();

    let database_url = database::get_database_url();
    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database tables ready."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    let seed_path = seed::get_seed_path();
    if let Some(seed_config) = seed::load_seed(&seed_path)? {
        seed::seed_ledger(&db, &seed_config)
            .await
            .inspect_err(|e| error!("Failed to seed ledger from {}: {}", seed_path, e))?;
    }

    let reports = reconcile::reconcile_all(&db).await?;
    let drifted = reports.iter().filter(|r| !r.is_consistent()).count();
    if drifted == 0 {
        info!(budgets = reports.len(), "All ledgers consistent");
    } else {
        warn!(budgets = reports.len(), drifted, "Ledger drift found; see warnings above");
    }

    Ok(())
}
