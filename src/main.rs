use commission_ledger::config::Settings;
use commission_ledger::observability::{init_logging, init_metrics, LogConfig};
use commission_ledger::repositories::PgLedgerStore;
use commission_ledger::LedgerEngine;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;

    init_logging(&LogConfig::from(&settings.application))?;
    let _metrics = init_metrics()?;
    info!("Configuration loaded");

    // Connect to PostgreSQL
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(settings.database.pool_size)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&settings.database.url)
        .await?;

    info!("Database connection established");

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations applied successfully");

    let _engine = LedgerEngine::new(Arc::new(PgLedgerStore::new(pool)), &settings.ledger);

    info!(
        commission_rate = %settings.ledger.commission_rate,
        max_transaction_attempts = settings.ledger.max_transaction_attempts,
        "Commission ledger ready"
    );

    Ok(())
}
