//! Database pool setup and startup migrations.

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use atlas_core::Config;

pub async fn setup_database(config: &Config) -> Result<PgPool, anyhow::Error> {
    tracing::info!("connecting to database");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(600))
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .context("failed to run database migrations")?;
    tracing::info!(
        max_connections = config.db_max_connections,
        rls_enabled = config.rls_enabled,
        "database ready"
    );

    Ok(pool)
}
