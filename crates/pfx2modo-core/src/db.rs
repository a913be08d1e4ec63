use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::debug;

use crate::config::ConnectionConfig;
use crate::error::{MigrateError, Result};

/// Open a connection pool for a named connection.
///
/// The name is only used in error messages; connection URLs can carry
/// credentials and are never echoed back.
pub async fn connect(name: &str, config: &ConnectionConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.pool_size)
        .acquire_timeout(Duration::from_secs(config.pool_timeout_secs))
        .connect(&config.url)
        .await
        .map_err(|e| MigrateError::Database(format!("Failed to connect to '{}': {}", name, e)))?;

    debug!("Connected to '{}'", name);
    Ok(pool)
}

/// Check database connectivity.
pub async fn health_check(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| MigrateError::Database(format!("Health check failed: {}", e)))?;
    Ok(())
}
