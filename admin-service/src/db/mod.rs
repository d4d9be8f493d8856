//! PostgreSQL connection management.
//!
//! The process holds a single pool, created on first use. Concurrent first
//! callers await the same initialisation future, so at most one pool exists.

mod error;

pub use error::StoreError;

use crate::config::DatabaseConfig;
use secrecy::ExposeSecret;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tokio::sync::OnceCell;

static POOL: OnceCell<PgPool> = OnceCell::const_new();

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
}

/// Process-wide pool, connecting on the first call.
pub async fn pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = POOL
        .get_or_try_init(|| async {
            tracing::info!("Connecting to PostgreSQL...");
            let pool = pool_options(config)
                .connect(config.url.expose_secret())
                .await?;
            tracing::info!("Successfully connected to PostgreSQL");
            Ok::<_, sqlx::Error>(pool)
        })
        .await?;

    Ok(pool.clone())
}

/// A pool that opens connections only when a query runs. Used where no
/// database may be reachable, e.g. routing tests.
pub fn lazy_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    pool_options(config).connect_lazy(config.url.expose_secret())
}

/// Run database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

/// Close the shared pool, waiting for checked-out connections to return.
pub async fn close() {
    if let Some(pool) = POOL.get() {
        pool.close().await;
        tracing::info!("Database pool closed");
    }
}
