//! Database pool, migrations and the lot-store lock

use std::time::Duration;

use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;
use crate::error::AppResult;

/// Advisory lock key serializing every lot-store mutation
pub const LOT_STORE_LOCK_KEY: i64 = 0x5A41_494B_4F4C;

/// Create the connection pool
pub async fn connect(config: &DatabaseConfig) -> AppResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.url)
        .await?;
    Ok(pool)
}

/// Apply embedded migrations; safe to run repeatedly
pub async fn migrate(pool: &PgPool) -> AppResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Take the transaction-scoped lot-store lock.
///
/// Held until the surrounding transaction commits or rolls back. Re-entrant
/// within one transaction.
pub async fn lock_lot_store(conn: &mut PgConnection) -> AppResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(LOT_STORE_LOCK_KEY)
        .execute(conn)
        .await?;
    Ok(())
}
