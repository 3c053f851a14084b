use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::error::Result;

pub type DbPool = Pool<Sqlite>;

/// Open (or create) the SQLite store with foreign-key enforcement on. The
/// pool is capped at one connection: the run owns the store exclusively.
pub async fn connect(path: &Path) -> Result<DbPool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// In-memory store for tests. Lifetimes are pinned so the single connection
/// (and with it the database) survives pool idling.
pub async fn connect_in_memory() -> Result<DbPool> {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Execute the DDL script (multi-statement) against the store.
pub async fn apply_schema(pool: &DbPool, schema_path: &Path) -> Result<()> {
    let script = std::fs::read_to_string(schema_path)?;
    sqlx::raw_sql(&script).execute(pool).await?;
    Ok(())
}
