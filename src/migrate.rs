//! Database schema migrations (idempotent).

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Connect and create all tables. Safe to run repeatedly.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate_pool(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create all tables on an existing pool.
pub async fn migrate_pool(pool: &SqlitePool) -> Result<()> {
    // Raw records: immutable ingested payloads, sampled newest first.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS raw_records (
            id TEXT PRIMARY KEY,
            source TEXT NOT NULL,
            payload_json TEXT NOT NULL,
            ingested_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Schema versions: the primary key on `version` is the uniqueness
    // constraint that makes concurrent appends safe.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_versions (
            version INTEGER PRIMARY KEY,
            fields_json TEXT NOT NULL,
            fingerprint TEXT NOT NULL,
            total_samples INTEGER NOT NULL,
            notes TEXT,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_raw_records_ingested_at ON raw_records(ingested_at DESC)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_raw_records_source ON raw_records(source)")
        .execute(pool)
        .await?;

    Ok(())
}
