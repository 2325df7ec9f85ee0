//! SQLite-backed [`RecordSource`] and [`VersionStore`].
//!
//! Raw records live in `raw_records`; schema history lives in
//! `schema_versions`, keyed by `version INTEGER PRIMARY KEY`.
//!
//! # Conditional append
//!
//! A new version is written by one `INSERT ... SELECT ... WHERE` statement
//! that only inserts while `MAX(version)` still equals the version the
//! caller last observed. SQLite serializes writers, so of several racing
//! appends against the same expectation exactly one inserts a row; the
//! others insert nothing (or hit the primary key) and get
//! [`AppendOutcome::Conflict`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use schema_harness_core::models::{NewSnapshot, RawRecord, SchemaSnapshot};
use schema_harness_core::store::{AppendOutcome, RecordSource, VersionStore};
use schema_harness_core::SchemaFields;

/// SQLite implementation of the engine's storage traits.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Persist one raw record.
    pub async fn insert_record(&self, record: &RawRecord) -> Result<()> {
        let payload_json = serde_json::to_string(&record.payload)?;
        sqlx::query(
            "INSERT INTO raw_records (id, source, payload_json, ingested_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.source)
        .bind(&payload_json)
        .bind(record.ingested_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to insert raw record {}", record.id))?;
        Ok(())
    }

    pub async fn record_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM raw_records")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn max_version(&self) -> Result<Option<i64>> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_versions")
            .fetch_one(&self.pool)
            .await?;
        Ok(max)
    }
}

fn ts_from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

fn row_to_snapshot(row: &SqliteRow) -> Result<SchemaSnapshot> {
    let version: i64 = row.get("version");
    let fields_json: String = row.get("fields_json");
    let fields: SchemaFields = serde_json::from_str(&fields_json)
        .with_context(|| format!("malformed fields_json for schema version {}", version))?;
    let total_samples: i64 = row.get("total_samples");
    let created_at: i64 = row.get("created_at");

    Ok(SchemaSnapshot {
        version,
        fields,
        total_samples: total_samples.max(0) as u64,
        notes: row.get("notes"),
        fingerprint: row.get("fingerprint"),
        created_at: ts_from_millis(created_at),
    })
}

const SNAPSHOT_COLUMNS: &str =
    "version, fields_json, fingerprint, total_samples, notes, created_at";

#[async_trait]
impl RecordSource for SqliteStore {
    async fn recent_payloads(&self, limit: usize) -> Result<Vec<serde_json::Value>> {
        let rows = sqlx::query(
            "SELECT id, payload_json FROM raw_records ORDER BY ingested_at DESC, rowid DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                let payload: String = row.get("payload_json");
                serde_json::from_str(&payload)
                    .with_context(|| format!("malformed payload in raw record {}", id))
            })
            .collect()
    }
}

#[async_trait]
impl VersionStore for SqliteStore {
    async fn latest(&self) -> Result<Option<SchemaSnapshot>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM schema_versions ORDER BY version DESC LIMIT 1",
            SNAPSHOT_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_snapshot).transpose()
    }

    async fn get_version(&self, version: i64) -> Result<Option<SchemaSnapshot>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM schema_versions WHERE version = ?",
            SNAPSHOT_COLUMNS
        ))
        .bind(version)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_snapshot).transpose()
    }

    async fn list_versions(&self) -> Result<Vec<SchemaSnapshot>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM schema_versions ORDER BY version ASC",
            SNAPSHOT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_snapshot).collect()
    }

    async fn append(
        &self,
        snapshot: NewSnapshot,
        expected_latest: Option<i64>,
    ) -> Result<AppendOutcome> {
        let version = expected_latest.unwrap_or(0) + 1;
        let created_at = Utc::now();
        let fields_json = serde_json::to_string(&snapshot.fields)?;

        let result = sqlx::query(
            r#"
            INSERT INTO schema_versions (version, fields_json, fingerprint, total_samples, notes, created_at)
            SELECT ?, ?, ?, ?, ?, ?
            WHERE (SELECT MAX(version) FROM schema_versions) IS ?
            "#,
        )
        .bind(version)
        .bind(&fields_json)
        .bind(&snapshot.fingerprint)
        .bind(snapshot.total_samples as i64)
        .bind(&snapshot.notes)
        .bind(created_at.timestamp_millis())
        .bind(expected_latest)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 1 => {
                // Round-trip the timestamp through storage precision.
                let created_at = ts_from_millis(created_at.timestamp_millis());
                Ok(AppendOutcome::Created(
                    snapshot.into_snapshot(version, created_at),
                ))
            }
            Ok(_) => {
                let current = self.max_version().await?;
                debug!(version, ?expected_latest, ?current, "conditional append matched no row");
                Ok(AppendOutcome::Conflict { current })
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                let current = self.max_version().await?;
                debug!(version, ?current, "schema version already taken");
                Ok(AppendOutcome::Conflict { current })
            }
            Err(e) => Err(e).with_context(|| format!("failed to append schema version {}", version)),
        }
    }
}
