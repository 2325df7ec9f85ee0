//! In-memory [`RecordSource`] and [`VersionStore`] for tests and embedding.
//!
//! Uses `Vec`s behind `std::sync::RwLock`. The version check and push in
//! [`VersionStore::append`] happen under one write guard, which gives the
//! compare-and-swap semantics the trait requires.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;

use crate::models::{NewSnapshot, RawRecord, SchemaSnapshot};

use super::{AppendOutcome, RecordSource, VersionStore};

pub struct InMemoryStore {
    records: RwLock<Vec<RawRecord>>,
    versions: RwLock<Vec<SchemaSnapshot>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            versions: RwLock::new(Vec::new()),
        }
    }

    /// Append a raw record. Later pushes count as more recent.
    pub fn push_record(&self, record: RawRecord) -> Result<()> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records.push(record);
        Ok(())
    }

    pub fn record_count(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

#[async_trait]
impl RecordSource for InMemoryStore {
    async fn recent_payloads(&self, limit: usize) -> Result<Vec<serde_json::Value>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records
            .iter()
            .rev()
            .take(limit)
            .map(|r| r.payload.clone())
            .collect())
    }
}

#[async_trait]
impl VersionStore for InMemoryStore {
    async fn latest(&self) -> Result<Option<SchemaSnapshot>> {
        let versions = self.versions.read().map_err(|_| poisoned())?;
        Ok(versions.last().cloned())
    }

    async fn get_version(&self, version: i64) -> Result<Option<SchemaSnapshot>> {
        let versions = self.versions.read().map_err(|_| poisoned())?;
        Ok(versions.iter().find(|s| s.version == version).cloned())
    }

    async fn list_versions(&self) -> Result<Vec<SchemaSnapshot>> {
        let versions = self.versions.read().map_err(|_| poisoned())?;
        Ok(versions.clone())
    }

    async fn append(
        &self,
        snapshot: NewSnapshot,
        expected_latest: Option<i64>,
    ) -> Result<AppendOutcome> {
        let mut versions = self.versions.write().map_err(|_| poisoned())?;
        let current = versions.last().map(|s| s.version);
        if current != expected_latest {
            return Ok(AppendOutcome::Conflict { current });
        }

        let stored = snapshot.into_snapshot(expected_latest.unwrap_or(0) + 1, Utc::now());
        versions.push(stored.clone());
        Ok(AppendOutcome::Created(stored))
    }
}
