//! Storage abstraction for Schema Harness.
//!
//! The engine depends on two collaborators:
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`RecordSource`] | Read the most recently ingested raw payloads |
//! | [`VersionStore`] | Read schema history and append new versions |
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//! [`memory::InMemoryStore`] implements both for tests and embedding; the
//! SQLite implementation lives in the `schema-harness` crate.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{NewSnapshot, SchemaSnapshot};

/// Result of a conditional append.
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    /// The snapshot was persisted under the returned version.
    Created(SchemaSnapshot),
    /// Another writer appended first. `current` is the latest version the
    /// store holds now, if it could tell.
    Conflict { current: Option<i64> },
}

/// Source of raw documents to sample.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Up to `limit` payloads, most recently ingested first.
    async fn recent_payloads(&self, limit: usize) -> Result<Vec<serde_json::Value>>;
}

/// Append-only history of schema snapshots.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// The snapshot with the highest version, if any.
    async fn latest(&self) -> Result<Option<SchemaSnapshot>>;

    async fn get_version(&self, version: i64) -> Result<Option<SchemaSnapshot>>;

    /// Every stored snapshot in ascending version order.
    async fn list_versions(&self) -> Result<Vec<SchemaSnapshot>>;

    /// Persist `snapshot` as version `expected_latest + 1` (or 1 when
    /// `expected_latest` is `None`), but only if the store's latest version
    /// is still `expected_latest`. Must be a single atomic operation: of
    /// several concurrent appends against the same `expected_latest`, at
    /// most one returns [`AppendOutcome::Created`].
    async fn append(
        &self,
        snapshot: NewSnapshot,
        expected_latest: Option<i64>,
    ) -> Result<AppendOutcome>;
}
