//! Schema inference and versioning.
//!
//! [`VersionManager`] runs one inference pass: sample the most recent raw
//! payloads, profile them, build a candidate field mapping, and append a
//! new version only when the candidate's structure differs from the latest
//! stored snapshot.
//!
//! # Concurrency
//!
//! Passes may overlap (every ingestion event can trigger one). Version
//! numbers are never computed by read-then-write here: the store's
//! conditional [`VersionStore::append`] decides. Each attempt reads the
//! latest snapshot first and samples second. A pass that loses the race
//! starts a fresh attempt: it stops if the new latest already has the
//! structure of a fresh sample, and appends against it otherwise.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::builder::{build_fields, structural_fingerprint};
use crate::collect::{collect, CollectOptions, StatsMap};
use crate::diff::{diff_fields, SchemaDiff};
use crate::error::{SchemaError, SchemaResult};
use crate::models::{NewSnapshot, SchemaSnapshot};
use crate::store::{AppendOutcome, RecordSource, VersionStore};
use crate::value::Value;

/// Tuning knobs for [`VersionManager`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Sample size used by [`VersionManager::infer_default`].
    pub default_sample_size: usize,
    pub array_sample_cap: usize,
    /// Extra append attempts after a lost race before giving up quietly.
    pub max_conflict_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_sample_size: 30,
            array_sample_cap: 3,
            max_conflict_retries: 5,
        }
    }
}

pub struct VersionManager {
    records: Arc<dyn RecordSource>,
    versions: Arc<dyn VersionStore>,
    config: EngineConfig,
}

impl VersionManager {
    pub fn new(
        records: Arc<dyn RecordSource>,
        versions: Arc<dyn VersionStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            records,
            versions,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// [`infer_and_maybe_create_version`](Self::infer_and_maybe_create_version)
    /// with the configured default sample size.
    pub async fn infer_default(&self) -> SchemaResult<Option<SchemaSnapshot>> {
        self.infer_and_maybe_create_version(self.config.default_sample_size)
            .await
    }

    /// Sample up to `sample_size` recent payloads and append a new schema
    /// version if their structure differs from the latest one.
    ///
    /// Returns the created snapshot, or `None` when nothing was sampled or
    /// the schema is unchanged.
    pub async fn infer_and_maybe_create_version(
        &self,
        sample_size: usize,
    ) -> SchemaResult<Option<SchemaSnapshot>> {
        self.infer_with_notes(sample_size, None).await
    }

    /// Like [`infer_and_maybe_create_version`](Self::infer_and_maybe_create_version),
    /// attaching `notes` to a newly created snapshot.
    pub async fn infer_with_notes(
        &self,
        sample_size: usize,
        notes: Option<String>,
    ) -> SchemaResult<Option<SchemaSnapshot>> {
        let mut attempts = 0u32;

        loop {
            // Read the latest version before sampling, so any version
            // committed from an older window is already visible here.
            let latest = self.versions.latest().await?;
            let Some(candidate) = self.build_candidate(sample_size, notes.clone()).await? else {
                debug!(sample_size, "no raw records to sample; skipping inference");
                return Ok(None);
            };

            if let Some(ref current) = latest {
                if structural_fingerprint(&current.fields) == candidate.fingerprint {
                    debug!(
                        version = current.version,
                        fingerprint = %candidate.fingerprint,
                        "schema unchanged"
                    );
                    return Ok(None);
                }
            }

            let expected = latest.as_ref().map(|s| s.version);
            match self.versions.append(candidate, expected).await? {
                AppendOutcome::Created(snapshot) => {
                    info!(
                        version = snapshot.version,
                        fields = snapshot.fields.len(),
                        samples = snapshot.total_samples,
                        fingerprint = %snapshot.fingerprint,
                        "new schema version created"
                    );
                    return Ok(Some(snapshot));
                }
                AppendOutcome::Conflict { current } => {
                    if attempts >= self.config.max_conflict_retries {
                        warn!(
                            expected = ?expected,
                            current = ?current,
                            attempts,
                            "giving up on schema version append after repeated conflicts"
                        );
                        return Ok(None);
                    }
                    attempts += 1;
                    debug!(
                        expected = ?expected,
                        current = ?current,
                        attempt = attempts,
                        "schema version conflict; re-sampling against the new latest"
                    );
                }
            }
        }
    }

    /// Profile the sample window into a snapshot candidate without touching
    /// the version history. `None` when there is nothing to sample.
    pub async fn build_candidate(
        &self,
        sample_size: usize,
        notes: Option<String>,
    ) -> SchemaResult<Option<NewSnapshot>> {
        if sample_size == 0 {
            return Ok(None);
        }
        let payloads = self.records.recent_payloads(sample_size).await?;
        if payloads.is_empty() {
            return Ok(None);
        }

        let opts = CollectOptions {
            array_sample_cap: self.config.array_sample_cap,
        };
        let mut stats = StatsMap::new();
        for payload in &payloads {
            collect(&Value::from(payload), &mut stats, &opts);
        }

        let total_samples = payloads.len() as u64;
        let fields = build_fields(&stats, total_samples);
        let fingerprint = structural_fingerprint(&fields);
        Ok(Some(NewSnapshot {
            fields,
            total_samples,
            notes,
            fingerprint,
        }))
    }

    pub async fn get_version(&self, version: i64) -> SchemaResult<SchemaSnapshot> {
        self.versions
            .get_version(version)
            .await?
            .ok_or(SchemaError::VersionNotFound(version))
    }

    pub async fn latest(&self) -> SchemaResult<Option<SchemaSnapshot>> {
        Ok(self.versions.latest().await?)
    }

    /// All snapshots in ascending version order.
    pub async fn history(&self) -> SchemaResult<Vec<SchemaSnapshot>> {
        Ok(self.versions.list_versions().await?)
    }

    /// Diff two stored versions, `version_a` being the "before" side.
    pub async fn diff(&self, version_a: i64, version_b: i64) -> SchemaResult<SchemaDiff> {
        let a = self.get_version(version_a).await?;
        let b = self.get_version(version_b).await?;
        Ok(diff_fields(&a.fields, &b.fields))
    }
}
