//! Raw-record ingestion.
//!
//! Documents arrive already converted to JSON by upstream extractors. Each
//! one is written as an immutable raw record, then an inference job is
//! queued for the background worker (see [`crate::worker`]). The write is
//! the only thing that can fail an ingestion.
//!
//! Input files for `shx ingest`:
//!
//! | Extension | Contents |
//! |-----------|----------|
//! | `.json` | one document, or a top-level array of documents |
//! | `.jsonl` / `.ndjson` | one document per non-empty line |
//!
//! A directory is walked recursively for all of the above.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;
use walkdir::WalkDir;

use schema_harness_core::{RawRecord, VersionManager};

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;
use crate::worker::{spawn_inference_worker, InferenceQueue};

/// Write one raw record and return it.
pub async fn write_record(
    store: &SqliteStore,
    source: &str,
    payload: serde_json::Value,
) -> Result<RawRecord> {
    let record = RawRecord {
        id: Uuid::new_v4().to_string(),
        source: source.to_string(),
        payload,
        ingested_at: Utc::now(),
    };
    store.insert_record(&record).await?;
    Ok(record)
}

/// The ingestion path: record write plus inference hand-off.
#[derive(Clone)]
pub struct Ingestor {
    store: SqliteStore,
    queue: InferenceQueue,
}

impl Ingestor {
    pub fn new(store: SqliteStore, queue: InferenceQueue) -> Self {
        Self { store, queue }
    }

    /// Persist `payload` and queue a background inference pass. Returns the
    /// new record id as soon as the write commits.
    pub async fn ingest(&self, source: &str, payload: serde_json::Value) -> Result<String> {
        let record = write_record(&self.store, source, payload).await?;
        let status = self.queue.enqueue_default();
        debug!(id = %record.id, source, ?status, "raw record written");
        Ok(record.id)
    }
}

/// Load documents from a file or directory.
pub fn load_documents(path: &Path) -> Result<Vec<serde_json::Value>> {
    if path.is_dir() {
        let mut files: Vec<PathBuf> = WalkDir::new(path)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_document_file(e.path()))
            .map(|e| e.into_path())
            .collect();
        files.sort();

        let mut docs = Vec::new();
        for file in files {
            docs.extend(load_file(&file)?);
        }
        Ok(docs)
    } else {
        load_file(path)
    }
}

fn is_document_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("json") | Some("jsonl") | Some("ndjson")
    )
}

fn load_file(path: &Path) -> Result<Vec<serde_json::Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("jsonl") | Some("ndjson") => content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line)
                    .with_context(|| format!("{}:{}: invalid JSON", path.display(), i + 1))
            })
            .collect(),
        Some("json") => {
            let value: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("{}: invalid JSON", path.display()))?;
            match value {
                serde_json::Value::Array(items) => Ok(items),
                other => Ok(vec![other]),
            }
        }
        _ => bail!(
            "Unsupported file type: {} (expected .json, .jsonl or .ndjson)",
            path.display()
        ),
    }
}

/// CLI entry point for `shx ingest`.
pub async fn run_ingest(
    config: &Config,
    path: &Path,
    source: &str,
    sample_size: Option<usize>,
) -> Result<()> {
    let docs = load_documents(path)?;

    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let mut engine_config = config.inference.engine_config();
    if let Some(n) = sample_size {
        engine_config.default_sample_size = n;
    }
    let manager = Arc::new(VersionManager::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        engine_config,
    ));
    let (queue, worker) = spawn_inference_worker(manager.clone(), config.inference.queue_capacity);
    let ingestor = Ingestor::new(store, queue);

    let mut written = 0u64;
    for doc in docs {
        ingestor.ingest(source, doc).await?;
        written += 1;
    }

    // Close the queue and let the worker drain before reporting.
    drop(ingestor);
    let report = worker.await.context("inference worker panicked")?;
    let latest = manager.latest().await?;

    println!("ingest {}", path.display());
    println!("  records written: {}", written);
    println!("  inference passes: {}", report.jobs_run);
    println!("  versions created: {}", report.versions_created);
    if report.failures > 0 {
        println!("  inference failures: {}", report.failures);
    }
    match latest {
        Some(s) => println!("  latest schema version: {}", s.version),
        None => println!("  latest schema version: none"),
    }
    println!("ok");

    pool.close().await;
    Ok(())
}
