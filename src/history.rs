//! Schema history, inspection and diff commands.
//!
//! Read-only views over the version history (`shx history`, `shx show`,
//! `shx diff`) plus the administrative on-demand trigger (`shx infer`).

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;

use schema_harness_core::{SchemaDiff, SchemaError, SchemaSnapshot, VersionManager};

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// Open the database and build a [`VersionManager`] over it.
pub async fn open_manager(config: &Config) -> Result<(SqlitePool, VersionManager)> {
    let pool = db::connect(config).await?;
    let store = Arc::new(SqliteStore::new(pool.clone()));
    let manager = VersionManager::new(
        store.clone(),
        store,
        config.inference.engine_config(),
    );
    Ok((pool, manager))
}

/// JSON shape of `shx diff --json`.
#[derive(Debug, Serialize)]
pub struct DiffResponse {
    pub from: i64,
    pub to: i64,
    #[serde(flatten)]
    pub diff: SchemaDiff,
}

/// `shx infer`: run one inference pass now.
pub async fn run_infer(
    config: &Config,
    sample_size: Option<usize>,
    notes: Option<String>,
) -> Result<()> {
    let (pool, manager) = open_manager(config).await?;
    let sample_size = sample_size.unwrap_or(config.inference.sample_size);
    let created = manager.infer_with_notes(sample_size, notes).await;
    pool.close().await;

    match created? {
        Some(snapshot) => {
            println!("created schema version {}", snapshot.version);
            println!("  samples: {}", snapshot.total_samples);
            println!("  fields:  {}", snapshot.fields.len());
            println!("  fingerprint: {}", short_fingerprint(&snapshot.fingerprint));
        }
        None => println!("schema unchanged (no new version)"),
    }
    Ok(())
}

/// `shx history`: one line per version.
pub async fn run_history(config: &Config) -> Result<()> {
    let (pool, manager) = open_manager(config).await?;
    let history = manager.history().await;
    pool.close().await;
    let history = history?;

    if history.is_empty() {
        println!("No schema versions recorded yet.");
        return Ok(());
    }

    println!(
        "{:>7}  {:<20} {:>7} {:>6}  {:<12}  NOTES",
        "VERSION", "CREATED", "SAMPLES", "FIELDS", "FINGERPRINT"
    );
    for s in &history {
        println!(
            "{:>7}  {:<20} {:>7} {:>6}  {:<12}  {}",
            s.version,
            s.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            s.total_samples,
            s.fields.len(),
            short_fingerprint(&s.fingerprint),
            s.notes.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

/// `shx show <version>`.
pub async fn run_show(config: &Config, version: i64, json: bool) -> Result<()> {
    let (pool, manager) = open_manager(config).await?;
    let snapshot = manager.get_version(version).await;
    pool.close().await;

    let snapshot = match snapshot {
        Ok(s) => s,
        Err(e) if e.is_not_found() => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot);
    }
    Ok(())
}

fn print_snapshot(s: &SchemaSnapshot) {
    println!("--- Schema version {} ---", s.version);
    println!("created_at:   {}", s.created_at.format("%Y-%m-%dT%H:%M:%SZ"));
    println!("samples:      {}", s.total_samples);
    println!("fingerprint:  {}", s.fingerprint);
    if let Some(ref notes) = s.notes {
        println!("notes:        {}", notes);
    }
    println!();

    let width = s.fields.keys().map(|k| k.len()).max().unwrap_or(4).max(4);
    println!("{:<width$}  {:>7}  {:<8}  TYPES", "PATH", "PRESENT", "OPTIONAL");
    for (path, field) in &s.fields {
        let types: Vec<&str> = field.canonical().types.iter().map(|t| t.as_str()).collect();
        println!(
            "{:<width$}  {:>7}  {:<8}  {}",
            path,
            field.present,
            if field.optional { "yes" } else { "no" },
            types.join(", ")
        );
    }
}

/// Core diff lookup used by the CLI. A missing version surfaces as
/// [`SchemaError::VersionNotFound`].
pub async fn diff_versions(config: &Config, from: i64, to: i64) -> Result<DiffResponse, SchemaError> {
    let (pool, manager) = open_manager(config).await?;
    let diff = manager.diff(from, to).await;
    pool.close().await;
    Ok(DiffResponse {
        from,
        to,
        diff: diff?,
    })
}

/// `shx diff <a> <b>`.
pub async fn run_diff(config: &Config, from: i64, to: i64, json: bool) -> Result<()> {
    let response = match diff_versions(config, from, to).await {
        Ok(r) => r,
        Err(e) if e.is_not_found() => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("diff v{} -> v{}", response.from, response.to);
    if response.diff.is_empty() {
        println!("  no structural differences");
        return Ok(());
    }
    for path in &response.diff.added {
        println!("  + {}", path);
    }
    for path in &response.diff.removed {
        println!("  - {}", path);
    }
    for path in &response.diff.changed {
        println!("  ~ {}", path);
    }
    println!(
        "  added: {}, removed: {}, changed: {}",
        response.diff.added.len(),
        response.diff.removed.len(),
        response.diff.changed.len()
    );
    Ok(())
}

fn short_fingerprint(fp: &str) -> &str {
    fp.get(..12).unwrap_or(fp)
}
