//! # Schema Harness
//!
//! **Structural schema inference and versioning for document ingestion.**
//!
//! Upstream extractors turn PDFs, spreadsheets, web pages and the like into
//! JSON documents of arbitrary shape. Schema Harness stores each one as an
//! immutable raw record and keeps an append-only history of schema
//! snapshots describing what those documents look like: which field paths
//! exist, how often, whether they are optional, and which types they hold.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐  write   ┌─────────────┐
//! │  ingest  │────────▶ │ raw_records │◀──── sample newest N
//! └────┬─────┘          └─────────────┘            │
//!      │ enqueue                                   │
//!      ▼                                           │
//! ┌──────────┐  run    ┌────────────────┐ ─────────┘
//! │  worker  │───────▶ │ VersionManager │
//! └──────────┘         └───────┬────────┘
//!                              │ conditional append
//!                              ▼
//!                      ┌─────────────────┐      ┌──────────────┐
//!                      │ schema_versions │◀─────│ history/diff │
//!                      └─────────────────┘      └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! shx init                         # create database
//! shx ingest ./exports --source crm
//! shx history                      # list schema versions
//! shx diff 1 2                     # what changed between versions
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Database schema migrations (idempotent) |
//! | [`sqlite_store`] | SQLite record source and version store |
//! | [`ingest`] | Raw-record writes and document file loading |
//! | [`worker`] | Background inference queue and worker task |
//! | [`history`] | History, show, diff and on-demand inference commands |
//! | [`stats`] | Record and version counts |
//!
//! The inference engine itself lives in the `schema-harness-core` crate and
//! is re-exported as [`engine`].

pub mod config;
pub mod db;
pub mod history;
pub mod ingest;
pub mod logging;
pub mod migrate;
pub mod sqlite_store;
pub mod stats;
pub mod worker;

pub use schema_harness_core as engine;
pub use schema_harness_core::{
    EngineConfig, RawRecord, SchemaDiff, SchemaError, SchemaSnapshot, VersionManager,
};
