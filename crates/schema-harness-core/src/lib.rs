//! # Schema Harness Core
//!
//! Storage-agnostic logic for Schema Harness: the document value model,
//! per-path field profiling, schema snapshot construction, drift detection
//! with race-safe version creation, and snapshot diffing.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or other
//! runtime-specific dependencies. Persistence is reached through the
//! traits in [`store`].
//!
//! ## Pipeline
//!
//! ```text
//! recent raw payloads ──▶ collect ──▶ build_fields ──▶ compare with latest
//!                        (per path)   (snapshot)       │
//!                                                      ▼
//!                                        conditional append (new version)
//! ```

pub mod builder;
pub mod collect;
pub mod diff;
pub mod engine;
pub mod error;
pub mod models;
pub mod store;
pub mod value;

pub use builder::{FieldSchema, SchemaFields};
pub use diff::SchemaDiff;
pub use engine::{EngineConfig, VersionManager};
pub use error::{SchemaError, SchemaResult};
pub use models::{NewSnapshot, RawRecord, SchemaSnapshot};
pub use value::{TypeTag, Value};
