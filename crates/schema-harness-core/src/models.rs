//! Core data models shared by the engine and its stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::builder::SchemaFields;

/// An ingested document as written by the ingestion path. Immutable once
/// stored; the engine only ever reads a recent window of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    /// Free-form origin tag (e.g. `"upload"`, `"crm-export"`).
    pub source: String,
    pub payload: serde_json::Value,
    pub ingested_at: DateTime<Utc>,
}

/// A persisted, immutable schema version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    /// Strictly increasing, gap-free, assigned by the store on append.
    pub version: i64,
    pub fields: SchemaFields,
    pub total_samples: u64,
    pub notes: Option<String>,
    /// Structural fingerprint of `fields`.
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
}

/// Snapshot content handed to a store for conditional append. The store
/// decides the version number and creation time.
#[derive(Debug, Clone)]
pub struct NewSnapshot {
    pub fields: SchemaFields,
    pub total_samples: u64,
    pub notes: Option<String>,
    pub fingerprint: String,
}

impl NewSnapshot {
    /// Materialize as a stored snapshot.
    pub fn into_snapshot(self, version: i64, created_at: DateTime<Utc>) -> SchemaSnapshot {
        SchemaSnapshot {
            version,
            fields: self.fields,
            total_samples: self.total_samples,
            notes: self.notes,
            fingerprint: self.fingerprint,
            created_at,
        }
    }
}
