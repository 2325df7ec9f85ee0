//! Schema snapshot construction and canonical forms.
//!
//! [`build_fields`] turns one pass worth of [`StatsMap`] into the persisted
//! field mapping. The canonical serializations in this module are the only
//! basis for equality between field mappings: type lists are always emitted
//! in sorted order, and paths come out of a `BTreeMap`, so the output does
//! not depend on visitation order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::collect::StatsMap;
use crate::value::TypeTag;

/// Per-path entry of a schema snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Number of sampled documents exposing this path.
    pub present: u64,
    /// True when at least one sampled document lacked this path.
    pub optional: bool,
    pub types: Vec<TypeTag>,
}

impl FieldSchema {
    /// Copy with the type list in canonical order.
    pub fn canonical(&self) -> FieldSchema {
        let mut types = self.types.clone();
        types.sort();
        types.dedup();
        FieldSchema {
            present: self.present,
            optional: self.optional,
            types,
        }
    }
}

/// Field path → field schema.
pub type SchemaFields = BTreeMap<String, FieldSchema>;

/// Build the field mapping for a candidate snapshot.
pub fn build_fields(stats: &StatsMap, total_samples: u64) -> SchemaFields {
    stats
        .iter()
        .map(|(path, stat)| {
            (
                path.clone(),
                FieldSchema {
                    present: stat.occurrence_count,
                    optional: stat.occurrence_count < total_samples,
                    types: stat.observed_types.iter().copied().collect(),
                },
            )
        })
        .collect()
}

/// Deterministic JSON rendering of a field mapping, counts included.
pub fn canonical_json(fields: &SchemaFields) -> String {
    let canonical: SchemaFields = fields
        .iter()
        .map(|(path, field)| (path.clone(), field.canonical()))
        .collect();
    // BTreeMap<String, _> of plain structs cannot fail to serialize.
    serde_json::to_string(&canonical).unwrap_or_default()
}

#[derive(Serialize)]
struct StructuralField<'a> {
    optional: bool,
    types: &'a [TypeTag],
}

/// Canonical rendering of the *structure* only: paths, optional flags and
/// sorted type lists. Presence counts are sample statistics and are left
/// out so that a moving sample window alone never registers as drift.
pub fn structural_json(fields: &SchemaFields) -> String {
    let canonical: BTreeMap<&str, FieldSchema> = fields
        .iter()
        .map(|(path, field)| (path.as_str(), field.canonical()))
        .collect();
    let structural: BTreeMap<&str, StructuralField<'_>> = canonical
        .iter()
        .map(|(path, field)| {
            (
                *path,
                StructuralField {
                    optional: field.optional,
                    types: &field.types,
                },
            )
        })
        .collect();
    serde_json::to_string(&structural).unwrap_or_default()
}

/// Hex SHA-256 of [`structural_json`]. Two field mappings have the same
/// fingerprint exactly when they describe the same structure.
pub fn structural_fingerprint(fields: &SchemaFields) -> String {
    let mut hasher = Sha256::new();
    hasher.update(structural_json(fields).as_bytes());
    format!("{:x}", hasher.finalize())
}
