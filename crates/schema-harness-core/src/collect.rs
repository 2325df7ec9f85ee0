//! Per-path statistical profiling of sampled documents.
//!
//! [`collect`] walks one document and folds what it sees into a shared
//! [`StatsMap`]. Paths are dot-separated for object keys and `[]`-suffixed
//! for array elements, so every element of every array in every document
//! contributes to one shared path (`user.addresses[].city`).
//!
//! Only the first [`CollectOptions::array_sample_cap`] elements of an array
//! are visited. Wide arrays whose later elements carry extra keys are
//! therefore under-sampled; this is a known approximation.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::value::{TypeTag, Value};

/// Path used when the document itself is not an object.
pub const ROOT_VALUE_PATH: &str = "value";

/// Statistics accumulated for a single field path during one inference pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldStat {
    /// Number of sampled documents that exposed a value at this path.
    pub occurrence_count: u64,
    pub observed_types: BTreeSet<TypeTag>,
}

/// Field path → statistics, for one inference pass.
pub type StatsMap = BTreeMap<String, FieldStat>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    /// Maximum number of leading array elements visited per array.
    pub array_sample_cap: usize,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            array_sample_cap: 3,
        }
    }
}

/// Profile one document into `stats`.
///
/// A path's occurrence count grows by at most one per document, no matter
/// how many array elements expose it. Its type set collects the tag of
/// every visited value.
pub fn collect(value: &Value, stats: &mut StatsMap, opts: &CollectOptions) {
    let mut walker = Walker {
        stats,
        opts,
        seen: HashSet::new(),
    };
    match value {
        Value::Object(map) => walker.visit_fields(map, None),
        other => walker.record(ROOT_VALUE_PATH, other),
    }
}

struct Walker<'a> {
    stats: &'a mut StatsMap,
    opts: &'a CollectOptions,
    seen: HashSet<String>,
}

impl Walker<'_> {
    fn visit_fields(&mut self, map: &BTreeMap<String, Value>, parent: Option<&str>) {
        for (key, child) in map {
            let path = match parent {
                Some(p) => format!("{}.{}", p, key),
                None => key.clone(),
            };
            self.record(&path, child);
        }
    }

    fn record(&mut self, path: &str, value: &Value) {
        let entry = self.stats.entry(path.to_string()).or_default();
        if self.seen.insert(path.to_string()) {
            entry.occurrence_count += 1;
        }
        entry.observed_types.insert(value.type_tag());

        match value {
            Value::Object(map) => self.visit_fields(map, Some(path)),
            Value::Array(items) => {
                let element_path = format!("{}[]", path);
                for item in items.iter().take(self.opts.array_sample_cap) {
                    self.record(&element_path, item);
                }
            }
            _ => {}
        }
    }
}
