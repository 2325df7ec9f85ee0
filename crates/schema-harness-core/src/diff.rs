//! Structural diff between two snapshot field mappings.

use serde::{Deserialize, Serialize};

use crate::builder::SchemaFields;

/// Paths added, removed and changed going from one snapshot to another.
/// Each list is sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Compare field mapping `a` (before) with `b` (after).
///
/// A path is `changed` when it exists on both sides and its canonical
/// `{present, optional, types}` differs.
pub fn diff_fields(a: &SchemaFields, b: &SchemaFields) -> SchemaDiff {
    let mut out = SchemaDiff::default();

    for (path, before) in a {
        match b.get(path) {
            None => out.removed.push(path.clone()),
            Some(after) if before.canonical() != after.canonical() => {
                out.changed.push(path.clone())
            }
            Some(_) => {}
        }
    }
    out.added = b
        .keys()
        .filter(|path| !a.contains_key(*path))
        .cloned()
        .collect();

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FieldSchema;
    use crate::value::TypeTag;

    fn field(present: u64, optional: bool, types: &[TypeTag]) -> FieldSchema {
        FieldSchema {
            present,
            optional,
            types: types.to_vec(),
        }
    }

    fn fields(entries: &[(&str, FieldSchema)]) -> SchemaFields {
        entries
            .iter()
            .map(|(p, f)| (p.to_string(), f.clone()))
            .collect()
    }

    #[test]
    fn test_added_and_removed() {
        let a_field = field(2, false, &[TypeTag::Integer]);
        let a = fields(&[("a", a_field.clone()), ("b", field(1, true, &[TypeTag::String]))]);
        let b = fields(&[("a", a_field), ("c", field(2, false, &[TypeTag::Boolean]))]);

        let d = diff_fields(&a, &b);
        assert_eq!(d.added, vec!["c"]);
        assert_eq!(d.removed, vec!["b"]);
        assert!(d.changed.is_empty());
    }

    #[test]
    fn test_changed_on_types_optional_or_presence() {
        let a = fields(&[
            ("t", field(2, false, &[TypeTag::Integer])),
            ("o", field(2, false, &[TypeTag::Integer])),
            ("p", field(2, false, &[TypeTag::Integer])),
            ("same", field(2, false, &[TypeTag::Integer, TypeTag::String])),
        ]);
        let b = fields(&[
            ("t", field(2, false, &[TypeTag::Integer, TypeTag::Null])),
            ("o", field(2, true, &[TypeTag::Integer])),
            ("p", field(1, false, &[TypeTag::Integer])),
            ("same", field(2, false, &[TypeTag::String, TypeTag::Integer])),
        ]);

        let d = diff_fields(&a, &b);
        assert_eq!(d.changed, vec!["o", "p", "t"]);
        assert!(d.added.is_empty() && d.removed.is_empty());
    }

    #[test]
    fn test_symmetry() {
        let a = fields(&[
            ("x", field(1, false, &[TypeTag::Integer])),
            ("y", field(1, false, &[TypeTag::Integer])),
        ]);
        let b = fields(&[
            ("y", field(1, false, &[TypeTag::Number])),
            ("z", field(1, false, &[TypeTag::Integer])),
        ]);
        let ab = diff_fields(&a, &b);
        let ba = diff_fields(&b, &a);
        assert_eq!(ab.added, ba.removed);
        assert_eq!(ab.removed, ba.added);
        assert_eq!(ab.changed, ba.changed);
    }

    #[test]
    fn test_identical_is_empty() {
        let a = fields(&[("x", field(3, false, &[TypeTag::Object]))]);
        assert!(diff_fields(&a, &a).is_empty());
        assert!(diff_fields(&SchemaFields::new(), &SchemaFields::new()).is_empty());
    }
}
