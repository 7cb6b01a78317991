//! Name-keyed definition matching and classification

use std::collections::{BTreeMap, HashMap};

use crate::diff::diff_lines;
use crate::model::{ChangeRecord, Classification, Definition};

/// Pair old/new definitions by name and classify every member of the name
/// union, Unchanged included.
///
/// Duplicate names on one side collapse last-writer-wins in extraction
/// order, so conditional redefinitions and nested helpers sharing a leaf
/// name stay deterministic. No cross-name similarity is attempted: a
/// renamed definition yields one Removed plus one Added record.
pub fn match_definitions(old: &[Definition], new: &[Definition]) -> BTreeMap<String, ChangeRecord> {
    let old_by_name: HashMap<&str, &Definition> =
        old.iter().map(|d| (d.name.as_str(), d)).collect();
    let new_by_name: HashMap<&str, &Definition> =
        new.iter().map(|d| (d.name.as_str(), d)).collect();

    let mut records = BTreeMap::new();
    for name in old_by_name.keys().chain(new_by_name.keys()) {
        if records.contains_key(*name) {
            continue;
        }

        let old_def = old_by_name.get(name).copied();
        let new_def = new_by_name.get(name).copied();
        let Some(present) = new_def.or(old_def) else {
            continue;
        };

        let classification = match (old_def, new_def) {
            (None, Some(_)) => Classification::Added,
            (Some(_), None) => Classification::Removed,
            (Some(o), Some(n)) if o.body_text != n.body_text => Classification::Modified,
            _ => Classification::Unchanged,
        };

        records.insert(
            name.to_string(),
            ChangeRecord {
                name: name.to_string(),
                kind: present.kind,
                old: old_def.cloned(),
                new: new_def.cloned(),
                classification,
                edits: Vec::new(),
            },
        );
    }
    records
}

/// Match definitions and populate the line-level edit script for every
/// Modified record. The differ is only invoked for Modified pairs.
pub fn match_and_diff(old: &[Definition], new: &[Definition]) -> BTreeMap<String, ChangeRecord> {
    let mut records = match_definitions(old, new);
    for record in records.values_mut() {
        if record.classification != Classification::Modified {
            continue;
        }
        if let (Some(old_def), Some(new_def)) = (&record.old, &record.new) {
            record.edits = diff_lines(&old_def.body_lines(), &new_def.body_lines());
        }
    }
    records
}
