//! Structural diffing of category tables

use crate::dataset::{Category, CategoryTable, Dataset, Entry, FieldValue};
use crate::error::{ArkdataError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

/// Change to a single field of an entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldChange {
    Added {
        value: FieldValue,
    },
    Removed {
        value: FieldValue,
    },
    Modified {
        #[serde(rename = "oldValue")]
        old_value: FieldValue,
        #[serde(rename = "newValue")]
        new_value: FieldValue,
    },
}

/// An entry present on both sides with different content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifiedEntry {
    pub old: Entry,
    pub new: Entry,
    pub changes: BTreeMap<String, FieldChange>,
}

/// Classified differences for one category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffResult {
    pub added: BTreeMap<String, Entry>,
    pub removed: BTreeMap<String, Entry>,
    pub modified: BTreeMap<String, ModifiedEntry>,
}

/// Bucket a changed key falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Removed => "removed",
            ChangeKind::Modified => "modified",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = ArkdataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "added" => Ok(Self::Added),
            "removed" => Ok(Self::Removed),
            "modified" => Ok(Self::Modified),
            _ => Err(ArkdataError::invalid_input(format!(
                "Invalid change kind: {}. Use 'added', 'removed', or 'modified'",
                s
            ))),
        }
    }
}

/// Summary counts for a diff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub total: usize,
}

impl AddAssign for DiffStats {
    fn add_assign(&mut self, other: Self) {
        self.added += other.added;
        self.removed += other.removed;
        self.modified += other.modified;
        self.total += other.total;
    }
}

impl DiffResult {
    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty() || !self.modified.is_empty()
    }

    pub fn stats(&self) -> DiffStats {
        DiffEngine::stats(self)
    }

    /// Which bucket a key is in, if any
    pub fn kind_of(&self, key: &str) -> Option<ChangeKind> {
        if self.added.contains_key(key) {
            Some(ChangeKind::Added)
        } else if self.removed.contains_key(key) {
            Some(ChangeKind::Removed)
        } else if self.modified.contains_key(key) {
            Some(ChangeKind::Modified)
        } else {
            None
        }
    }

    /// All changed keys with their bucket
    pub fn changed_keys(&self) -> impl Iterator<Item = (&String, ChangeKind)> {
        self.added
            .keys()
            .map(|k| (k, ChangeKind::Added))
            .chain(self.modified.keys().map(|k| (k, ChangeKind::Modified)))
            .chain(self.removed.keys().map(|k| (k, ChangeKind::Removed)))
    }
}

/// Diffs for every category of a dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetDiff {
    pub categories: BTreeMap<Category, DiffResult>,
}

impl DatasetDiff {
    pub fn get(&self, category: Category) -> Option<&DiffResult> {
        self.categories.get(&category)
    }

    pub fn stats(&self, category: Category) -> DiffStats {
        self.get(category).map(DiffEngine::stats).unwrap_or_default()
    }

    /// Counts summed over all categories
    pub fn total_stats(&self) -> DiffStats {
        let mut total = DiffStats::default();
        for diff in self.categories.values() {
            total += diff.stats();
        }
        total
    }

    pub fn has_changes(&self) -> bool {
        self.categories.values().any(DiffResult::has_changes)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &DiffResult)> {
        self.categories.iter().map(|(c, d)| (*c, d))
    }
}

/// Stateless comparison of category tables
pub struct DiffEngine;

impl DiffEngine {
    /// Classify every key of `old` and `new` into added, removed or modified.
    /// Entry equality ignores field order.
    pub fn compare(old: &CategoryTable, new: &CategoryTable) -> DiffResult {
        let mut result = DiffResult::default();

        for (key, new_entry) in new {
            match old.get(key) {
                None => {
                    result.added.insert(key.clone(), new_entry.clone());
                }
                Some(old_entry) => {
                    if old_entry != new_entry {
                        result.modified.insert(
                            key.clone(),
                            ModifiedEntry {
                                old: old_entry.clone(),
                                new: new_entry.clone(),
                                changes: Self::compare_fields(old_entry, new_entry),
                            },
                        );
                    }
                }
            }
        }

        for (key, old_entry) in old {
            if !new.contains_key(key) {
                result.removed.insert(key.clone(), old_entry.clone());
            }
        }

        result
    }

    /// Field-level changes over the union of field names.
    /// Values are compared shallowly; entries are flat records.
    pub fn compare_fields(old: &Entry, new: &Entry) -> BTreeMap<String, FieldChange> {
        let names: BTreeSet<&String> = old.field_names().chain(new.field_names()).collect();
        let mut changes = BTreeMap::new();

        for name in names {
            let change = match (old.get(name), new.get(name)) {
                (None, Some(value)) => FieldChange::Added {
                    value: value.clone(),
                },
                (Some(value), None) => FieldChange::Removed {
                    value: value.clone(),
                },
                (Some(old_value), Some(new_value)) if old_value != new_value => {
                    FieldChange::Modified {
                        old_value: old_value.clone(),
                        new_value: new_value.clone(),
                    }
                }
                _ => continue,
            };
            changes.insert(name.clone(), change);
        }

        changes
    }

    pub fn stats(diff: &DiffResult) -> DiffStats {
        let added = diff.added.len();
        let removed = diff.removed.len();
        let modified = diff.modified.len();
        DiffStats {
            added,
            removed,
            modified,
            total: added + removed + modified,
        }
    }

    /// Compare every category of two datasets
    pub fn compare_datasets(old: &Dataset, new: &Dataset) -> DatasetDiff {
        let categories: BTreeMap<Category, DiffResult> = Category::ALL
            .par_iter()
            .map(|category| (*category, Self::compare(old.table(*category), new.table(*category))))
            .collect();

        let diff = DatasetDiff { categories };
        let stats = diff.total_stats();
        log::debug!(
            "Compared datasets {} -> {}: {} added, {} removed, {} modified",
            old.version,
            new.version,
            stats.added,
            stats.removed,
            stats.modified
        );
        diff
    }
}

/// Narrows a diff down to what a reviewer is looking at
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    /// Case-insensitive substring matched against the entry name
    pub search: String,
    pub show_added: bool,
    pub show_removed: bool,
    pub show_modified: bool,
    /// Keep a modified entry only if one of these fields changed
    pub fields: Option<Vec<String>>,
}

impl Default for ChangeFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            show_added: true,
            show_removed: true,
            show_modified: true,
            fields: None,
        }
    }
}

impl ChangeFilter {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Restrict to the given change kinds
    pub fn with_kinds(mut self, kinds: &[ChangeKind]) -> Self {
        self.show_added = kinds.contains(&ChangeKind::Added);
        self.show_removed = kinds.contains(&ChangeKind::Removed);
        self.show_modified = kinds.contains(&ChangeKind::Modified);
        self
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    fn matches_name(&self, entry: &Entry) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        entry
            .name()
            .map(|name| name.to_lowercase().contains(&needle))
            .unwrap_or(false)
    }

    fn matches_fields(&self, modified: &ModifiedEntry) -> bool {
        match &self.fields {
            None => true,
            Some(fields) => modified.changes.keys().any(|f| fields.contains(f)),
        }
    }

    /// Produce the filtered view of a diff
    pub fn apply(&self, diff: &DiffResult) -> DiffResult {
        let mut filtered = DiffResult::default();

        if self.show_added {
            filtered.added = diff
                .added
                .iter()
                .filter(|(_, entry)| self.matches_name(entry))
                .map(|(k, e)| (k.clone(), e.clone()))
                .collect();
        }

        if self.show_removed {
            filtered.removed = diff
                .removed
                .iter()
                .filter(|(_, entry)| self.matches_name(entry))
                .map(|(k, e)| (k.clone(), e.clone()))
                .collect();
        }

        if self.show_modified {
            filtered.modified = diff
                .modified
                .iter()
                .filter(|(_, m)| self.matches_name(&m.new) && self.matches_fields(m))
                .map(|(k, m)| (k.clone(), m.clone()))
                .collect();
        }

        filtered
    }
}
