//! Content fingerprints for datasets

use crate::dataset::{CategoryTable, Dataset, Entry};
use blake3::Hasher;
use serde_json::Value;

/// A hash value represented as a hex string
pub type HashValue = String;

/// Computes order-independent fingerprints over dataset content
pub struct HashComputer;

impl HashComputer {
    /// Fingerprint of a dataset's content and version.
    /// `last_updated` is left out so a bare timestamp refresh does not change it.
    pub fn hash_dataset(dataset: &Dataset) -> HashValue {
        let mut hasher = Hasher::new();
        for (category, table) in dataset.tables() {
            hasher.update(category.as_str().as_bytes());
            hasher.update(b"{");
            Self::update_table(&mut hasher, table);
            hasher.update(b"}");
        }
        hasher.update(b"version=");
        hasher.update(dataset.version.as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    fn update_table(hasher: &mut Hasher, table: &CategoryTable) {
        // BTreeMap iterates in key order
        for (key, entry) in table {
            update_quoted(hasher, key);
            hasher.update(b":");
            Self::update_entry(hasher, entry);
            hasher.update(b";");
        }
    }

    /// Fields in name order, so two entries that differ only in field order
    /// hash the same
    fn update_entry(hasher: &mut Hasher, entry: &Entry) {
        let mut fields: Vec<_> = entry.fields().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));

        for (name, value) in fields {
            update_quoted(hasher, name);
            hasher.update(b"=");
            hasher.update(value.to_string().as_bytes());
            hasher.update(b"|");
        }
    }
}

/// Feed a JSON-quoted string so separators inside it cannot be confused
/// with the ones around it
fn update_quoted(hasher: &mut Hasher, text: &str) {
    hasher.update(Value::from(text).to_string().as_bytes());
}
