//! The versioned dataset: category tables plus version metadata

use crate::error::{ArkdataError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A scalar field value inside an entry
pub type FieldValue = Value;

/// Mapping from entry key to entry for one category
pub type CategoryTable = BTreeMap<String, Entry>;

/// Version assigned to a freshly created dataset
pub const INITIAL_VERSION: &str = "1.0.0";

/// Dataset categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Creatures,
    Items,
    Engrams,
    Beacons,
    Colors,
    Icons,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Creatures,
        Category::Items,
        Category::Engrams,
        Category::Beacons,
        Category::Colors,
        Category::Icons,
    ];

    /// Categories an incoming payload must carry. Icons were added later
    /// and older exports do not have them.
    pub const REQUIRED: [Category; 5] = [
        Category::Creatures,
        Category::Items,
        Category::Engrams,
        Category::Beacons,
        Category::Colors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Creatures => "creatures",
            Category::Items => "items",
            Category::Engrams => "engrams",
            Category::Beacons => "beacons",
            Category::Colors => "colors",
            Category::Icons => "icons",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ArkdataError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s.to_lowercase())
            .ok_or_else(|| ArkdataError::invalid_input(format!("Unknown category: {}", s)))
    }
}

/// One record in a category table: a flat set of named scalar fields.
///
/// Field order is kept so that persisted files round-trip unchanged, but
/// equality ignores it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entry {
    fields: IndexMap<String, FieldValue>,
}

impl Entry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.shift_remove(name)
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Display name of the entry, if it has a string `name` field
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(|v| v.as_str())
    }

    /// Overlay `other`'s fields onto this entry
    pub fn merge_fields(&mut self, other: &Entry) {
        for (name, value) in other.fields() {
            self.fields.insert(name.clone(), value.clone());
        }
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Entry {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// The full dataset as persisted: one table per category plus metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub creatures: CategoryTable,
    pub items: CategoryTable,
    pub engrams: CategoryTable,
    pub beacons: CategoryTable,
    pub colors: CategoryTable,
    #[serde(default)]
    pub icons: CategoryTable,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "now_seconds")]
    pub last_updated: i64,
}

fn default_version() -> String {
    INITIAL_VERSION.to_string()
}

pub(crate) fn now_seconds() -> i64 {
    chrono::Utc::now().timestamp()
}

impl Default for Dataset {
    fn default() -> Self {
        Self {
            creatures: CategoryTable::new(),
            items: CategoryTable::new(),
            engrams: CategoryTable::new(),
            beacons: CategoryTable::new(),
            colors: CategoryTable::new(),
            icons: CategoryTable::new(),
            version: default_version(),
            last_updated: now_seconds(),
        }
    }
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, category: Category) -> &CategoryTable {
        match category {
            Category::Creatures => &self.creatures,
            Category::Items => &self.items,
            Category::Engrams => &self.engrams,
            Category::Beacons => &self.beacons,
            Category::Colors => &self.colors,
            Category::Icons => &self.icons,
        }
    }

    pub fn table_mut(&mut self, category: Category) -> &mut CategoryTable {
        match category {
            Category::Creatures => &mut self.creatures,
            Category::Items => &mut self.items,
            Category::Engrams => &mut self.engrams,
            Category::Beacons => &mut self.beacons,
            Category::Colors => &mut self.colors,
            Category::Icons => &mut self.icons,
        }
    }

    /// Iterate over all category tables in a fixed order
    pub fn tables(&self) -> impl Iterator<Item = (Category, &CategoryTable)> {
        Category::ALL.into_iter().map(move |c| (c, self.table(c)))
    }

    pub fn entry(&self, category: Category, key: &str) -> Option<&Entry> {
        self.table(category).get(key)
    }

    /// Total number of entries across all categories
    pub fn entry_count(&self) -> usize {
        self.tables().map(|(_, t)| t.len()).sum()
    }

    /// Refresh the update timestamp
    pub fn touch(&mut self) {
        self.last_updated = now_seconds();
    }

    /// Check that a raw payload carries every required category
    pub fn validate_payload(payload: &Value) -> Result<()> {
        let object = payload
            .as_object()
            .ok_or_else(|| ArkdataError::validation("Invalid data format: expected a JSON object"))?;

        let missing: Vec<String> = Category::REQUIRED
            .iter()
            .filter(|c| !object.contains_key(c.as_str()))
            .map(|c| c.as_str().to_string())
            .collect();

        if !missing.is_empty() {
            return Err(ArkdataError::MissingCategories { missing });
        }
        Ok(())
    }

    /// Build a dataset from a raw payload, rejecting malformed input
    pub fn from_value(payload: Value) -> Result<Self> {
        Self::validate_payload(&payload)?;
        serde_json::from_value(payload)
            .map_err(|e| ArkdataError::validation(format!("Invalid data format: {}", e)))
    }

    /// Insert entries from `candidate` whose keys are absent here.
    /// Existing entries are never touched. Returns the number inserted.
    pub fn merge_missing(&mut self, candidate: &Dataset) -> usize {
        let mut inserted = 0;
        for category in Category::ALL {
            let table = self.table_mut(category);
            for (key, entry) in candidate.table(category) {
                if !table.contains_key(key) {
                    table.insert(key.clone(), entry.clone());
                    inserted += 1;
                }
            }
        }
        inserted
    }
}
