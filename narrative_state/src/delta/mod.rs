//! Deltas - sparse maps from provider id to an update value or a clear directive.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// What a delta asks of a single provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaValue {
    /// Run the provider's update handler with this value.
    Update(Value),

    /// Run the provider's clear handler instead of updating.
    Clear,
}

impl DeltaValue {
    /// Whether this entry asks for a clear.
    pub fn is_clear(&self) -> bool {
        matches!(self, DeltaValue::Clear)
    }

    /// The update payload, if this is not a clear.
    pub fn as_update(&self) -> Option<&Value> {
        match self {
            DeltaValue::Update(value) => Some(value),
            DeltaValue::Clear => None,
        }
    }
}

impl From<Value> for DeltaValue {
    fn from(value: Value) -> Self {
        DeltaValue::Update(value)
    }
}

/// A sparse provider-id -> value map produced by one visitation or update call.
///
/// Keys that match no registered provider are carried along and ignored at
/// dispatch time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delta {
    entries: BTreeMap<String, DeltaValue>,
}

impl Delta {
    /// Create an empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an update entry.
    pub fn with_update(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_update(key, value);
        self
    }

    /// Add a clear entry.
    pub fn with_clear(mut self, key: impl Into<String>) -> Self {
        self.set_clear(key);
        self
    }

    /// Set an update entry, replacing any existing entry for the key.
    pub fn set_update(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), DeltaValue::Update(value.into()));
    }

    /// Set a clear entry, replacing any existing entry for the key.
    pub fn set_clear(&mut self, key: impl Into<String>) {
        self.entries.insert(key.into(), DeltaValue::Clear);
    }

    /// Insert an entry, returning the one it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: DeltaValue) -> Option<DeltaValue> {
        self.entries.insert(key.into(), value)
    }

    /// Get the entry for a provider id.
    pub fn get(&self, key: &str) -> Option<&DeltaValue> {
        self.entries.get(key)
    }

    /// Check if the delta has an entry for a provider id.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove the entry for a provider id.
    pub fn remove(&mut self, key: &str) -> Option<DeltaValue> {
        self.entries.remove(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the delta has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeltaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate provider ids in key order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Overlay `other` onto this delta; entries in `other` win.
    pub fn merge(&mut self, other: &Delta) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Fold `other` into an accumulator.
    ///
    /// Updates overwrite. A clear removes the key, since a cleared provider has
    /// nothing left to carry into the next leaf.
    pub fn absorb(&mut self, other: &Delta) {
        for (key, value) in &other.entries {
            match value {
                DeltaValue::Update(_) => {
                    self.entries.insert(key.clone(), value.clone());
                }
                DeltaValue::Clear => {
                    self.entries.remove(key);
                }
            }
        }
    }
}

impl FromIterator<(String, DeltaValue)> for Delta {
    fn from_iter<I: IntoIterator<Item = (String, DeltaValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Delta {
    type Item = (String, DeltaValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, DeltaValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
