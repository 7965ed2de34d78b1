use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The externally-owned user profile: an opaque mapping from property name
/// to string value. Only the course module's configured properties carry
/// meaning here; everything else passes through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord {
    properties: BTreeMap<String, String>,
}

impl UserRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Applies a partial update, property by property. Last writer wins;
    /// there is no field-level locking or versioning.
    pub fn apply(&mut self, updates: &PropertyUpdates) {
        for (name, value) in updates.iter() {
            self.properties.insert(name.to_owned(), value.to_owned());
        }
    }
}

/// A partial-record update keyed by property name. Ordered so serialized
/// payloads (and test assertions on them) are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyUpdates(BTreeMap<String, String>);

impl PropertyUpdates {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
