use serde_json::Value;
use thiserror::Error;

use crate::model::ids::LessonId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompletionError {
    #[error("completed-lessons property is not a JSON array of strings: {0}")]
    InvalidProperty(String),
}

/// Ordered, duplicate-free set of completed lesson ids, materialized from
/// the user record's completed-lessons property.
///
/// Membership is the only query driving UI decisions; insertion order is
/// preserved so serialized payloads match what the user accumulated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionSet {
    ids: Vec<LessonId>,
}

impl CompletionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Materializes the set from the raw property value. A missing or empty
    /// value is an empty set; anything else must be a JSON string array.
    ///
    /// # Errors
    ///
    /// Returns `CompletionError::InvalidProperty` when the value is present
    /// but not a JSON array of strings.
    pub fn from_property(raw: Option<&str>) -> Result<Self, CompletionError> {
        let Some(raw) = raw else {
            return Ok(Self::new());
        };
        if raw.trim().is_empty() {
            return Ok(Self::new());
        }

        let parsed: Vec<String> = serde_json::from_str(raw)
            .map_err(|_| CompletionError::InvalidProperty(raw.to_owned()))?;

        let mut set = Self::new();
        for id in parsed {
            set.insert(LessonId::new(id));
        }
        Ok(set)
    }

    #[must_use]
    pub fn contains(&self, id: &LessonId) -> bool {
        self.ids.contains(id)
    }

    /// Appends the id; returns false (and leaves the set unchanged) when it
    /// is already a member.
    pub fn insert(&mut self, id: LessonId) -> bool {
        if self.ids.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Removes the id; returns whether it was a member.
    pub fn remove(&mut self, id: &LessonId) -> bool {
        match self.ids.iter().position(|existing| existing == id) {
            Some(idx) => {
                self.ids.remove(idx);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LessonId> {
        self.ids.iter()
    }

    /// Serializes the set back into its property form. An empty set becomes
    /// the empty string, not `"[]"` — the identity service treats the empty
    /// string as "property cleared".
    #[must_use]
    pub fn to_property_value(&self) -> String {
        if self.ids.is_empty() {
            return String::new();
        }
        let values: Vec<Value> = self
            .ids
            .iter()
            .map(|id| Value::String(id.as_str().to_owned()))
            .collect();
        Value::Array(values).to_string()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
