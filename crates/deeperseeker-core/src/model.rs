use std::fmt;

use crate::store::{KeyValueStore, SELECTED_MODEL};

/// Model used when nothing has been selected yet.
pub const DEFAULT_MODEL: &str = "sonar";

/// Backend model identifier (for example `sonar-pro`).
#[derive(Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ModelId(pub String);

impl ModelId {
    /// Creates a model id from any string-like value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the model id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Loads the persisted model selection, falling back to [`DEFAULT_MODEL`]
    /// when the entry is missing or blank.
    pub fn load_selected(store: &dyn KeyValueStore) -> Self {
        store
            .get(SELECTED_MODEL)
            .filter(|value| !value.trim().is_empty())
            .map(Self::new)
            .unwrap_or_else(|| Self::new(DEFAULT_MODEL))
    }

    /// Persists this model as the current selection.
    pub fn store_selected(&self, store: &dyn KeyValueStore) {
        store.set(SELECTED_MODEL, self.0.clone());
    }
}

impl Default for ModelId {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ModelId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
