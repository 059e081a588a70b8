use dashmap::DashMap;

/// Key under which the user's API key is persisted.
pub const API_KEY: &str = "apikey";
/// Key under which the selected model id is persisted.
pub const SELECTED_MODEL: &str = "selectedModel";

/// Narrow get/set capability over on-device key-value persistence.
///
/// Injected into the pieces that need it; the core never keeps a global store.
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String);

    /// Removes `key`. Missing keys are ignored.
    fn remove(&self, key: &str);
}

/// Process-local store backed by a concurrent map.
///
/// Useful for tests and for hosts that keep settings only for the lifetime of
/// the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with one entry.
    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get(API_KEY), None);
        store.set(API_KEY, "pplx-123".into());
        assert_eq!(store.get(API_KEY).as_deref(), Some("pplx-123"));
        store.set(API_KEY, "pplx-456".into());
        assert_eq!(store.get(API_KEY).as_deref(), Some("pplx-456"));
        store.remove(API_KEY);
        assert_eq!(store.get(API_KEY), None);
    }
}
