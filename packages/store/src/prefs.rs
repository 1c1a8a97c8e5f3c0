//! Small preference blobs kept in browser key-value storage.
//!
//! Not a data store: anything here can be lost without harm, so every read
//! degrades to defaults instead of failing.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub const PREFERENCES_KEY: &str = "clinic.preferences";

/// String key-value storage (`localStorage` in the browser).
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

#[derive(Clone, Debug, Default)]
pub struct MemoryPreferences {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.lock().remove(key);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub sidebar_collapsed: bool,
    #[serde(default)]
    pub theme: Theme,
}

impl Preferences {
    /// Read from `store`, falling back to defaults on a missing or corrupt blob.
    pub fn load(store: &(impl PreferenceStore + ?Sized)) -> Self {
        let Some(raw) = store.get(PREFERENCES_KEY) else {
            return Self::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "discarding unreadable preferences");
            Self::default()
        })
    }

    pub fn save(&self, store: &(impl PreferenceStore + ?Sized)) {
        match serde_json::to_string(self) {
            Ok(json) => store.set(PREFERENCES_KEY, &json),
            Err(e) => tracing::warn!(error = %e, "failed to serialize preferences"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_blob_loads_defaults() {
        let store = MemoryPreferences::new();
        assert_eq!(Preferences::load(&store), Preferences::default());
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryPreferences::new();
        let prefs = Preferences {
            sidebar_collapsed: true,
            theme: Theme::Dark,
        };
        prefs.save(&store);
        assert_eq!(Preferences::load(&store), prefs);
        assert!(store.get(PREFERENCES_KEY).unwrap().contains("\"dark\""));
    }

    #[test]
    fn test_corrupt_blob_loads_defaults() {
        let store = MemoryPreferences::new();
        store.set(PREFERENCES_KEY, "{not json");
        assert_eq!(Preferences::load(&store), Preferences::default());
    }
}
