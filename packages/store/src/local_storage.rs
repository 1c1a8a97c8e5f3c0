//! # `localStorage` preference store
//!
//! [`LocalStoragePreferences`] is the [`PreferenceStore`] used on the web
//! platform. It is a zero-size handle that looks up `window.localStorage` on
//! every call, since the storage object can be unavailable (private browsing,
//! disabled storage) and must not be cached across that change.
//!
//! Errors are swallowed: reads return `None`, writes are dropped. Preferences
//! are cosmetic and never worth failing a page over.

use web_sys::Storage;

use crate::prefs::PreferenceStore;

#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStoragePreferences;

impl LocalStoragePreferences {
    pub fn new() -> Self {
        Self
    }

    fn storage() -> Option<Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }
}

impl PreferenceStore for LocalStoragePreferences {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(storage) = Self::storage() {
            if storage.set_item(key, value).is_err() {
                tracing::warn!(key, "localStorage write failed");
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(key);
        }
    }
}
