pub mod cache;
pub mod clock;
pub mod config;
pub mod prefs;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
mod local_storage;
#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub use local_storage::LocalStoragePreferences;

pub use cache::{CacheParams, CacheStats, Fetched, LocalCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use prefs::{MemoryPreferences, PreferenceStore, Preferences, Theme};
