//! Client timing knobs, loadable from TOML.
//!
//! ```toml
//! navigation_timeout_ms = 10000
//! render_timeout_ms = 8000
//!
//! [cache]
//! default_ttl_secs = 300
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use store::CacheConfig;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Limit on the combined completion of route listeners.
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_ms: u64,
    /// Limit on one page construction plus render.
    #[serde(default = "default_render_timeout")]
    pub render_timeout_ms: u64,
    /// Quiet period for back/forward and auth-change bursts.
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,
    /// Delay before an error screen sends the user back to login.
    #[serde(default = "default_login_redirect_delay")]
    pub login_redirect_delay_ms: u64,
    /// Idle time after a render before likely-next pages are prefetched.
    #[serde(default = "default_prefetch_delay")]
    pub prefetch_delay_ms: u64,
    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_navigation_timeout() -> u64 {
    10_000
}

fn default_render_timeout() -> u64 {
    8_000
}

fn default_debounce() -> u64 {
    100
}

fn default_login_redirect_delay() -> u64 {
    3_000
}

fn default_prefetch_delay() -> u64 {
    1_500
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: default_navigation_timeout(),
            render_timeout_ms: default_render_timeout(),
            debounce_ms: default_debounce(),
            login_redirect_delay_ms: default_login_redirect_delay(),
            prefetch_delay_ms: default_prefetch_delay(),
            cache: CacheConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn login_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.login_redirect_delay_ms)
    }

    pub fn prefetch_delay(&self) -> Duration {
        Duration::from_millis(self.prefetch_delay_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache.sweep_interval_secs)
    }
}
