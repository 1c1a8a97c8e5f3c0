//! # Cache configuration
//!
//! Freshness windows for the [`crate::LocalCache`], keyed by logical data type.
//! Loadable from TOML so deployments can tune them without a rebuild:
//!
//! ```toml
//! default_ttl_secs = 300
//! sweep_interval_secs = 600
//! max_entries = 100
//!
//! [ttl_secs]
//! appointments = 120
//! dashboard_stats = 60
//! ```
//!
//! Every field has a default, so a missing or partial file is equivalent to
//! the default configuration. A `[ttl_secs]` table replaces the built-in table
//! entirely rather than merging with it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL used for types missing from `ttl_secs`.
    #[serde(default = "default_ttl")]
    pub default_ttl_secs: u64,
    /// Background sweep period.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// Hard cap on stored entries.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Share of entries dropped by a forced eviction pass.
    #[serde(default = "default_eviction_fraction")]
    pub eviction_fraction: f64,
    /// Per-type TTLs. Must stay the last field: TOML tables follow plain values.
    #[serde(default = "default_ttl_table")]
    pub ttl_secs: BTreeMap<String, u64>,
}

fn default_ttl() -> u64 {
    300
}

fn default_sweep_interval() -> u64 {
    600
}

fn default_max_entries() -> usize {
    100
}

fn default_eviction_fraction() -> f64 {
    0.2
}

fn default_ttl_table() -> BTreeMap<String, u64> {
    [
        ("clients", 300),
        ("appointments", 120),
        ("financial", 60),
        ("inventory", 300),
        ("collaborators", 600),
        ("prontuarios", 300),
        ("anamnesis", 300),
        ("test_catalog", 1800),
        ("supervision", 300),
        ("reports", 120),
        ("dashboard_stats", 60),
        ("profile", 600),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_ttl(),
            ttl_secs: default_ttl_table(),
            sweep_interval_secs: default_sweep_interval(),
            max_entries: default_max_entries(),
            eviction_fraction: default_eviction_fraction(),
        }
    }
}

impl CacheConfig {
    /// TTL for a type, in milliseconds.
    pub fn ttl_ms(&self, data_type: &str) -> u64 {
        self.ttl_secs
            .get(data_type)
            .copied()
            .unwrap_or(self.default_ttl_secs)
            * 1000
    }

    pub fn with_ttl(mut self, data_type: &str, secs: u64) -> Self {
        self.ttl_secs.insert(data_type.to_string(), secs);
        self
    }

    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_uses_default_ttl() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl_ms("appointments"), 120_000);
        assert_eq!(config.ttl_ms("never-configured"), 300_000);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = CacheConfig::from_toml("max_entries = 10\n").unwrap();
        assert_eq!(config.max_entries, 10);
        assert_eq!(config.sweep_interval_secs, 600);
        assert_eq!(config.ttl_ms("test_catalog"), 1_800_000);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = CacheConfig::default().with_ttl("clients", 30);
        let loaded = CacheConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(loaded, config);
    }
}
