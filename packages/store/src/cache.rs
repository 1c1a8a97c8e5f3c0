//! # Local cache: in-memory TTL map for read-mostly backend data
//!
//! [`LocalCache`] lets pages skip redundant backend round-trips inside a short
//! freshness window. Entries are keyed by a logical data type (`"clients"`,
//! `"dashboard_stats"`, ...) plus an optional parameter map.
//!
//! ## Keys
//!
//! The key is the type name alone when there are no params, otherwise
//! `type:{json}` where `{json}` is the params rendered from a `BTreeMap`, so
//! the same params in any insertion order produce the same key.
//!
//! ## Values
//!
//! Values are stored as `serde_json::Value` and deserialized on every read, so
//! callers always get their own copy and can never mutate what is cached.
//!
//! ## Freshness and eviction
//!
//! An entry is valid iff `now - inserted_at < ttl(type)`. Invalid entries are
//! treated as absent by [`LocalCache::get`], which evicts them on access.
//! [`LocalCache::sweep`] evicts all of them; callers run it on a timer. When an
//! insert would exceed `max_entries`, a forced pass first sweeps, then drops
//! the oldest `eviction_fraction` of what remains.
//!
//! ## Stale-on-error
//!
//! [`LocalCache::get_or_fetch`] is cache-aside with one resilience rule: if the
//! fetch fails and an expired entry is still present, that stale value is
//! returned (tagged `expired: true`) instead of the error.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;

/// Parameters that distinguish entries of the same type.
pub type CacheParams = BTreeMap<String, serde_json::Value>;

#[derive(Clone, Debug)]
struct Entry {
    data_type: String,
    value: serde_json::Value,
    inserted_at: u64,
}

enum Lookup {
    Fresh(serde_json::Value),
    Stale(serde_json::Value),
    Missing,
}

/// Result of [`LocalCache::get_or_fetch`].
#[derive(Clone, Debug, PartialEq)]
pub struct Fetched<T> {
    pub data: T,
    pub from_cache: bool,
    pub expired: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub expired: usize,
    pub hits: u64,
    pub misses: u64,
}

pub struct LocalCache {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for LocalCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl LocalCache {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn key(data_type: &str, params: &CacheParams) -> String {
        if params.is_empty() {
            data_type.to_string()
        } else {
            format!(
                "{data_type}:{}",
                serde_json::to_string(params).unwrap_or_default()
            )
        }
    }

    fn is_fresh(&self, entry: &Entry, now: u64) -> bool {
        now.saturating_sub(entry.inserted_at) < self.config.ttl_ms(&entry.data_type)
    }

    fn lookup(&self, key: &str) -> Lookup {
        let now = self.clock.now_ms();
        match self.entries.lock().get(key) {
            Some(entry) if self.is_fresh(entry, now) => Lookup::Fresh(entry.value.clone()),
            Some(entry) => Lookup::Stale(entry.value.clone()),
            None => Lookup::Missing,
        }
    }

    /// Store a copy of `data`.
    pub fn set<T: Serialize>(&self, data_type: &str, data: &T, params: &CacheParams) {
        let value = match serde_json::to_value(data) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(data_type, error = %e, "value not cacheable");
                return;
            }
        };
        let key = Self::key(data_type, params);
        let now = self.clock.now_ms();

        let mut entries = self.entries.lock();
        if !entries.contains_key(&key) && entries.len() >= self.config.max_entries {
            self.force_evict(&mut entries, now);
        }
        entries.insert(
            key,
            Entry {
                data_type: data_type.to_string(),
                value,
                inserted_at: now,
            },
        );
    }

    /// A fresh copy of the cached value, or `None` on a miss or expiry.
    pub fn get<T: DeserializeOwned>(&self, data_type: &str, params: &CacheParams) -> Option<T> {
        let key = Self::key(data_type, params);
        match self.lookup(&key) {
            Lookup::Fresh(value) => match serde_json::from_value(value) {
                Ok(data) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    Some(data)
                }
                Err(e) => {
                    tracing::warn!(%key, error = %e, "cached value has unexpected shape");
                    self.entries.lock().remove(&key);
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    None
                }
            },
            Lookup::Stale(_) => {
                tracing::debug!(%key, "cache entry expired");
                self.entries.lock().remove(&key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Lookup::Missing => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Cache-aside read with stale-on-error fallback.
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        data_type: &str,
        params: &CacheParams,
        force_refresh: bool,
        fetch: F,
    ) -> Result<Fetched<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let key = Self::key(data_type, params);
        let stale = match self.lookup(&key) {
            Lookup::Fresh(value) if !force_refresh => match serde_json::from_value(value) {
                Ok(data) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(Fetched {
                        data,
                        from_cache: true,
                        expired: false,
                    });
                }
                Err(_) => None,
            },
            Lookup::Fresh(value) | Lookup::Stale(value) => Some(value),
            Lookup::Missing => None,
        };
        self.misses.fetch_add(1, Ordering::Relaxed);

        match fetch().await {
            Ok(data) => {
                self.set(data_type, &data, params);
                Ok(Fetched {
                    data,
                    from_cache: false,
                    expired: false,
                })
            }
            Err(e) => {
                if let Some(data) = stale.and_then(|v| serde_json::from_value(v).ok()) {
                    tracing::warn!(%key, error = %e, "fetch failed, serving stale cache entry");
                    Ok(Fetched {
                        data,
                        from_cache: true,
                        expired: true,
                    })
                } else {
                    Err(e)
                }
            }
        }
    }

    pub fn remove(&self, data_type: &str, params: &CacheParams) {
        self.entries.lock().remove(&Self::key(data_type, params));
    }

    /// Drop every entry of `data_type`, whatever its params.
    pub fn invalidate(&self, data_type: &str) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| e.data_type != data_type);
        before - entries.len()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict every expired entry; returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_ms();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| self.is_fresh(e, now));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, "cache sweep");
        }
        removed
    }

    fn force_evict(&self, entries: &mut HashMap<String, Entry>, now: u64) {
        entries.retain(|_, e| self.is_fresh(e, now));
        if entries.len() < self.config.max_entries {
            return;
        }
        let count = ((entries.len() as f64 * self.config.eviction_fraction).round() as usize).max(1);
        let mut by_age: Vec<(String, u64)> = entries
            .iter()
            .map(|(k, e)| (k.clone(), e.inserted_at))
            .collect();
        by_age.sort_by_key(|(_, at)| *at);
        for (key, _) in by_age.into_iter().take(count) {
            entries.remove(&key);
        }
        tracing::debug!(evicted = count, "cache at capacity, forced eviction");
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_ms();
        let entries = self.entries.lock();
        CacheStats {
            entries: entries.len(),
            expired: entries.values().filter(|e| !self.is_fresh(e, now)).count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u32,
        tags: Vec<String>,
    }

    fn cache_with_clock() -> (LocalCache, ManualClock) {
        let clock = ManualClock::new(1_000_000);
        let cache = LocalCache::with_clock(
            CacheConfig::default().with_ttl("x", 60),
            Arc::new(clock.clone()),
        );
        (cache, clock)
    }

    fn params(pairs: &[(&str, serde_json::Value)]) -> CacheParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_get_returns_independent_copy() {
        let (cache, _) = cache_with_clock();
        let mut data = vec![Row {
            id: 1,
            tags: vec!["a".into()],
        }];
        cache.set("x", &data, &CacheParams::new());

        let mut first: Vec<Row> = cache.get("x", &CacheParams::new()).unwrap();
        assert_eq!(first, data);

        first[0].tags.push("mutated".into());
        data[0].id = 99;
        let second: Vec<Row> = cache.get("x", &CacheParams::new()).unwrap();
        assert_eq!(second[0].id, 1);
        assert_eq!(second[0].tags, vec!["a".to_string()]);
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let (cache, clock) = cache_with_clock();
        cache.set("x", &42u32, &CacheParams::new());

        clock.advance_secs(59);
        assert_eq!(cache.get::<u32>("x", &CacheParams::new()), Some(42));

        clock.advance_secs(1);
        assert_eq!(cache.get::<u32>("x", &CacheParams::new()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_param_order_does_not_change_key() {
        let a = params(&[("page", 1.into()), ("active", true.into())]);
        let b = params(&[("active", true.into()), ("page", 1.into())]);
        assert_eq!(LocalCache::key("clients", &a), LocalCache::key("clients", &b));
        assert_ne!(
            LocalCache::key("clients", &a),
            LocalCache::key("clients", &CacheParams::new())
        );
        assert_eq!(LocalCache::key("clients", &CacheParams::new()), "clients");
    }

    #[tokio::test]
    async fn test_get_or_fetch_hits_cache_until_forced() {
        let (cache, _) = cache_with_clock();
        let p = CacheParams::new();
        let calls = std::cell::Cell::new(0);
        let fetch = || {
            calls.set(calls.get() + 1);
            async { Ok::<_, String>(7u32) }
        };

        let first = cache.get_or_fetch("x", &p, false, fetch).await.unwrap();
        assert!(!first.from_cache);
        let second = cache.get_or_fetch("x", &p, false, fetch).await.unwrap();
        assert!(second.from_cache && !second.expired);
        let forced = cache.get_or_fetch("x", &p, true, fetch).await.unwrap();
        assert!(!forced.from_cache);
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_serves_stale_value() {
        let (cache, clock) = cache_with_clock();
        let p = CacheParams::new();
        cache.set("x", &"old".to_string(), &p);
        clock.advance_secs(120);

        let result = cache
            .get_or_fetch("x", &p, false, || async {
                Err::<String, _>("backend down".to_string())
            })
            .await
            .unwrap();
        assert_eq!(
            result,
            Fetched {
                data: "old".to_string(),
                from_cache: true,
                expired: true,
            }
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_without_entry_propagates() {
        let (cache, _) = cache_with_clock();
        let err = cache
            .get_or_fetch("x", &CacheParams::new(), false, || async {
                Err::<u32, _>("backend down".to_string())
            })
            .await
            .unwrap_err();
        assert_eq!(err, "backend down");
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let (cache, clock) = cache_with_clock();
        cache.set("x", &1u8, &CacheParams::new());
        clock.advance_secs(61);
        cache.set("test_catalog", &2u8, &CacheParams::new());

        assert_eq!(cache.stats().expired, 1);
        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.get::<u8>("test_catalog", &CacheParams::new()), Some(2));
    }

    #[test]
    fn test_capacity_forces_eviction_of_oldest() {
        let clock = ManualClock::new(0);
        let cache = LocalCache::with_clock(
            CacheConfig::default().with_max_entries(5),
            Arc::new(clock.clone()),
        );
        for i in 0..5u32 {
            cache.set("clients", &i, &params(&[("page", i.into())]));
            clock.advance_ms(10);
        }
        assert_eq!(cache.len(), 5);

        cache.set("clients", &99u32, &params(&[("page", 99.into())]));
        assert_eq!(cache.len(), 5);
        assert!(cache
            .get::<u32>("clients", &params(&[("page", 0.into())]))
            .is_none());
        assert_eq!(
            cache.get::<u32>("clients", &params(&[("page", 99.into())])),
            Some(99)
        );
    }

    #[test]
    fn test_invalidate_drops_all_params_of_type() {
        let (cache, _) = cache_with_clock();
        cache.set("clients", &1u8, &params(&[("page", 1.into())]));
        cache.set("clients", &2u8, &params(&[("page", 2.into())]));
        cache.set("inventory", &3u8, &CacheParams::new());

        assert_eq!(cache.invalidate("clients"), 2);
        assert_eq!(cache.len(), 1);
    }
}
