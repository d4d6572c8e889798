//! Key/value cache with serialized values and per-entry retention
//!
//! Modeled on the platform's Redis layer: values are JSON-encoded bytes,
//! keys come from [`crate::keys`], and every entry either carries the
//! default TTL or is pinned forever. Single-key get/set/delete are atomic;
//! there is no cross-key transactionality.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::sync::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::CacheError;

/// Configuration for a [`LookupCache`]
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries before eviction kicks in
    pub max_entries: u64,

    /// Time-to-live applied to entries stored with [`LookupCache::set`]
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            default_ttl: Duration::from_secs(60 * 60 * 24),
        }
    }
}

/// Retention policy attached to each entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Expires `default_ttl` after the entry was created or last overwritten
    Standard,
    /// Never expires (clone-derived voice names rely on this)
    Forever,
}

/// Encoded bytes plus the retention that governs them
#[derive(Debug, Clone)]
struct CachedValue {
    bytes: Arc<[u8]>,
    retention: Retention,
}

/// Per-entry expiry policy driven by [`Retention`].
///
/// An overwrite restarts the clock under the new value's retention, so
/// re-storing a pinned entry with `set` demotes it to the default TTL.
struct RetentionExpiry {
    default_ttl: Duration,
}

impl RetentionExpiry {
    fn lifetime(&self, value: &CachedValue) -> Option<Duration> {
        match value.retention {
            Retention::Standard => Some(self.default_ttl),
            Retention::Forever => None,
        }
    }
}

impl Expiry<String, CachedValue> for RetentionExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        self.lifetime(value)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        self.lifetime(value)
    }
}

/// Counter snapshot for a [`LookupCache`]
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

/// Namespaced key/value cache holding serialized values
///
/// Lookups decode on the way out; absence (including lazy expiry) is
/// `Ok(None)`, never an error. Decode failures are surfaced so best-effort
/// callers can downgrade them to a miss.
pub struct LookupCache {
    inner: Cache<String, CachedValue>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LookupCache {
    pub fn new(config: CacheConfig) -> Self {
        let inner = Cache::builder()
            .max_capacity(config.max_entries)
            .expire_after(RetentionExpiry {
                default_ttl: config.default_ttl,
            })
            .build();

        Self {
            inner,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    /// Look up `key`, decoding the stored value
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.inner.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key, "Cache hit");
                let value = serde_json::from_slice(&entry.bytes).map_err(|e| {
                    CacheError::Decode {
                        key: key.to_string(),
                        source: e,
                    }
                })?;
                Ok(Some(value))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key, "Cache miss");
                Ok(None)
            }
        }
    }

    /// Store `value` under `key` with the default TTL
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        self.insert(key, value, Retention::Standard)
    }

    /// Store `value` under `key` with no expiry
    pub fn set_forever<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        self.insert(key, value, Retention::Forever)
    }

    fn insert<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        retention: Retention,
    ) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value).map_err(|e| CacheError::Encode {
            key: key.to_string(),
            source: e,
        })?;

        self.inner.insert(
            key.to_string(),
            CachedValue {
                bytes: bytes.into(),
                retention,
            },
        );

        Ok(())
    }

    /// Remove `key`, reporting whether a live entry existed
    pub fn delete(&self, key: &str) -> bool {
        let existed = self.inner.remove(key).is_some();
        debug!(key, existed, "Cache delete");
        existed
    }

    /// Whether a live entry exists for `key` (does not count as a lookup)
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.inner.invalidate_all();
        debug!("Cache cleared");
    }

    /// Counter snapshot
    pub fn stats(&self) -> CacheStats {
        // Flush moka's pending maintenance so entry_count is current.
        self.inner.run_pending_tasks();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.inner.entry_count(),
        }
    }
}
