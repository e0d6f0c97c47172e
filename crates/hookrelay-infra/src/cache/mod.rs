//! In-process lookup cache backed by [`moka`].
//!
//! Entries are JSON strings with a time-to-live and a capacity bound. The
//! cache is never authoritative; callers fall back to the registry on a miss.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use hookrelay_core::cache::LookupCache;
use hookrelay_types::config::CacheConfig;
use hookrelay_types::error::CacheError;

/// Hit/miss counters.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hits={} misses={}", self.hits(), self.misses())
    }
}

/// `LookupCache` over `moka::future::Cache<String, String>`.
#[derive(Clone)]
pub struct MokaLookupCache {
    inner: Cache<String, String>,
    stats: Arc<CacheStats>,
}

impl MokaLookupCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let inner = Cache::builder()
            .name("event_registrations")
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self {
            inner,
            stats: Arc::new(CacheStats::default()),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_capacity, Duration::from_secs(config.ttl_secs))
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl LookupCache for MokaLookupCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let value = self.inner.get(key).await;
        if value.is_some() {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key, "cache miss");
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        self.inner.insert(key.to_string(), value).await;
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.inner.invalidate(key).await;
        Ok(())
    }
}
