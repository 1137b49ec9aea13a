//! In-memory TTL cache for chain-data lookups
//!
//! Thread-safe caching layer between the gateway and its provider, built on
//! DashMap for concurrent access without lock contention.
//!
//! Features:
//! - TTL-based expiration (60s default), entries dropped lazily on read
//! - Injected clock, so expiry is testable without sleeping
//! - Cache HIT/MISS logging and hit-rate statistics
//!
//! Staleness within the TTL window is acceptable by design; two concurrent
//! misses for the same key may both fetch, and the second write wins.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Time source for TTL checks. Production code uses [`SystemClock`]; tests
/// inject a manual clock to step through expiry deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for tests
pub struct ManualClock {
    base: Instant,
    offset: std::sync::Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: std::sync::Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap()
    }
}

/// Cache key: one entry per (provider, chain, address, call-kind)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub provider: String,
    pub chain: String,
    pub address: String,
    pub call: &'static str,
}

impl CacheKey {
    pub fn new(provider: &str, chain: &str, address: &str, call: &'static str) -> Self {
        Self {
            provider: provider.to_string(),
            chain: chain.to_string(),
            // Address is assumed canonical; lowercase again as a cheap guard
            address: address.to_lowercase(),
            call,
        }
    }
}

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

/// TTL cache owned by a gateway instance (not process-global state)
pub struct TtlCache<V: Clone> {
    store: DashMap<CacheKey, CacheEntry<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get with TTL validation. Expired entries are removed on read.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        if let Some(entry) = self.store.get(key) {
            if self.clock.now().duration_since(entry.stored_at) > self.ttl {
                drop(entry); // release read lock before removing
                self.store.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("📭 CACHE MISS (expired): {}/{}", key.call, key.address);
                None
            } else {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("✅ CACHE HIT: {}/{}", key.call, key.address);
                Some(entry.value.clone())
            }
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("📭 CACHE MISS: {}/{}", key.call, key.address);
            None
        }
    }

    pub fn set(&self, key: CacheKey, value: V) {
        self.store.insert(
            key,
            CacheEntry {
                value,
                stored_at: self.clock.now(),
            },
        );
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        CacheStats {
            entries: self.store.len(),
            hits,
            misses,
            hit_rate,
            ttl_secs: self.ttl.as_secs(),
        }
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub ttl_secs: u64,
}
