//! # Verification Cache
//!
//! Time-bounded, capacity-bounded memo of successful verifier responses.
//!
//! - Every entry carries an absolute expiry; reads past it miss and drop
//!   the entry.
//! - [`VerificationCache::sweep_expired`] removes everything stale in one
//!   pass, and [`spawn_sweeper`] runs it on a timer.
//! - At capacity, inserting a new key evicts the entry closest to expiry.
//!
//! Only successes are cached. Upstream failures always go back to the
//! verifier on the next request.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, info};

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Hit/miss counters and occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

/// TTL + capacity bounded cache keyed by string.
pub struct VerificationCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V> std::fmt::Debug for VerificationCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationCache")
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<V: Clone> VerificationCache<V> {
    /// An empty cache. A capacity of zero disables caching.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a live entry.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        if let Some(entry) = self.entries.get(key) {
            if now < entry.expires_at {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = key, "Verification cache hit");
                return Some(entry.value.clone());
            }
            drop(entry);
            // A concurrent insert may have refreshed the key since the read.
            self.entries.remove_if(key, |_, e| now >= e.expires_at);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a value for one TTL.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.insert_at(key.into(), value, Instant::now());
    }

    fn insert_at(&self, key: String, value: V, now: Instant) {
        if self.capacity == 0 {
            return;
        }
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.sweep_expired_at(now);
            while self.entries.len() >= self.capacity {
                if !self.evict_nearest_expiry() {
                    break;
                }
            }
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    fn evict_nearest_expiry(&self) -> bool {
        let victim = self
            .entries
            .iter()
            .min_by_key(|e| e.expires_at)
            .map(|e| e.key().clone());
        match victim {
            Some(key) => {
                debug!(key = %key, "Verification cache full, evicting");
                self.entries.remove(&key).is_some()
            }
            None => false,
        }
    }

    /// Drop an entry.
    pub fn remove(&self, key: &str) -> Option<V> {
        self.entries.remove(key).map(|(_, e)| e.value)
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    fn sweep_expired_at(&self, now: Instant) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|e| now >= e.expires_at)
            .map(|e| e.key().clone())
            .collect();
        let mut removed = 0;
        for key in &expired {
            if self.entries.remove_if(key, |_, e| now >= e.expires_at).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Run [`VerificationCache::sweep_expired`] every `interval` until the
/// returned handle is aborted.
pub fn spawn_sweeper<V>(cache: Arc<VerificationCache<V>>, interval: Duration) -> tokio::task::JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    info!(
        interval_secs = interval.as_secs(),
        "Verification cache sweeper started"
    );
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let removed = cache.sweep_expired();
            let stats = cache.stats();
            debug!(
                removed = removed,
                entries = stats.entries,
                hits = stats.hits,
                misses = stats.misses,
                "Verification cache sweep completed"
            );
        }
    })
}
