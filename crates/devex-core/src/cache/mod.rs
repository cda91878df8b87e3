//! # DevEx Core Cache
//!
//! In-memory TTL cache shared by the registry client and plugin manager.
//!
//! Entries carry a per-entry deadline; a background task sweeps expired
//! entries at half the default TTL. A process-wide closed flag is checked
//! with an atomic load before every operation, so `get`/`set` never panic
//! (and never lock) after [`TtlCache::close`]. Hit/miss/eviction counters
//! are atomics and can be sampled at any time via [`TtlCache::metrics`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::watch;

/// A single cache slot: the value and its expiry deadline.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Coherent snapshot of the cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// TTL key/value cache with atomic close semantics and background eviction.
#[derive(Debug)]
pub struct TtlCache<V: Clone + Send + Sync + 'static> {
    entries: Arc<RwLock<HashMap<String, CacheEntry<V>>>>,
    closed: Arc<AtomicBool>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    evictions: Arc<AtomicU64>,
    default_ttl: Duration,
    stop_tx: watch::Sender<bool>,
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    /// Create a cache with the given default TTL and spawn its eviction
    /// task. Must be called within a tokio runtime.
    pub fn new(default_ttl: Duration) -> Self {
        let entries: Arc<RwLock<HashMap<String, CacheEntry<V>>>> =
            Arc::new(RwLock::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let evictions = Arc::new(AtomicU64::new(0));
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let sweep_entries = entries.clone();
        let sweep_evictions = evictions.clone();
        // Sweep at half the TTL so an expired entry never outlives one
        // full TTL period.
        let sweep_interval = std::cmp::max(default_ttl / 2, Duration::from_millis(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            // The first tick of a tokio interval fires immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let now = Instant::now();
                        // Collect expired keys under the read lock, delete
                        // in one batch under the write lock.
                        let expired: Vec<String> = {
                            let guard = match sweep_entries.read() {
                                Ok(g) => g,
                                Err(_) => break,
                            };
                            guard
                                .iter()
                                .filter(|(_, e)| e.expires_at <= now)
                                .map(|(k, _)| k.clone())
                                .collect()
                        };
                        if expired.is_empty() {
                            continue;
                        }
                        if let Ok(mut guard) = sweep_entries.write() {
                            for key in &expired {
                                if guard.remove(key).is_some() {
                                    sweep_evictions.fetch_add(1, Ordering::Relaxed);
                                }
                            }
                        }
                    }
                    changed = stop_rx.changed() => {
                        // Stop on close signal or when the cache was dropped.
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            entries,
            closed,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            evictions,
            default_ttl,
            stop_tx,
        }
    }

    /// Look up a value. Misses are counted for absent, expired, and
    /// post-close lookups alike.
    pub fn get(&self, key: &str) -> Option<V> {
        if self.closed.load(Ordering::Acquire) {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        let guard = match self.entries.read() {
            Ok(g) => g,
            Err(_) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };
        match guard.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert with the default TTL. No-op after close.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Insert with an explicit TTL. No-op after close.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        if let Ok(mut guard) = self.entries.write() {
            guard.insert(
                key.into(),
                CacheEntry {
                    value,
                    expires_at: Instant::now() + ttl,
                },
            );
        }
    }

    /// Remove a single entry. No-op after close.
    pub fn delete(&self, key: &str) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        if let Ok(mut guard) = self.entries.write() {
            guard.remove(key);
        }
    }

    /// Drop all entries. No-op after close.
    pub fn clear(&self) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        if let Ok(mut guard) = self.entries.write() {
            guard.clear();
        }
    }

    /// Close the cache. The first call flips the closed flag and signals
    /// the eviction task to exit; subsequent calls are no-ops.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.stop_tx.send(true);
        if let Ok(mut guard) = self.entries.write() {
            guard.clear();
        }
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Counter snapshot, sampled in rapid succession.
    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Number of live (not yet swept) entries. Expired entries still count
    /// until the next sweep.
    pub fn len(&self) -> usize {
        self.entries.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone + Send + Sync + 'static> Drop for TtlCache<V> {
    fn drop(&mut self) {
        // Dropping the sender also wakes the sweep task; the explicit send
        // covers the case where a receiver clone outlives the cache.
        let _ = self.stop_tx.send(true);
    }
}

// Test module declaration
#[cfg(test)]
mod tests;
