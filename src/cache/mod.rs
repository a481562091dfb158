// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! TTL-bounded LRU cache shared by search and content extraction
//!
//! Every entry carries its own time-to-live, so one cache instance can hold
//! values with different lifetimes (e.g. news pages vs. government pages).
//!
//! ## Features
//!
//! - **Lazy expiry**: an entry older than its TTL is removed by the `get` that finds it
//! - **LRU eviction**: inserting into a full cache drops the least recently used entry
//! - **Metrics**: hits, misses, evictions and expirations with a derived hit rate
//! - **Thread-safe**: one internal mutex; no operation suspends or performs I/O
//!
//! ```rust,ignore
//! let cache: TtlCache<String> = TtlCache::new(500);
//! cache.set("key", "value".to_string(), Duration::from_secs(1800));
//! assert_eq!(cache.get("key").as_deref(), Some("value"));
//! ```

use lru::LruCache;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Cache statistics snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Lookups that returned a live entry
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Fraction of lookups that hit (0.0 when nothing was looked up yet)
    pub hit_rate: f64,
    /// Entries currently stored (expired ones included until read)
    pub size: usize,
    /// Configured capacity
    pub max_entries: usize,
    /// Entries dropped to make room
    pub evictions: u64,
    /// Entries dropped because their TTL had elapsed
    pub expirations: u64,
}

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

#[derive(Default)]
struct Counters {
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

struct Inner<V> {
    entries: LruCache<String, CacheEntry<V>>,
    counters: Counters,
}

/// Thread-safe TTL cache with LRU capacity bound
pub struct TtlCache<V> {
    inner: Mutex<Inner<V>>,
    max_entries: usize,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache holding at most `max_entries` values (minimum 1)
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                counters: Counters::default(),
            }),
            max_entries: capacity.get(),
        }
    }

    /// Look up a live entry, promoting it to most recently used
    ///
    /// Returns None if not found or expired. Expired entries are removed.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut guard = self.inner.lock().ok()?;
        let inner = &mut *guard;

        let expired = match inner.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                let value = entry.value.clone();
                inner.counters.hits += 1;
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            inner.entries.pop(key);
            inner.counters.expirations += 1;
        }
        inner.counters.misses += 1;
        None
    }

    /// Store a value with its own time-to-live
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(_) => return,
        };

        let key = key.into();
        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
            ttl,
        };

        // Make room from expired entries before evicting a live one
        if inner.entries.len() >= self.max_entries && !inner.entries.contains(&key) {
            Self::purge_expired(&mut inner);
        }

        // `push` hands back the displaced LRU entry when the cache was full,
        // or the old value when the key was already present.
        if let Some((displaced, _)) = inner.entries.push(key.clone(), entry) {
            if displaced != key {
                inner.counters.evictions += 1;
            }
        }
    }

    /// Remove a single entry
    pub fn remove(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock().ok()?;
        inner.entries.pop(key).map(|entry| entry.value)
    }

    /// Drop every entry and reset counters
    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.entries.clear();
            inner.counters = Counters::default();
        }
    }

    /// Remove expired entries without waiting for them to be read
    pub fn cleanup_expired(&self) -> usize {
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(_) => return 0,
        };

        Self::purge_expired(&mut inner)
    }

    fn purge_expired(inner: &mut Inner<V>) -> usize {
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            inner.entries.pop(key);
        }
        inner.counters.expirations += expired.len() as u64;
        expired.len()
    }

    /// Current number of stored entries
    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(_) => {
                return CacheStats {
                    max_entries: self.max_entries,
                    ..CacheStats::default()
                }
            }
        };

        let counters = &inner.counters;
        let lookups = counters.hits + counters.misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            counters.hits as f64 / lookups as f64
        };

        CacheStats {
            hits: counters.hits,
            misses: counters.misses,
            hit_rate,
            size: inner.entries.len(),
            max_entries: self.max_entries,
            evictions: counters.evictions,
            expirations: counters.expirations,
        }
    }
}

/// Collapse whitespace and lowercase so equivalent inputs share a key
pub fn normalize_key_part(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Build a stable cache key from a namespace and its parameters
///
/// The key is the hex SHA-256 of the namespace and each normalized part,
/// separated by a unit separator so `("ab", "c")` and `("a", "bc")` differ.
pub fn cache_key(namespace: &str, parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    for part in parts {
        hasher.update([0x1f]);
        hasher.update(normalize_key_part(part).as_bytes());
    }
    hex::encode(hasher.finalize())
}
