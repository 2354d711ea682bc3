//! Bounded, time-boxed memo table for collaborator calls.
//!
//! Keys are exact inputs (a coordinate or a prompt). Entries expire after the
//! configured TTL and the oldest entry is evicted once capacity is reached.
//! A capacity of zero disables caching entirely.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::CacheConfig;

struct StoredEntry<T> {
    value: T,
    expires_at: Instant,
}

struct Inner<T> {
    entries: HashMap<String, StoredEntry<T>>,
    /// Insertion order, oldest first. May hold keys already removed.
    order: VecDeque<String>,
}

pub struct MemoCache<T> {
    inner: Mutex<Inner<T>>,
    capacity: usize,
    ttl: Duration,
}

impl<T: Clone> MemoCache<T> {
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity,
            ttl,
        }
    }

    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(
            config.capacity,
            Duration::from_secs(u64::from(config.ttl_minutes) * 60),
        )
    }

    /// A cache that never stores anything
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        // Every mutation completes under the lock, so a poisoned map is still valid
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Stores a value, evicting the oldest entry when full.
    #[tracing::instrument(name = "put_memo", level = "debug", skip(self, value))]
    pub fn put(&self, key: &str, value: T) {
        self.put_at(key, value, Instant::now());
    }

    /// Retrieves a value if it exists and has not expired.
    #[tracing::instrument(name = "query_memo", level = "debug", skip(self))]
    pub fn get(&self, key: &str) -> Option<T> {
        self.get_at(key, Instant::now())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn put_at(&self, key: &str, value: T, now: Instant) {
        if !self.is_enabled() {
            return;
        }
        let expires_at = now.checked_add(self.ttl).unwrap_or(now);
        let mut inner = self.lock();

        if inner.entries.contains_key(key) {
            inner.order.retain(|k| k != key);
        } else {
            while inner.entries.len() >= self.capacity {
                let Some(oldest) = inner.order.pop_front() else {
                    break;
                };
                if inner.entries.remove(&oldest).is_some() {
                    tracing::debug!("Evicted oldest entry: {oldest}");
                }
            }
        }

        inner.order.push_back(key.to_string());
        inner
            .entries
            .insert(key.to_string(), StoredEntry { value, expires_at });
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<T> {
        let mut inner = self.lock();
        let expired = match inner.entries.get(key) {
            Some(entry) if now < entry.expires_at => {
                tracing::debug!("Key found and still fresh");
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            tracing::debug!("Key found but expired");
            inner.entries.remove(key);
            inner.order.retain(|k| k != key);
        } else {
            tracing::debug!("Key not found");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let cache = MemoCache::new(4, Duration::from_secs(60));
        cache.put("weather:45:-75", 12.5_f64);
        assert_eq!(cache.get("weather:45:-75"), Some(12.5));
        assert_eq!(cache.get("weather:45:-75.0001"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evicts_oldest_when_full() {
        let cache = MemoCache::new(2, Duration::from_secs(60));
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn test_overwrite_refreshes_position() {
        let cache = MemoCache::new(2, Duration::from_secs(60));
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("a", 10);
        cache.put("c", 3);
        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_entries_expire() {
        let cache = MemoCache::new(4, Duration::from_secs(30));
        let start = Instant::now();
        cache.put_at("prompt", "answer".to_string(), start);
        assert_eq!(
            cache.get_at("prompt", start + Duration::from_secs(29)),
            Some("answer".to_string())
        );
        assert_eq!(cache.get_at("prompt", start + Duration::from_secs(30)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let cache = MemoCache::disabled();
        cache.put("a", 1);
        assert!(!cache.is_enabled());
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());
    }
}
