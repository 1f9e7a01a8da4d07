//! In-memory response cache with a lazy freshness window.
//!
//! Entries are never swept. A stale entry is ignored on read and replaced by
//! the next successful fetch, so the map grows with the number of distinct
//! coordinates looked up.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// Key for a cached upstream call, e.g. `"weather-48.85-2.35"`.
pub fn cache_key(operation: &str, lat: f64, lon: f64) -> String {
    format!("{}-{}-{}", operation, lat, lon)
}

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    /// True while `now - timestamp < ttl`. A timestamp in the future counts as fresh.
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.timestamp)
            .to_std()
            .map_or(true, |elapsed| elapsed < ttl)
    }
}

#[derive(Debug)]
pub struct ResponseCache<T> {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
}

impl<T: Clone> ResponseCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.get_at(key, Utc::now())
    }

    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<T> {
        let entries = self.entries.lock();
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(self.ttl, now))
            .map(|entry| entry.data.clone())
    }

    pub fn insert(&self, key: impl Into<String>, data: T) {
        self.insert_at(key, data, Utc::now());
    }

    pub fn insert_at(&self, key: impl Into<String>, data: T, timestamp: DateTime<Utc>) {
        self.entries
            .lock()
            .insert(key.into(), CacheEntry { data, timestamp });
    }

    /// Number of stored entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
