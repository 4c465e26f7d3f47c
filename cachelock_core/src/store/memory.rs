//! In-process [`CacheStore`] backed by a `HashMap`.

use super::CacheStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: &str, ttl: Duration) -> Self {
        let expires_at = (ttl > Duration::ZERO).then(|| Instant::now() + ttl);
        Self {
            value: value.to_string(),
            expires_at,
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-memory cache store with per-entry expiry.
///
/// Entries are evicted lazily when an operation touches them past their
/// deadline; there is no background sweeper. All four primitives take the
/// write lock, which is what makes `add` atomic with respect to concurrent
/// callers on the same store. The `raw` hint is accepted and ignored since
/// values are held as the strings they were given.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn add(&self, key: &str, value: &str, ttl: Duration, _raw: bool) -> Result<bool> {
        let mut entries = self.entries.write().await;
        if let Some(existing) = entries.get(key)
            && !existing.is_expired()
        {
            return Ok(false);
        }
        entries.insert(key.to_string(), Entry::new(value, ttl));
        Ok(true)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration, _raw: bool) -> Result<bool> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), Entry::new(value, ttl));
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        match entries.remove(key) {
            Some(entry) if entry.is_expired() => Ok(false),
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }
}
