//! Advisory locking over the cache service's atomic `add`.
//!
//! A lock on key `k` is an entry at `lock:k` (derived per the caller's
//! [`KeyMode`]). Whoever wins the `add` for that entry holds the lock until
//! they delete it or its TTL lapses. The TTL is a safety net against crashed
//! holders, not a lease the protocol depends on.

use crate::ClientConfig;
use crate::accessor::CacheAccessor;
use crate::error::Result;
use crate::key::{self, KeyMode};
use crate::store::CacheStore;
use log::{debug, warn};
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use tokio::time::sleep;

/// Proof of lock ownership handed out by [`LockManager::acquire`].
///
/// The token's hex value is what gets stored in the lock entry, so release
/// can tell the caller's lock apart from a successor's after a TTL lapse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken(String);

impl LockToken {
    fn generate() -> Self {
        let mut rng = rand::rngs::ThreadRng::default();
        Self(format!("{:032x}", rng.random::<u128>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Acquires and releases per-key advisory locks.
///
/// Acquisition polls at a fixed interval rather than blocking server-side:
/// one immediate attempt, then up to `max_lock_tries` retries separated by
/// `wait_interval` sleeps. Contention past the last retry is a normal
/// outcome, reported as `Ok(None)`.
pub struct LockManager {
    accessor: CacheAccessor,
    config: ClientConfig,
}

impl LockManager {
    pub fn new(store: Arc<dyn CacheStore>, config: ClientConfig) -> Self {
        Self::with_accessor(CacheAccessor::new(store), config)
    }

    pub(crate) fn with_accessor(accessor: CacheAccessor, config: ClientConfig) -> Self {
        if config.lock_ttl <= config.max_lock_wait() {
            warn!(
                "lock_ttl {:?} does not exceed the worst-case acquire wait {:?}; held locks can expire under active waiters",
                config.lock_ttl,
                config.max_lock_wait()
            );
        }
        Self { accessor, config }
    }

    /// Try to take the lock on `key`, waiting out contention.
    ///
    /// Returns `Ok(None)` when every attempt found the lock held; the total
    /// wait in that case is `max_lock_tries * wait_interval`. Store errors
    /// abort the loop immediately.
    pub async fn acquire(&self, key: &str, mode: KeyMode) -> Result<Option<LockToken>> {
        let token = LockToken::generate();
        let lock_key = key::lock_key_for(key);

        let mut acquired = self.try_add(&lock_key, mode, &token).await?;
        let mut tries = 0;
        while !acquired && tries < self.config.max_lock_tries {
            sleep(self.config.wait_interval).await;
            tries += 1;
            acquired = self.try_add(&lock_key, mode, &token).await?;
        }

        if acquired {
            debug!("acquired lock on {key} (tries: {tries})");
            Ok(Some(token))
        } else {
            warn!("lock on {key} still held after {tries} retries, giving up");
            Ok(None)
        }
    }

    /// Release the lock on `key` if `token` still owns it.
    ///
    /// Returns `Ok(false)` without touching the entry when the lock is
    /// absent or held under a different token, which happens when this
    /// holder's TTL lapsed and a successor took over.
    pub async fn release(&self, key: &str, mode: KeyMode, token: &LockToken) -> Result<bool> {
        let lock_key = key::lock_key_for(key);
        match self.accessor.get(&lock_key, mode).await? {
            Some(held) if held == token.as_str() => {
                self.accessor.delete(&lock_key, mode).await?;
                debug!("released lock on {key}");
                Ok(true)
            }
            Some(_) => {
                warn!("lock on {key} now has a different owner, leaving it in place");
                Ok(false)
            }
            None => {
                warn!("lock on {key} was already gone at release");
                Ok(false)
            }
        }
    }

    /// Delete the lock entry for `key` regardless of owner.
    ///
    /// Returns whether an entry was removed. This is the recovery hammer for
    /// orphaned locks; inside guarded operations prefer the token-checked
    /// [`release`](Self::release).
    pub async fn force_release(&self, key: &str, mode: KeyMode) -> Result<bool> {
        let lock_key = key::lock_key_for(key);
        let removed = self.accessor.delete(&lock_key, mode).await?;
        if removed {
            debug!("force-released lock on {key}");
        }
        Ok(removed)
    }

    async fn try_add(&self, lock_key: &str, mode: KeyMode, token: &LockToken) -> Result<bool> {
        self.accessor
            .add(lock_key, mode, token.as_str(), self.config.lock_ttl, false)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn manager_over(store: &Arc<MemoryStore>) -> LockManager {
        LockManager::new(
            Arc::clone(store) as Arc<dyn CacheStore>,
            ClientConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_acquire_stores_token_under_lock_namespace() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager_over(&store);

        let token = manager
            .acquire("session:42", KeyMode::Plain)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            store.get("lock:session:42").await.unwrap(),
            Some(token.as_str().to_string())
        );
        // The data key itself is untouched.
        assert_eq!(store.get("session:42").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_obfuscated_lock_hashes_the_prefixed_key() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager_over(&store);

        let token = manager
            .acquire("session:42", KeyMode::Obfuscated)
            .await
            .unwrap()
            .unwrap();

        // crc32("lock:session:42"), not "lock:" + crc32("session:42")
        assert_eq!(
            store.get("6bd9e38b").await.unwrap(),
            Some(token.as_str().to_string())
        );
        assert_eq!(store.get("lock:a23e32cc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_tokens_are_unique_per_acquisition() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager_over(&store);

        let first = manager.acquire("a", KeyMode::Plain).await.unwrap().unwrap();
        let second = manager.acquire("b", KeyMode::Plain).await.unwrap().unwrap();

        assert_ne!(first, second);
        assert_eq!(first.as_str().len(), 32);
        assert!(first.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_token_displays_as_the_stored_hex_value() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager_over(&store);

        let token = manager
            .acquire("alpha", KeyMode::Plain)
            .await
            .unwrap()
            .unwrap();

        let rendered = token.to_string();
        assert_eq!(store.get("lock:alpha").await.unwrap(), Some(rendered.clone()));
        assert_eq!(rendered, token.as_str());
        assert!(!rendered.chars().any(|c| c.is_ascii_uppercase()));
    }

    #[tokio::test]
    async fn test_release_frees_the_key_for_the_next_acquire() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager_over(&store);

        let token = manager
            .acquire("alpha", KeyMode::Plain)
            .await
            .unwrap()
            .unwrap();
        assert!(manager.release("alpha", KeyMode::Plain, &token).await.unwrap());

        // No contention left, so this succeeds on the first try.
        assert!(manager.acquire("alpha", KeyMode::Plain).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_release_with_stale_token_leaves_lock_in_place() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager_over(&store);

        let token = manager
            .acquire("alpha", KeyMode::Plain)
            .await
            .unwrap()
            .unwrap();

        // Simulate a TTL lapse followed by a successor taking the lock.
        store
            .set("lock:alpha", "someone-else", std::time::Duration::ZERO, true)
            .await
            .unwrap();

        assert!(!manager.release("alpha", KeyMode::Plain, &token).await.unwrap());
        assert_eq!(
            store.get("lock:alpha").await.unwrap(),
            Some("someone-else".to_string())
        );
    }

    #[tokio::test]
    async fn test_release_of_absent_lock_reports_false() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager_over(&store);

        let token = manager
            .acquire("alpha", KeyMode::Plain)
            .await
            .unwrap()
            .unwrap();
        manager.force_release("alpha", KeyMode::Plain).await.unwrap();

        assert!(!manager.release("alpha", KeyMode::Plain, &token).await.unwrap());
    }

    #[tokio::test]
    async fn test_force_release_ignores_ownership_and_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let manager = manager_over(&store);

        manager.acquire("alpha", KeyMode::Plain).await.unwrap().unwrap();

        assert!(manager.force_release("alpha", KeyMode::Plain).await.unwrap());
        assert!(!manager.force_release("alpha", KeyMode::Plain).await.unwrap());
    }
}
