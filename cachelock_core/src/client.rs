//! Lock-guarded operations over the cache service.
//!
//! Every public operation here takes the per-key advisory lock before
//! touching the data key and releases it on every exit path, including when
//! the body propagates a store error. When both the body and the release
//! fail, the body's error wins.

use crate::ClientConfig;
use crate::accessor::CacheAccessor;
use crate::error::Result;
use crate::key::KeyMode;
use crate::lock::{LockManager, LockToken};
use crate::store::CacheStore;
use log::debug;
use std::sync::Arc;
use std::time::Duration;

/// Per-call storage options for the mutating operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueOptions {
    /// Entry lifetime; `None` falls back to the client's `default_ttl`.
    pub ttl: Option<Duration>,
    /// Raw-storage hint forwarded to the store verbatim.
    pub raw: bool,
}

impl ValueOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn raw_mode(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }
}

/// Cache client whose read-modify-write operations are serialized per key.
///
/// Concurrent callers against the same store coordinate through lock entries
/// in the `lock:` namespace; the store's atomic `add` is the only mutual
/// exclusion primitive involved. Operations that cannot take the lock within
/// the configured retry budget return an absent or `false` result rather
/// than an error, so callers can distinguish contention from store failure.
///
/// Note that [`get`](Self::get) and [`get_and_delete`](Self::get_and_delete)
/// report contention and a genuinely absent value the same way (`Ok(None)`);
/// callers that need to tell them apart should use [`acquire`](Self::acquire)
/// directly.
pub struct LockedCache {
    accessor: CacheAccessor,
    lock: LockManager,
    config: ClientConfig,
}

impl LockedCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self::with_config(store, ClientConfig::default())
    }

    pub fn with_config(store: Arc<dyn CacheStore>, config: ClientConfig) -> Self {
        let accessor = CacheAccessor::new(store);
        let lock = LockManager::with_accessor(accessor.clone(), config.clone());
        Self {
            accessor,
            lock,
            config,
        }
    }

    /// Read the value at `key` under the lock.
    pub async fn get(&self, key: &str, mode: KeyMode) -> Result<Option<String>> {
        let Some(token) = self.lock.acquire(key, mode).await? else {
            return Ok(None);
        };
        let outcome = self.accessor.get(key, mode).await;
        let released = self.lock.release(key, mode, &token).await;
        let value = outcome?;
        released?;
        if value.is_some() {
            debug!("locked get hit for {key}");
        } else {
            debug!("locked get miss for {key}");
        }
        Ok(value)
    }

    /// Read the value at `key` and remove it, under one lock hold.
    ///
    /// Returns the value that was present. An absent key performs no delete
    /// call at all.
    pub async fn get_and_delete(&self, key: &str, mode: KeyMode) -> Result<Option<String>> {
        let Some(token) = self.lock.acquire(key, mode).await? else {
            return Ok(None);
        };
        let outcome = self.take_value(key, mode).await;
        let released = self.lock.release(key, mode, &token).await;
        let value = outcome?;
        released?;
        if value.is_some() {
            debug!("locked take hit for {key}");
        } else {
            debug!("locked take miss for {key}");
        }
        Ok(value)
    }

    /// Write `value` at `key` under the lock.
    ///
    /// Returns `Ok(false)` only when the lock could not be taken.
    pub async fn set(
        &self,
        key: &str,
        value: &str,
        mode: KeyMode,
        options: ValueOptions,
    ) -> Result<bool> {
        let Some(token) = self.lock.acquire(key, mode).await? else {
            return Ok(false);
        };
        let outcome = self.store_value(key, mode, value, options).await;
        let released = self.lock.release(key, mode, &token).await;
        outcome?;
        released?;
        Ok(true)
    }

    /// Append `value` to the delimited list at `key`, under the lock.
    ///
    /// An absent prior value is treated as the empty string, so the first
    /// append to a key yields a leading delimiter (`",x"` for delimiter `,`).
    /// Callers should expect that shape rather than treat it as corrupt.
    pub async fn append(
        &self,
        key: &str,
        value: &str,
        delimiter: &str,
        mode: KeyMode,
        options: ValueOptions,
    ) -> Result<bool> {
        let Some(token) = self.lock.acquire(key, mode).await? else {
            return Ok(false);
        };
        let outcome = self.append_value(key, mode, value, delimiter, options).await;
        let released = self.lock.release(key, mode, &token).await;
        outcome?;
        released?;
        Ok(true)
    }

    /// Remove the first occurrence of `target` from the delimited list at
    /// `key`, under the lock.
    ///
    /// When the removal empties the list the key is deleted outright. With
    /// `target: None` the value is split and rejoined unchanged, which still
    /// refreshes its TTL. An absent key is left untouched; the result is
    /// `Ok(false)` only when the lock could not be taken.
    pub async fn remove_value(
        &self,
        key: &str,
        target: Option<&str>,
        delimiter: &str,
        mode: KeyMode,
        options: ValueOptions,
    ) -> Result<bool> {
        let Some(token) = self.lock.acquire(key, mode).await? else {
            return Ok(false);
        };
        let outcome = self
            .remove_value_body(key, mode, target, delimiter, options)
            .await;
        let released = self.lock.release(key, mode, &token).await;
        outcome?;
        released?;
        Ok(true)
    }

    /// Take the lock on `key` without running an operation body.
    ///
    /// This is the escape hatch for multi-operation critical sections; the
    /// caller owns the returned token and must hand it back via
    /// [`release`](Self::release).
    pub async fn acquire(&self, key: &str, mode: KeyMode) -> Result<Option<LockToken>> {
        self.lock.acquire(key, mode).await
    }

    /// Release a lock previously taken with [`acquire`](Self::acquire).
    pub async fn release(&self, key: &str, mode: KeyMode, token: &LockToken) -> Result<bool> {
        self.lock.release(key, mode, token).await
    }

    /// Remove the lock entry for `key` regardless of owner.
    pub async fn force_release(&self, key: &str, mode: KeyMode) -> Result<bool> {
        self.lock.force_release(key, mode).await
    }

    fn value_ttl(&self, options: ValueOptions) -> Duration {
        options.ttl.unwrap_or(self.config.default_ttl)
    }

    async fn take_value(&self, key: &str, mode: KeyMode) -> Result<Option<String>> {
        let value = self.accessor.get(key, mode).await?;
        if value.is_some() {
            self.accessor.delete(key, mode).await?;
        }
        Ok(value)
    }

    async fn store_value(
        &self,
        key: &str,
        mode: KeyMode,
        value: &str,
        options: ValueOptions,
    ) -> Result<()> {
        self.accessor
            .set(key, mode, value, self.value_ttl(options), options.raw)
            .await?;
        Ok(())
    }

    async fn append_value(
        &self,
        key: &str,
        mode: KeyMode,
        value: &str,
        delimiter: &str,
        options: ValueOptions,
    ) -> Result<()> {
        let old = self.accessor.get(key, mode).await?.unwrap_or_default();
        let joined = format!("{old}{delimiter}{value}");
        self.accessor
            .set(key, mode, &joined, self.value_ttl(options), options.raw)
            .await?;
        Ok(())
    }

    async fn remove_value_body(
        &self,
        key: &str,
        mode: KeyMode,
        target: Option<&str>,
        delimiter: &str,
        options: ValueOptions,
    ) -> Result<()> {
        let Some(current) = self.accessor.get(key, mode).await? else {
            return Ok(());
        };
        let mut elements: Vec<&str> = current.split(delimiter).collect();
        if let Some(target) = target
            && let Some(index) = elements.iter().position(|element| *element == target)
        {
            elements.remove(index);
        }
        if elements.is_empty() {
            debug!("list at {key} emptied, deleting entry");
            self.accessor.delete(key, mode).await?;
        } else {
            let rejoined = elements.join(delimiter);
            self.accessor
                .set(key, mode, &rejoined, self.value_ttl(options), options.raw)
                .await?;
        }
        Ok(())
    }
}
