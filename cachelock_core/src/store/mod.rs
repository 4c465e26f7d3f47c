//! Cache service collaborator contract
//!
//! The locking layer consumes the external cache service through exactly four
//! primitives. Hosts implement [`CacheStore`] over their real memcached-style
//! client; [`MemoryStore`] is the bundled in-process implementation used for
//! embedded deployments and tests.

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub mod memory;

pub use memory::MemoryStore;

/// The four-primitive contract of a memcached-style cache service.
///
/// # TTL convention
///
/// `ttl` is seconds-to-live; `Duration::ZERO` means the entry never expires
/// (the memcached convention). Sub-second precision is allowed and
/// implementations round down if their wire protocol cannot carry it.
///
/// # Raw mode
///
/// `raw` is a storage hint the implementation interprets: `true` asks for the
/// value bytes to be stored verbatim, `false` permits the backend's own
/// serialized representation. It never changes what this library reads back.
///
/// # Atomicity
///
/// `add` must be atomic: for a given absent key, exactly one of any set of
/// concurrent `add` calls may return `Ok(true)`. Everything this library
/// guarantees about mutual exclusion rests on that property.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch the value stored at `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` at `key` only if no live entry exists there.
    ///
    /// Returns `Ok(false)` when the key already existed; the stored value is
    /// left untouched in that case.
    async fn add(&self, key: &str, value: &str, ttl: Duration, raw: bool) -> Result<bool>;

    /// Store `value` at `key` unconditionally, creating or overwriting.
    async fn set(&self, key: &str, value: &str, ttl: Duration, raw: bool) -> Result<bool>;

    /// Remove the entry at `key`.
    ///
    /// Returns whether a live entry was removed. Deleting an absent key is a
    /// no-op reported as `Ok(false)`, never an error.
    async fn delete(&self, key: &str) -> Result<bool>;
}
