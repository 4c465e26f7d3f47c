//! Cache Lock Core Library
//!
//! This is the core library for the lock-guarded cache client, providing
//! per-key advisory locking, key obfuscation, and guarded read-modify-write
//! operations over a memcached-style cache store.
//!
//! # Example
//!
//! ```no_run
//! use cachelock_core::{KeyMode, LockedCache, MemoryStore, ValueOptions};
//! use std::sync::Arc;
//!
//! # async fn demo() -> cachelock_core::Result<()> {
//! let cache = LockedCache::new(Arc::new(MemoryStore::new()));
//! cache
//!     .set("user:1", "42", KeyMode::Obfuscated, ValueOptions::new())
//!     .await?;
//! let value = cache.get("user:1", KeyMode::Obfuscated).await?;
//! assert_eq!(value.as_deref(), Some("42"));
//! # Ok(())
//! # }
//! ```

mod accessor;
pub mod client;
pub mod error;
pub mod key;
pub mod lock;
pub mod store;

// Re-export main types
pub use client::{LockedCache, ValueOptions};
pub use error::{Result, StoreError};
pub use key::{KeyMode, LOCK_PREFIX, lock_key_for, obfuscate_key};
pub use lock::{LockManager, LockToken};
pub use store::{CacheStore, MemoryStore};

use std::time::Duration;

/// Locking client configuration
///
/// `lock_ttl` is the safety net against crashed lock holders and must stay
/// well above [`max_lock_wait`](Self::max_lock_wait), or a slow holder's lock
/// can expire out from under it while waiters are still polling.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ClientConfig {
    pub wait_interval: Duration,
    pub max_lock_tries: u32,
    pub lock_ttl: Duration,
    pub default_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            wait_interval: Duration::from_millis(20),
            max_lock_tries: 25,                    // worst-case wait 25 x 20ms = 500ms
            lock_ttl: Duration::from_secs(60),     // one minute
            default_ttl: Duration::from_secs(3600), // 1 hour
        }
    }
}

impl ClientConfig {
    /// Create a test configuration
    pub fn test() -> Self {
        Self {
            wait_interval: Duration::from_millis(1),
            max_lock_tries: 3,
            lock_ttl: Duration::from_secs(5),
            default_ttl: Duration::from_secs(60),
        }
    }

    /// Worst-case time `acquire` spends polling a held lock before giving up.
    pub fn max_lock_wait(&self) -> Duration {
        self.wait_interval * self.max_lock_tries
    }
}
