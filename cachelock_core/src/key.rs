//! Key derivation: obfuscation and the lock-key namespace
//!
//! Every logical key maps to exactly one physical key per [`KeyMode`]; the
//! mapping is a pure function of the key bytes, so any process talking to the
//! same cache service derives the same physical keys.

use crc32fast::Hasher as Crc32Hasher;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Namespace prefix that turns a logical key into its lock key.
///
/// The prefix is applied before obfuscation, so the lock entry for an
/// obfuscated key lives at `crc32("lock:" + key)`, not at a decorated form of
/// the data key's hash.
pub const LOCK_PREFIX: &str = "lock:";

/// How a logical key is mapped to the physical key sent to the cache service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyMode {
    /// The logical key is sent unchanged.
    Plain,
    /// The logical key is replaced by its CRC32, rendered as 8 hex digits.
    ///
    /// Obfuscation normalizes key length and keeps arbitrary caller strings
    /// out of the shared keyspace. It is not encryption and not a security
    /// feature: CRC32 is fast, not reversible protection, and distinct
    /// logical keys may collide. Callers choosing this mode accept that
    /// risk.
    Obfuscated,
}

impl fmt::Display for KeyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMode::Plain => write!(f, "plain"),
            KeyMode::Obfuscated => write!(f, "obfuscated"),
        }
    }
}

/// CRC32 of the key bytes, rendered as 8 lowercase hex digits.
pub fn obfuscate_key(key: &str) -> String {
    let mut hasher = Crc32Hasher::new();
    hasher.update(key.as_bytes());
    format!("{:08x}", hasher.finalize())
}

/// The lock key protecting `key`.
pub fn lock_key_for(key: &str) -> String {
    format!("{LOCK_PREFIX}{key}")
}

/// The physical key dispatched to the cache service for `key` under `mode`.
pub fn physical_key(key: &str, mode: KeyMode) -> Cow<'_, str> {
    match mode {
        KeyMode::Plain => Cow::Borrowed(key),
        KeyMode::Obfuscated => Cow::Owned(obfuscate_key(key)),
    }
}
