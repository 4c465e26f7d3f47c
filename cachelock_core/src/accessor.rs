//! Key-mode-aware access to the underlying store.

use crate::error::Result;
use crate::key::{self, KeyMode};
use crate::store::CacheStore;
use log::trace;
use std::sync::Arc;
use std::time::Duration;

/// Applies the caller's [`KeyMode`] before every store call.
///
/// All traffic from the locking layer and the guarded operations funnels
/// through here, so logical-to-physical key derivation happens in exactly one
/// place.
#[derive(Clone)]
pub(crate) struct CacheAccessor {
    store: Arc<dyn CacheStore>,
}

impl CacheAccessor {
    pub(crate) fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub(crate) async fn get(&self, key: &str, mode: KeyMode) -> Result<Option<String>> {
        let physical = key::physical_key(key, mode);
        trace!("cache get {physical}");
        self.store.get(&physical).await
    }

    pub(crate) async fn add(
        &self,
        key: &str,
        mode: KeyMode,
        value: &str,
        ttl: Duration,
        raw: bool,
    ) -> Result<bool> {
        let physical = key::physical_key(key, mode);
        trace!("cache add {physical} (ttl: {ttl:?}, raw: {raw})");
        self.store.add(&physical, value, ttl, raw).await
    }

    pub(crate) async fn set(
        &self,
        key: &str,
        mode: KeyMode,
        value: &str,
        ttl: Duration,
        raw: bool,
    ) -> Result<bool> {
        let physical = key::physical_key(key, mode);
        trace!("cache set {physical} (ttl: {ttl:?}, raw: {raw})");
        self.store.set(&physical, value, ttl, raw).await
    }

    pub(crate) async fn delete(&self, key: &str, mode: KeyMode) -> Result<bool> {
        let physical = key::physical_key(key, mode);
        trace!("cache delete {physical}");
        self.store.delete(&physical).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const NO_EXPIRY: Duration = Duration::ZERO;

    fn accessor_over(store: &Arc<MemoryStore>) -> CacheAccessor {
        CacheAccessor::new(Arc::clone(store) as Arc<dyn CacheStore>)
    }

    #[tokio::test]
    async fn test_plain_mode_uses_key_verbatim() {
        let store = Arc::new(MemoryStore::new());
        let accessor = accessor_over(&store);

        accessor
            .set("hello", KeyMode::Plain, "v", NO_EXPIRY, false)
            .await
            .unwrap();

        assert_eq!(store.get("hello").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_obfuscated_mode_stores_under_crc32_digest() {
        let store = Arc::new(MemoryStore::new());
        let accessor = accessor_over(&store);

        accessor
            .set("hello", KeyMode::Obfuscated, "v", NO_EXPIRY, false)
            .await
            .unwrap();

        // crc32("hello")
        assert_eq!(store.get("3610a686").await.unwrap(), Some("v".to_string()));
        assert_eq!(store.get("hello").await.unwrap(), None);
        assert_eq!(
            accessor.get("hello", KeyMode::Obfuscated).await.unwrap(),
            Some("v".to_string())
        );
    }

    #[tokio::test]
    async fn test_modes_address_disjoint_entries() {
        let store = Arc::new(MemoryStore::new());
        let accessor = accessor_over(&store);

        accessor
            .set("alpha", KeyMode::Plain, "plain", NO_EXPIRY, false)
            .await
            .unwrap();
        accessor
            .set("alpha", KeyMode::Obfuscated, "digest", NO_EXPIRY, false)
            .await
            .unwrap();

        assert_eq!(
            accessor.get("alpha", KeyMode::Plain).await.unwrap(),
            Some("plain".to_string())
        );
        assert_eq!(
            accessor.get("alpha", KeyMode::Obfuscated).await.unwrap(),
            Some("digest".to_string())
        );

        assert!(accessor.delete("alpha", KeyMode::Plain).await.unwrap());
        assert_eq!(accessor.get("alpha", KeyMode::Plain).await.unwrap(), None);
        assert_eq!(
            accessor.get("alpha", KeyMode::Obfuscated).await.unwrap(),
            Some("digest".to_string())
        );
    }
}
