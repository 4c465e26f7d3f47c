//! Mock implementation of CacheStore for testing

use async_trait::async_trait;
use cachelock_core::error::{Result, StoreError};
use cachelock_core::store::CacheStore;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// The four store primitives, used to script failures and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Get,
    Add,
    Set,
    Delete,
}

/// One recorded store call with the arguments it received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Get {
        key: String,
    },
    Add {
        key: String,
        value: String,
        ttl: Duration,
        raw: bool,
    },
    Set {
        key: String,
        value: String,
        ttl: Duration,
        raw: bool,
    },
    Delete {
        key: String,
    },
}

impl StoreCall {
    pub fn op(&self) -> StoreOp {
        match self {
            StoreCall::Get { .. } => StoreOp::Get,
            StoreCall::Add { .. } => StoreOp::Add,
            StoreCall::Set { .. } => StoreOp::Set,
            StoreCall::Delete { .. } => StoreOp::Delete,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            StoreCall::Get { key }
            | StoreCall::Add { key, .. }
            | StoreCall::Set { key, .. }
            | StoreCall::Delete { key } => key,
        }
    }
}

#[derive(Default)]
struct MockState {
    entries: HashMap<String, String>,
    calls: Vec<StoreCall>,
    failures: Vec<StoreOp>,
}

/// Mock implementation of CacheStore for testing
///
/// Behaves like a live store for get/add/set/delete while recording every
/// call with the arguments it received, so tests can assert on the exact
/// traffic an operation produced. TTL values are recorded but no expiry is
/// simulated; timing behavior belongs to the in-memory store's own tests.
///
/// # Examples
///
/// ```rust,no_run
/// use cachelock_core::store::CacheStore;
/// use cachelock_test_utils::{MockStore, StoreOp};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MockStore::new();
/// store.insert("session:1", "42");
/// store.fail_next(StoreOp::Get);
///
/// assert!(store.get("session:1").await.is_err());
/// assert_eq!(store.get("session:1").await?, Some("42".to_string()));
/// # Ok(())
/// # }
/// ```
pub struct MockStore {
    state: Mutex<MockState>,
}

impl MockStore {
    /// Create a new mock store with no entries and no scripted failures.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
        }
    }

    /// Seed an entry directly, without going through the call log.
    pub fn insert(&self, key: &str, value: &str) {
        self.state
            .lock()
            .unwrap()
            .entries
            .insert(key.to_string(), value.to_string());
    }

    /// Current value at `key`, bypassing the call log.
    pub fn value(&self, key: &str) -> Option<String> {
        self.state.lock().unwrap().entries.get(key).cloned()
    }

    /// Configure the mock to fail the next call of the given kind.
    ///
    /// Scripted failures are consumed one per matching call and surface as
    /// connection errors.
    pub fn fail_next(&self, op: StoreOp) {
        self.state.lock().unwrap().failures.push(op);
    }

    /// Every call recorded so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of recorded calls of the given kind.
    pub fn call_count(&self, op: StoreOp) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|call| call.op() == op)
            .count()
    }

    /// Drop the recorded calls, keeping entries and scripted failures.
    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    fn take_failure(state: &mut MockState, op: StoreOp) -> bool {
        match state.failures.iter().position(|failure| *failure == op) {
            Some(index) => {
                state.failures.remove(index);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl CacheStore for MockStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Get {
            key: key.to_string(),
        });
        if Self::take_failure(&mut state, StoreOp::Get) {
            return Err(StoreError::connection("mock get failure"));
        }
        Ok(state.entries.get(key).cloned())
    }

    async fn add(&self, key: &str, value: &str, ttl: Duration, raw: bool) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Add {
            key: key.to_string(),
            value: value.to_string(),
            ttl,
            raw,
        });
        if Self::take_failure(&mut state, StoreOp::Add) {
            return Err(StoreError::connection("mock add failure"));
        }
        if state.entries.contains_key(key) {
            return Ok(false);
        }
        state.entries.insert(key.to_string(), value.to_string());
        Ok(true)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration, raw: bool) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Set {
            key: key.to_string(),
            value: value.to_string(),
            ttl,
            raw,
        });
        if Self::take_failure(&mut state, StoreOp::Set) {
            return Err(StoreError::connection("mock set failure"));
        }
        state.entries.insert(key.to_string(), value.to_string());
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Delete {
            key: key.to_string(),
        });
        if Self::take_failure(&mut state, StoreOp::Delete) {
            return Err(StoreError::connection("mock delete failure"));
        }
        Ok(state.entries.remove(key).is_some())
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}
