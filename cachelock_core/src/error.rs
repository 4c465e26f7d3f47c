//! Error types for the cachelock core library
//!
//! Lock contention is never reported through this module: an exhausted
//! acquisition budget surfaces as `Ok(None)` / `Ok(false)` from the guarded
//! operations, so callers can always tell "try again later" apart from
//! "the cache service failed".

use thiserror::Error;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors reported by the cache service collaborator.
///
/// Implementations of [`CacheStore`](crate::CacheStore) map their client's
/// failures into these categories. The library propagates them unmodified;
/// it never retries a failed store call.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The cache service could not be reached (connect, timeout, dropped
    /// connection).
    #[error("cache service connection error: {message}")]
    Connection { message: String },

    /// The cache service rejected or failed a command it received.
    #[error("cache service rejected {command}: {message}")]
    Command { command: String, message: String },

    /// A stored payload could not be produced or interpreted.
    #[error("cache value error: {message}")]
    Value { message: String },
}

impl StoreError {
    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a command error
    pub fn command(command: &str, message: impl Into<String>) -> Self {
        Self::Command {
            command: command.to_string(),
            message: message.into(),
        }
    }

    /// Create a value error
    pub fn value(message: impl Into<String>) -> Self {
        Self::Value {
            message: message.into(),
        }
    }

    /// Check if this error is transient and the call worth repeating
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error() {
        let error = StoreError::connection("connect timed out after 250ms");
        assert!(error.to_string().contains("connection error"));
        assert!(error.to_string().contains("connect timed out"));
        assert!(error.is_transient());
    }

    #[test]
    fn test_command_error() {
        let error = StoreError::command("add", "SERVER_ERROR out of memory");
        assert!(error.to_string().contains("rejected add"));
        assert!(error.to_string().contains("out of memory"));
        assert!(!error.is_transient());
    }

    #[test]
    fn test_value_error() {
        let error = StoreError::value("payload is not valid UTF-8");
        assert!(error.to_string().contains("cache value error"));
        assert!(!error.is_transient());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<StoreError>();
        assert_sync::<StoreError>();
    }
}
