//! Test utilities for the lock-guarded cache client
//!
//! This crate provides mock implementations and fixtures for testing
//! locking behavior without a live cache service.

pub mod mocks;

// Re-export commonly used types
pub use mocks::{MockStore, StoreCall, StoreOp};
