//! Mock implementations for testing

mod store;

pub use store::{MockStore, StoreCall, StoreOp};
