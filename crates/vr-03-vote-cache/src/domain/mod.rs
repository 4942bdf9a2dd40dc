//! # Domain Layer for the Vote Cache
//!
//! - **snapshot**: persisted form of all queues and the TTL filter
//! - **errors**: persistence failures

mod errors;
mod snapshot;

pub use errors::*;
pub use snapshot::*;
