//! # Domain Layer for Vote Forwarding
//!
//! - **filter**: which backend servers take part
//! - **drain**: the replay state machine
//! - **config**: dump rate, filter and cool-downs
//! - **report**: per-vote fan-out results and running counters
//! - **errors**: configuration and shutdown failures

mod config;
mod drain;
mod errors;
mod filter;
mod report;

pub use config::*;
pub use drain::*;
pub use errors::*;
pub use filter::*;
pub use report::*;
