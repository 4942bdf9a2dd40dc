//! # Integration Flows
//!
//! Cross-subsystem behaviour through the relay runtime.

pub mod relay_flows;
pub mod replay_timing;
