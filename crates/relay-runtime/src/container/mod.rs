//! # Relay Container
//!
//! Configuration of all subsystems.

pub mod config;

pub use config::{
    CacheConfig, ConfigError, ForwardingSettings, ProtocolConfig, RelayConfig, ServerFilterConfig,
};
