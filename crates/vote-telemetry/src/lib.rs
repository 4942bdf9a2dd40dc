//! # Vote Telemetry
//!
//! Logging and metrics for the vote relay.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` with an `EnvFilter` and a pretty or
//!   JSON formatter
//! - **Metrics**: Prometheus counters and gauges in a crate-level registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vote_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     init_telemetry(&TelemetryConfig::from_env()).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `VR_SERVICE_NAME` | `vote-relay` | Service name in logs |
//! | `VR_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` also accepted) |
//! | `VR_JSON_LOGS` | `false` | JSON log lines (defaults on in containers) |
//! | `VR_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};
pub use metrics::{
    encode_metrics, register_metrics, sync_counter, CACHE_PENDING, CONNECTION_FAILURES,
    DECODE_FAILURES, VOTES_CACHED, VOTES_FORWARDED, VOTES_LOST, VOTES_RECEIVED, VOTES_REPLAYED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Register metrics and install the global log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}
