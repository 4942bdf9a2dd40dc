//! # Forwarding Configuration

use super::drain::DrainSchedule;
use super::errors::ForwardingError;
use super::filter::ServerFilter;

/// Default maximum votes per replay chunk.
pub const DEFAULT_DUMP_RATE: usize = 5;

/// Settings of the forwarding source and its replay engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingConfig {
    /// Maximum votes delivered in one replay chunk.
    pub dump_rate: usize,
    /// Which backend servers take part.
    pub filter: ServerFilter,
    /// Cool-downs between replay chunks.
    pub schedule: DrainSchedule,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            dump_rate: DEFAULT_DUMP_RATE,
            filter: ServerFilter::AllowAll,
            schedule: DrainSchedule::default(),
        }
    }
}

impl ForwardingConfig {
    pub fn validate(&self) -> Result<(), ForwardingError> {
        if self.dump_rate == 0 {
            return Err(ForwardingError::InvalidDumpRate(self.dump_rate));
        }
        Ok(())
    }
}
