//! # Driven Ports (Outbound SPI)
//!
//! Persistence and time, both supplied by the host.

use crate::domain::{CacheError, CacheSnapshot};

/// Durable storage for the cache across restarts.
///
/// Only called at startup (`load_all`) and orderly shutdown (`persist`).
pub trait CacheStore: Send + Sync {
    /// Replace the stored cache with `snapshot`.
    fn persist(&self, snapshot: &CacheSnapshot) -> Result<(), CacheError>;

    /// Read the stored cache. A store that was never written is empty.
    fn load_all(&self) -> Result<CacheSnapshot, CacheError>;
}

/// Wall-clock time source in milliseconds since the epoch.
pub trait TimeSource: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Mock time source for testing.
#[cfg(test)]
pub struct MockTimeSource {
    time: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl MockTimeSource {
    pub fn new(initial: u64) -> Self {
        Self {
            time: std::sync::atomic::AtomicU64::new(initial),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.time
            .fetch_add(ms, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl TimeSource for MockTimeSource {
    fn now_millis(&self) -> u64 {
        self.time.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// In-memory store for testing.
#[cfg(test)]
#[derive(Default)]
pub struct MockCacheStore {
    pub stored: parking_lot::Mutex<Option<CacheSnapshot>>,
    pub fail: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl CacheStore for MockCacheStore {
    fn persist(&self, snapshot: &CacheSnapshot) -> Result<(), CacheError> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(CacheError::Serialization("mock failure".to_string()));
        }
        *self.stored.lock() = Some(snapshot.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<CacheSnapshot, CacheError> {
        Ok(self.stored.lock().clone().unwrap_or_default())
    }
}
