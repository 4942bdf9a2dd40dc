//! # JSON File Store
//!
//! Persists the cache as one pretty-printed JSON document. Writes go to a
//! sibling temporary file that is then renamed over the target, so a crash
//! mid-write leaves the previous file intact.

use crate::domain::{CacheError, CacheSnapshot};
use crate::ports::CacheStore;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// [`CacheStore`] backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> CacheError {
        CacheError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl CacheStore for JsonFileStore {
    fn persist(&self, snapshot: &CacheSnapshot) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(parent, e))?;
        }

        let data = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        let temp = self.temp_path();
        fs::write(&temp, data).map_err(|e| self.io_error(&temp, e))?;
        fs::rename(&temp, &self.path).map_err(|e| self.io_error(&self.path, e))?;

        debug!(path = %self.path.display(), votes = snapshot.len(), "Wrote vote cache file");
        Ok(())
    }

    fn load_all(&self) -> Result<CacheSnapshot, CacheError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CacheSnapshot::default())
            }
            Err(e) => return Err(self.io_error(&self.path, e)),
        };

        serde_json::from_slice(&data).map_err(|e| CacheError::Corrupt {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
