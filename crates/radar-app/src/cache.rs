//! Local copy of the landing configuration, read before the store answers.

use std::path::{Path, PathBuf};

use radar_core::LandingConfig;

use crate::error::CacheError;

/// JSON file at `{dir}/{key}.json`, where `key` is `"<app>_config"`.
#[derive(Debug, Clone)]
pub struct LocalCache {
    path: PathBuf,
}

impl LocalCache {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> CacheError {
        CacheError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    /// Returns the cached configuration, or `None` if nothing was cached yet.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<LandingConfig>, CacheError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Overwrites the cache. Writes to a sibling temp file and renames it so
    /// a crash never leaves a half-written file behind.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on serialization or I/O failure.
    pub fn store(&self, config: &LandingConfig) -> Result<(), CacheError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        tracing::debug!(path = %self.path.display(), "landing config cached");
        Ok(())
    }
}
