//! Configuration for Rivulet
//!
//! Centralized configuration with sensible defaults.

use std::path::{Path, PathBuf};

use crate::error::{Result, RivuletError};

/// Main configuration for a Rivulet log
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// The log file holding every datum
    pub path: PathBuf,

    /// When to fsync after a mutation
    pub sync_strategy: SyncStrategy,

    /// Buffer size used by sequential readers (in bytes)
    pub read_buffer_size: usize,

    // -------------------------------------------------------------------------
    // Maintenance Configuration
    // -------------------------------------------------------------------------
    /// Directory for update side files. `None` uses the log's own directory.
    ///
    /// Compaction ignores this: its temp file always sits next to the log so
    /// the final rename never crosses a filesystem.
    pub temp_dir: Option<PathBuf>,
}

/// Sync strategy: how durable each mutation is when it returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every append, in-place edit and update (safest, slowest)
    EveryWrite,

    /// Leave flushing to the OS; `Engine::close` still syncs
    OsManaged,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./rivulet.db"),
            sync_strategy: SyncStrategy::EveryWrite,
            read_buffer_size: 64 * 1024, // 64 KB
            temp_dir: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(RivuletError::Config("log path is empty".to_string()));
        }
        if self.read_buffer_size == 0 {
            return Err(RivuletError::Config(
                "read_buffer_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory that receives update side files
    pub fn side_file_dir(&self) -> PathBuf {
        match &self.temp_dir {
            Some(dir) => dir.clone(),
            None => log_dir(&self.path),
        }
    }
}

/// Parent directory of a log file, `.` for bare file names
pub(crate) fn log_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the log file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the sequential read buffer size (in bytes)
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self
    }

    /// Set the directory for update side files
    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
