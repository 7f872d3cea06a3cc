use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cleaner::{DeleteOptions, DEFAULT_PROGRESS_INTERVAL};
use crate::error::{ConfigError, Result};
use crate::scanner::{ScanOptions, DEFAULT_CHANNEL_CAPACITY, DEFAULT_PROGRESS_THRESHOLD};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub delete: DeleteConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Number of parallel workers (0 = one per target)
    pub threads: usize,
    /// Bytes between intermediate size updates
    pub progress_threshold: u64,
    /// Buffered events before workers wait for the consumer
    pub channel_capacity: usize,
    /// Directories whose subdirectories are offered as candidates
    pub base_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteConfig {
    /// Files removed between progress events
    pub progress_interval: u64,
    /// Ask for confirmation before deleting
    pub confirm: bool,
    /// Buffered deletion events before the worker waits for the consumer
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Write logs to this file instead of stderr
    pub file: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            progress_threshold: DEFAULT_PROGRESS_THRESHOLD,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            base_paths: vec![],
        }
    }
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            confirm: true,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Config {
    /// Default config file location (`~/.config/rusty-reaper/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("rusty-reaper").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default location is used
    /// when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        let config = toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(config)
    }

    /// Reject values the engines cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.delete.progress_interval == 0 {
            return Err(ConfigError::Invalid("delete.progress_interval must be > 0".into()).into());
        }
        if self.scan.channel_capacity == 0 {
            return Err(ConfigError::Invalid("scan.channel_capacity must be > 0".into()).into());
        }
        if self.delete.channel_capacity == 0 {
            return Err(ConfigError::Invalid("delete.channel_capacity must be > 0".into()).into());
        }
        Ok(())
    }

    /// Scan engine options from the `[scan]` section.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::new()
            .with_threads(self.scan.threads)
            .with_progress_threshold(self.scan.progress_threshold)
            .with_channel_capacity(self.scan.channel_capacity)
    }

    /// Delete engine options from the `[delete]` section.
    pub fn delete_options(&self) -> DeleteOptions {
        DeleteOptions {
            progress_interval: self.delete.progress_interval,
            channel_capacity: self.delete.channel_capacity,
        }
    }
}
