//! Configuration management for CrabFocus
//!
//! Provides loading, saving and validation of the tunable runtime options:
//! evaluation scheduling cadence and session history depth. The scoring
//! constants are fixed calibration parameters and are not configurable.

use crate::errors::FocusError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    pub scheduler: SchedulerConfig,
    pub session: SessionConfig,
}

/// Evaluation scheduling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Minimum spacing between evaluations started from the live stream (ms)
    pub throttle_interval_ms: u64,
}

/// Focus session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of samples retained in the session history
    pub history_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            throttle_interval_ms: 140,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_capacity: 40,
        }
    }
}

impl FocusConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, FocusError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| FocusError::config(format!("Failed to read config file: {}", e)))?;

        let config: FocusConfig = toml::from_str(&contents)
            .map_err(|e| FocusError::config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), FocusError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| FocusError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("crabfocus.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), FocusError> {
        if self.scheduler.throttle_interval_ms == 0 || self.scheduler.throttle_interval_ms > 10_000
        {
            return Err(FocusError::config(
                "Throttle interval must be between 1 and 10000 ms",
            ));
        }
        if self.session.history_capacity == 0 || self.session.history_capacity > 1000 {
            return Err(FocusError::config("History capacity must be between 1 and 1000"));
        }
        Ok(())
    }
}
