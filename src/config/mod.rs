//! Configuration module for plv-rs
//!
//! Configuration is a single TOML file with one table per section:
//!
//! ```toml
//! [logging]
//! filter = "info,plv_rs=trace"
//! format = "compact"
//!
//! [pipeline]
//! max_elements = 64
//!
//! [inspector]
//! max_width = 320
//! max_height = 240
//! fallback_enabled = true
//! ```
//!
//! # Config Location
//!
//! The default file lives in the platform-appropriate config directory
//! under `nl.utwente.plv-rs`:
//! - **Linux**: `~/.config/nl.utwente.plv-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/nl.utwente.plv-rs/config.toml`
//! - **Windows**: `%APPDATA%\nl.utwente.plv-rs\config.toml`

pub mod settings;

pub use settings::*;

use crate::error::{PlvError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "nl.utwente.plv-rs";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Get the application config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlvConfig {
    pub logging: LoggingConfig,
    pub pipeline: PipelineConfig,
    pub inspector: InspectorConfig,
}

impl PlvConfig {
    /// Load a config file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            PlvError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::from_toml(&content)
            .map_err(|e| e.with_context(format!("Failed to parse config file {:?}", path)))
    }

    /// Load the config from the default location, returning defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Parse a config from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| PlvError::Config(e.to_string()))
    }

    /// Serialize to TOML text
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| PlvError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Save to disk as TOML, creating the parent directory if needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PlvError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| {
            PlvError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }
}
