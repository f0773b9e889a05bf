//! Configuration sections.
//!
//! - [`LoggingConfig`] - log filter, output format and optional log file
//! - [`PipelineConfig`] - limits applied by [`Pipeline`](crate::pipeline::Pipeline)
//! - [`InspectorConfig`] - sizing and fallback policy for pin inspectors
//!
//! Every section deserializes with defaults for missing keys, so a partial
//! config file is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default tracing filter directive
pub const DEFAULT_LOG_FILTER: &str = "info,plv_rs=debug";

/// Default maximum inspector width in pixels
pub const DEFAULT_INSPECTOR_MAX_WIDTH: u32 = 320;

/// Default maximum inspector height in pixels
pub const DEFAULT_INSPECTOR_MAX_HEIGHT: u32 = 240;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-field lines
    #[default]
    Full,
    /// Single-line compact output
    Compact,
    /// Newline-delimited JSON
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Full => write!(f, "full"),
            LogFormat::Compact => write!(f, "compact"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `PLV_LOG` / `RUST_LOG` are unset
    pub filter: String,

    /// Console output format
    pub format: LogFormat,

    /// Directory for a daily-rotated log file (disabled when `None`)
    pub log_dir: Option<PathBuf>,

    /// Whether to emit ANSI colors on the console
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            format: LogFormat::default(),
            log_dir: None,
            ansi: true,
        }
    }
}

/// Pipeline limits
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of elements (0 = unlimited)
    pub max_elements: usize,
}

/// Inspector settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    /// Maximum inspector width in pixels
    pub max_width: u32,

    /// Maximum inspector height in pixels
    pub max_height: u32,

    /// Attach a raw inspector to pins whose type has no registered inspector
    pub fallback_enabled: bool,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_INSPECTOR_MAX_WIDTH,
            max_height: DEFAULT_INSPECTOR_MAX_HEIGHT,
            fallback_enabled: true,
        }
    }
}

impl InspectorConfig {
    pub fn max_size(&self) -> (u32, u32) {
        (self.max_width, self.max_height)
    }
}
