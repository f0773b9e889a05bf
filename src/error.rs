//! Error handling for plv-rs
//!
//! This module defines the crate-level error type and a Result alias.
//! Pipeline graph errors live in [`crate::pipeline::PipelineError`] and
//! convert into [`PlvError`] with `?`.

use crate::pipeline::PipelineError;
use thiserror::Error;

/// Main error type for plv-rs operations
#[derive(Error, Debug)]
pub enum PlvError {
    /// A null handle was dereferenced through a checked accessor
    #[error("Null handle dereferenced: {0}")]
    NullHandle(&'static str),

    /// Errors raised by the pipeline graph or its lifecycle
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// An inspector is already registered for this pin type
    #[error("Inspector already registered for type {type_name}")]
    DuplicateInspector { type_name: &'static str },

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors raised while installing the log subscriber
    #[error("Logging error: {0}")]
    Logging(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PlvError>,
    },
}

impl PlvError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PlvError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for plv-rs operations
pub type Result<T> = std::result::Result<T, PlvError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, PipelineError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PlvError::from(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| PlvError::from(e).with_context(f()))
    }
}
