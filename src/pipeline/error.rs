//! Pipeline-specific error types.

use crate::pipeline::executor::PipelineState;
use thiserror::Error;

/// Errors that can occur within the pipeline graph and its lifecycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Cannot add a null element handle")]
    NullElement,

    #[error("Pipeline is full ({limit} elements)")]
    CapacityExceeded { limit: usize },

    #[error("Element '{element}' already has an output pin named '{pin}'")]
    DuplicatePin { element: String, pin: String },

    #[error("Pipeline is already running")]
    AlreadyRunning,

    #[error("Pipeline not running (state: {0})")]
    NotRunning(PipelineState),

    #[error("Pipeline must be stopped before it is cleared")]
    ClearWhileRunning,
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
