//! Error taxonomy for the processing pipeline

use std::fmt;
use thiserror::Error;

/// Pipeline stage that an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Segmentation,
    Validation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Segmentation => write!(f, "segmentation"),
            Stage::Validation => write!(f, "validation"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{stage} dependency error: {message}")]
    Dependency { stage: Stage, message: String },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl PipelineError {
    /// Classify a remote-call failure under the stage it came from.
    pub fn dependency(stage: Stage, message: impl fmt::Display) -> Self {
        PipelineError::Dependency {
            stage,
            message: message.to_string(),
        }
    }

    /// The stage this error is attributed to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Dependency { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
