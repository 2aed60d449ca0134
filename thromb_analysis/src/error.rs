//! Error types for the analysis passes and pipeline configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Failures raised by the analysis core.
///
/// Artifact I/O is not represented here; writers report their own errors so a
/// failed output never aborts the analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A configuration value is outside its legal range.
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidConfig { parameter: String, value: String },

    /// The configuration file could not be read.
    #[error("Failed to read configuration file {path:?}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for `PipelineConfig`.
    #[error("Failed to parse configuration file {path:?}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A flat buffer does not match the requested grid extents.
    #[error("Grid dimension mismatch: expected {expected} cells, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Two grids handed to the same pass have different extents.
    #[error("Grid extents differ: {left_width}x{left_height} vs {right_width}x{right_height}")]
    ExtentMismatch {
        left_width: usize,
        left_height: usize,
        right_width: usize,
        right_height: usize,
    },

    /// An internal consistency check failed, e.g. a label outside `1..=N`.
    #[error("Invariant violated: {message}")]
    InvariantViolation { message: String },
}

impl AnalysisError {
    pub fn invalid_config(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidConfig {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }
}
