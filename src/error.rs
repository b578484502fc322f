// src/error.rs
// Error types for building a simulation and exporting its trajectory.
// Numerical blow-up during stepping is not an error here: it shows up as an invalid State.

use thiserror::Error;

/// Errors raised while constructing parameters or selecting a configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ParameterError {
    /// A quantity that must be strictly positive was zero or negative.
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    /// A quantity was NaN or infinite.
    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("friction coefficient must be non-negative, got {0}")]
    NegativeFriction(f64),

    /// Integration method name not recognised.
    #[error("unknown integration method '{0}' (expected 'euler' or 'rk4')")]
    UnknownMethod(String),

    #[error("requested {requested} steps, at most {max} allowed")]
    TooManySteps { requested: usize, max: usize },
}

/// Result type for parameter construction.
pub type ParameterResult<T> = std::result::Result<T, ParameterError>;

/// Errors raised while writing a trajectory log.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write trajectory log: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for trajectory export.
pub type ExportResult<T> = std::result::Result<T, ExportError>;
