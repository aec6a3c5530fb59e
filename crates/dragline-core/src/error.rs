//! Error types for dragline core systems.

use thiserror::Error;

/// The main error type for dragline core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Timer-related error.
    #[error("timer error: {0}")]
    Timer(#[from] TimerError),
}

/// Timer-specific errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// The timer ID is invalid or has already been removed.
    #[error("invalid or expired timer id")]
    InvalidTimerId,
}

/// A specialized Result type for dragline core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
