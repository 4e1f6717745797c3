//! Error types for the floorplanning engine.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading input or configuring a solve.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed block file at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("invalid hyperparameters: {0}")]
    InvalidParams(String),
}
