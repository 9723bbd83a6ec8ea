//! Error types for pnl-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid settings document: {0}")]
    InvalidSettings(String),

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
