//! Scheduler error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Invalid fire time: {0}")]
    InvalidTime(#[from] pnl_core::CoreError),

    #[error("Scheduling unavailable: {0}")]
    Unavailable(String),
}

impl SchedulerError {
    /// Whether the error stems from user input rather than the runtime.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::UnknownTimezone(_) | Self::InvalidTime(_))
    }
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
