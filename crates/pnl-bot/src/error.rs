//! Application error types.

use pnl_scheduler::SchedulerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Rejected user or file configuration. Nothing was changed.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Core error: {0}")]
    Core(#[from] pnl_core::CoreError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] pnl_persistence::PersistenceError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] pnl_notify::DispatchError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] pnl_telemetry::TelemetryError),

    #[error("Scheduling unavailable: {0}")]
    SchedulingUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<SchedulerError> for AppError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::Unavailable(reason) => Self::SchedulingUnavailable(reason),
            other => Self::Config(other.to_string()),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_errors_split_by_cause() {
        let config: AppError = SchedulerError::UnknownTimezone("Mars/Base".to_string()).into();
        assert!(config.is_config_error());
        assert!(config.to_string().contains("Mars/Base"));

        let fatal: AppError = SchedulerError::Unavailable("no runtime".to_string()).into();
        assert!(matches!(fatal, AppError::SchedulingUnavailable(_)));
        assert!(!fatal.is_config_error());
    }
}
