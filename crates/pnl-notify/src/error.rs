//! Dispatch error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Destination rejected message: {0}")]
    Rejected(String),

    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
