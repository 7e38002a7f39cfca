use crate::processors::types::ProcessorName;
use thiserror::Error;

pub type ProcessorResult<T> = Result<T, ProcessorError>;

#[derive(Debug, Clone, Error)]
pub enum ProcessorError {
    #[error("Network error: processor={processor}, message={message}")]
    NetworkError {
        processor: ProcessorName,
        message: String,
    },

    #[error("Request timed out: processor={processor}")]
    Timeout { processor: ProcessorName },

    #[error("Unexpected status: processor={processor}, status={status}")]
    UnexpectedStatus { processor: ProcessorName, status: u16 },

    #[error("Invalid response: processor={processor}, message={message}")]
    InvalidResponse {
        processor: ProcessorName,
        message: String,
    },

    #[error("Failed to build request: {message}")]
    RequestBuildError { message: String },
}

impl ProcessorError {
    /// Whether another delivery attempt against the same processor may succeed.
    /// Every non-2xx status is retried, not only 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProcessorError::NetworkError { .. } => true,
            ProcessorError::Timeout { .. } => true,
            ProcessorError::UnexpectedStatus { .. } => true,
            ProcessorError::InvalidResponse { .. } => true,
            ProcessorError::RequestBuildError { .. } => false,
        }
    }

    pub(crate) fn from_reqwest(processor: ProcessorName, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProcessorError::Timeout { processor }
        } else if err.is_builder() {
            ProcessorError::RequestBuildError {
                message: err.to_string(),
            }
        } else {
            ProcessorError::NetworkError {
                processor,
                message: err.to_string(),
            }
        }
    }
}
