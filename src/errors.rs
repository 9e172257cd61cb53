use thiserror::Error;

/// Failures of a single generation call. None of them outlive the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("API key not set")]
    MissingCredential,
    #[error("{message}")]
    QuotaExceeded { message: String },
    #[error("API error: {status}")]
    ApiError { status: u16, message: Option<String> },
    #[error("no response from API")]
    EmptyResponse,
    #[error("transport failure: {0}")]
    TransportFailure(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("response opened a code fence that was never closed")]
    UnterminatedFence,
}

impl GenerationError {
    pub fn is_quota(&self) -> bool {
        matches!(self, GenerationError::QuotaExceeded { .. })
    }
}
