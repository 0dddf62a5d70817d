use thiserror::Error;

/// Failures talking to the backend.
///
/// `Request` and `Status` are network failures: pollers stop on them.
/// `Parse` means the server answered with something we could not decode,
/// which callers treat as "no data".
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl ApiError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
