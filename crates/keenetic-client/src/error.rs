//! Router error types.

use thiserror::Error;

/// Router error type.
#[derive(Error, Debug)]
pub enum RouterError {
    /// Router could not be reached (connect failure, timeout)
    #[error("Router unreachable: {0}")]
    Unreachable(String),

    /// Other HTTP transport error
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// Credentials rejected or session could not be established
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Unexpected HTTP status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// RCI command reported an error status
    #[error("Router command failed: {0}")]
    Command(String),

    /// Response did not have the expected shape
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid router URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for RouterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            RouterError::Unreachable(err.to_string())
        } else {
            RouterError::Http(err)
        }
    }
}

impl RouterError {
    /// The router session cannot be used anymore.
    pub fn is_auth(&self) -> bool {
        matches!(self, RouterError::Auth(_))
    }

    /// The router is down or not answering properly.
    pub fn is_connectivity(&self) -> bool {
        match self {
            RouterError::Unreachable(_) | RouterError::Http(_) => true,
            RouterError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result type alias using RouterError.
pub type RouterResult<T> = Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(RouterError::Auth("bad password".into()).is_auth());
        assert!(RouterError::Unreachable("refused".into()).is_connectivity());
        assert!(RouterError::Status {
            status: 502,
            body: String::new()
        }
        .is_connectivity());
        assert!(!RouterError::Status {
            status: 404,
            body: String::new()
        }
        .is_connectivity());
        assert!(!RouterError::Command("no such interface".into()).is_connectivity());
        assert!(!RouterError::Command("no such interface".into()).is_auth());
    }
}
