//! Errors raised by calls to the detection service.

use thiserror::Error;

/// Failure of a single API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (refused, DNS, timeout).
    #[error("cannot reach bias API at {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("bias API returned {status}: {message}")]
    Backend { status: u16, message: String },

    /// The response body was not the JSON shape we consume.
    #[error("failed to parse response from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network { .. })
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
