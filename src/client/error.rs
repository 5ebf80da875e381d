//! Client error types.

use thiserror::Error;

/// Errors returned by Dependency-Track API calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport, timeout or body decoding failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status code.
    #[error("unexpected status {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    /// Server address could not be parsed.
    #[error("invalid server address: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Server address cannot carry a path (e.g. `mailto:`).
    #[error("server address cannot be used as a base url: {0}")]
    BaseUrl(String),

    /// API key contains bytes that are not allowed in a header value.
    #[error("api key is not a valid header value")]
    InvalidApiKey,

    /// Paginated response without a total count header.
    #[error("paginated response is missing the total count header")]
    MissingTotalCount,

    /// Total count header present but not a non-negative integer.
    #[error("invalid total count header: {0:?}")]
    InvalidTotalCount(String),

    /// Request aborted because shutdown was requested.
    #[error("request cancelled")]
    Cancelled,
}

impl ClientError {
    /// Whether this error stems from cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
