//! Error types for the terminology adapter

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Terminology adapter errors
#[derive(Error, Debug)]
pub enum Error {
    /// The remote server answered 404/410 for the operation or resource.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// The remote server rejected the request (400/422).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The remote call could not complete (connection refused, timeout, 5xx, ...).
    #[error("Remote terminology server failure: {0}")]
    Transport(String),

    /// The remote server violated the operation's response contract.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Whether this failure came from the remote call itself, as opposed to a
    /// contract violation or a local misconfiguration.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Error::ResourceNotFound(_)
                | Error::InvalidRequest(_)
                | Error::Transport(_)
                | Error::Authorization(_)
                | Error::Http(_)
        )
    }
}
