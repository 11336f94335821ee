use reqwest::header::InvalidHeaderValue;
use thiserror::Error;

/// Error type for Zegami operations.
///
/// Nothing is caught or retried internally; every failure reaches the
/// caller as one of these.
#[derive(Debug, Error)]
pub enum ZegamiError {
    /// Connection, DNS or transport-level failure
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response, with the raw body for diagnostics
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Response body was not valid JSON
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Local file could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Expected envelope key absent from the response
    #[error("Missing `{0}` in response")]
    MissingKey(String),

    /// Token cannot be sent as a header value
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(String),
}

impl ZegamiError {
    /// HTTP status code, if this is a status error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ZegamiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ZegamiError>;
