//! Client error type.
//!
//! Callers tell failures apart by message text: the `Display` of an [`ClientError::Api`]
//! is exactly the server's `error` string, or `HTTP {status}` when none could be read.

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response (connection refused, timeout, ...).
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// A success response whose body was not the expected JSON.
    #[error("Failed to parse response as JSON: {0}")]
    Decode(String),

    /// A media attachment could not be read or encoded.
    #[error("{0}")]
    Media(String),
}

impl ClientError {
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// HTTP status for [`ClientError::Api`], `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
