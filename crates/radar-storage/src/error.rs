use thiserror::Error;

/// Errors returned by the object-store client.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("upload rejected with HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid storage URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("file is empty: {0}")]
    EmptyFile(String),
}
