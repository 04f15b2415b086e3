use radar_core::ValidationError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// Only partners in the current visible set can be selected.
    #[error("partner '{0}' is not in the visible set")]
    NotVisible(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdminError {
    #[error("admin surface is locked")]
    Locked,

    #[error("no partner form is open")]
    NoDraft,

    #[error("wait for uploads and location lookups to finish")]
    Busy,

    #[error("partner '{0}' not found")]
    NotFound(String),

    #[error("location input is empty")]
    EmptyLocation,

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache file I/O error at '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cache file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
