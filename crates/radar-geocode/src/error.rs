use thiserror::Error;

/// Errors from a single geocoding stage. [`crate::Geocoder`] absorbs all of
/// them; they are only visible to callers using [`crate::GeminiClient`] directly.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The model API answered with a non-success status.
    #[error("model API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("model returned no text")]
    EmptyResponse,

    /// The model text did not contain a usable coordinate.
    #[error("no coordinate in model output: {0}")]
    Unparseable(String),

    #[error("invalid model API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to decode model response: {0}")]
    Deserialize(#[from] serde_json::Error),
}
