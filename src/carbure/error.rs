//! CarbuRe API-specific error types.

/// Errors that can occur during CarbuRe API operations.
#[derive(Debug, thiserror::Error)]
pub enum CarbureError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Failed to deserialize API response
    #[error("Failed to deserialize API response: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// Generic API error
    #[error("CarbuRe API error: {0}")]
    Other(String),
}

impl CarbureError {
    /// Status code of the failed response, if the server answered at all.
    ///
    pub fn status(&self) -> Option<u16> {
        match self {
            CarbureError::ApiError { status, .. } => Some(*status),
            CarbureError::HttpRequest(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
