//! CRM API-specific error types.

/// Errors that can occur during CRM API operations.
#[derive(Debug, thiserror::Error)]
pub enum SalesforceError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Failed to deserialize API response
    #[error("Failed to deserialize API response: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// A pagination link pointed outside the instance
    #[error("Unexpected pagination link: {0}")]
    Pagination(String),
}
