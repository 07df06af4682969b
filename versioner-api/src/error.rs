//! Error types for versioner-api.

use thiserror::Error;

/// All errors that can arise from talking to the storage service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The base URL could not be used to build request URLs.
    #[error("invalid API base URL '{0}'")]
    InvalidBaseUrl(String),

    /// Connection, DNS, TLS or timeout failure before a response arrived.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The service answered with a non-success status.
    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The response body was not the JSON shape we expected.
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl ApiError {
    /// HTTP status for [`ApiError::Status`], `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
