//! Error types for the Apollo enrichment service.
//!
//! This module defines custom error types using `thiserror` for precise error handling.

use thiserror::Error;

/// Provider error code reported when the response body carries none.
pub const UNKNOWN_ERROR_CODE: &str = "UNKNOWN_ERROR";

/// Error code for requests that never received a response.
pub const NETWORK_ERROR_CODE: &str = "NETWORK_ERROR";

/// Error code for requests that could not be constructed or sent.
pub const REQUEST_SETUP_ERROR_CODE: &str = "REQUEST_SETUP_ERROR";

/// Errors that can occur when calling the Apollo API.
#[derive(Error, Debug)]
pub enum ApolloApiError {
    /// API returned a non-2xx status with a response body
    #[error("Apollo API error (status {status}, code {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Authentication failed (401/403); never retried
    #[error("Apollo authentication failed (status {status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// Rate limit exceeded (429) after exhausting the retry budget
    #[error("Apollo rate limit exceeded after {retries} retries")]
    RateLimited { retries: u32 },

    /// No response received (connection failure, timeout)
    #[error("No response from Apollo API: {0}")]
    Network(String),

    /// Request could not be constructed or sent
    #[error("Failed to send request to Apollo API: {0}")]
    RequestSetup(String),

    /// Failed to parse JSON response
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid request parameters detected before dispatch
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApolloApiError {
    /// HTTP status associated with this error, 0 when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            Self::Api { status, .. } => *status,
            Self::Unauthorized { status, .. } => *status,
            Self::RateLimited { .. } => 429,
            _ => 0,
        }
    }

    /// Stable error code for callers that need to branch on failure kind.
    pub fn code(&self) -> &str {
        match self {
            Self::Api { code, .. } => code,
            Self::Unauthorized { .. } => "AUTHENTICATION_ERROR",
            Self::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
            Self::Network(_) => NETWORK_ERROR_CODE,
            Self::RequestSetup(_) => REQUEST_SETUP_ERROR_CODE,
            Self::Json(_) => "INVALID_RESPONSE",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is missing
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    /// Environment variable has invalid value
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

/// Errors raised by the local persistence collaborators (contact store, search index).
#[derive(Error, Debug)]
pub enum StoreError {
    /// Contact does not exist
    #[error("Contact not found: {0}")]
    NotFound(String),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(String),

    /// Stored payload could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => {
                StoreError::NotFound("query returned no rows".to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Errors surfaced by the enrichment service (API call or local write failed).
#[derive(Error, Debug)]
pub enum EnrichmentError {
    /// Apollo API call failed
    #[error(transparent)]
    Api(#[from] ApolloApiError),

    /// Local contact store or search index failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience type alias for Results with ApolloApiError
pub type ApolloResult<T> = Result<T, ApolloApiError>;

/// Convenience type alias for Results with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Convenience type alias for Results with StoreError
pub type StoreResult<T> = Result<T, StoreError>;

/// Convenience type alias for Results with EnrichmentError
pub type EnrichmentResult<T> = Result<T, EnrichmentError>;
