//! Error types for secret resolution.

use thiserror::Error;

/// Result type for secret operations.
pub type Result<T> = std::result::Result<T, SecretsError>;

/// Errors that can occur while resolving secrets.
#[derive(Error, Debug)]
pub enum SecretsError {
    /// The store returned no data for the requested secret.
    #[error("Secret not found: {id}")]
    NotFound { id: String },

    /// The secret store could not be reached or failed the request.
    #[error("Secret store unavailable: {message}")]
    Unavailable { message: String },

    /// The stored payload is not a JSON object.
    #[error("Secret payload malformed for '{id}': {reason}")]
    Malformed { id: String, reason: String },

    /// Configuration error (empty key/region, bad TTL, missing indirection).
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl SecretsError {
    /// Create a not found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into() }
    }

    /// Create a malformed payload error.
    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed { id: id.into(), reason: reason.into() }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }
}
