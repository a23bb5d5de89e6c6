//! # Error Handling
//!
//! Crate-level error types using `thiserror`. Subsystem errors (secrets)
//! carry their own enum and convert into [`Error`] at the module boundary.

use crate::secrets::SecretsError;

/// Custom result type for keyplane operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for keyplane operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors (bad TTL, unresolvable region, missing env indirection)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Secret resolution errors
    #[error(transparent)]
    Secrets(#[from] SecretsError),

    /// Database connection and driver errors
    #[error("Database error: {context}")]
    Database {
        #[source]
        source: sqlx::Error,
        context: String,
    },

    /// Chat API failures, with the HTTP status when one was received
    #[error("Chat API error: {message}{}", .status.map(|s| format!(" (status: {s})")).unwrap_or_default())]
    Chat { message: String, status: Option<u16> },

    /// HTTP transport errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a database error with context
    pub fn database<S: Into<String>>(source: sqlx::Error, context: S) -> Self {
        Self::Database { source, context: context.into() }
    }

    /// Create a chat API error
    pub fn chat<S: Into<String>>(message: S, status: Option<u16>) -> Self {
        Self::Chat { message: message.into(), status }
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = Error::config("missing region");
        assert!(matches!(error, Error::Config(_)));
        assert_eq!(error.to_string(), "Configuration error: missing region");
    }

    #[test]
    fn test_database_error_context() {
        let error = Error::database(sqlx::Error::PoolClosed, "connection attempt failed");
        assert!(matches!(error, Error::Database { .. }));
        assert!(error.to_string().contains("connection attempt failed"));
    }

    #[test]
    fn test_secrets_error_converts() {
        let error: Error = SecretsError::not_found("db/creds").into();
        assert!(matches!(error, Error::Secrets(SecretsError::NotFound { .. })));
    }

    #[test]
    fn test_chat_error_display() {
        let error = Error::chat("model overloaded", Some(503));
        assert_eq!(error.to_string(), "Chat API error: model overloaded (status: 503)");

        let error = Error::chat("empty response", None);
        assert_eq!(error.to_string(), "Chat API error: empty response");
    }
}
