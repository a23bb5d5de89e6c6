//! # Keyplane
//!
//! Keyplane is a helper library for backend services that need two things:
//! database credentials resolved from a cloud secret store (with automatic
//! rotation handling), and tagged calls to a hosted LLM API for billing and
//! analytics attribution.
//!
//! ## Architecture
//!
//! ```text
//! Service code → ConnectionProvider → SecretCache → SecretStore backend
//!                      ↓                   ↓
//!                 sqlx driver       TTL-bound payload cache
//! ```
//!
//! ## Core Components
//!
//! - **SecretCache**: Thread-safe TTL cache over a [`secrets::SecretStore`]
//!   backend. Owns the single external call to the secret store.
//! - **ConnectionProvider**: Builds PostgreSQL connection parameters from
//!   cached credentials and retries a failed connection exactly once with
//!   freshly fetched credentials (credential rotation recovery).
//! - **ChatClient**: Thin wrapper over an OpenAI-style Responses API that
//!   applies a normalized billing tag to every request.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use keyplane::config::{DatabaseConfig, SecretsConfig};
//! use keyplane::database::{ConnectionProvider, PgConnector};
//! use keyplane::secrets::{EnvSecretStore, SecretCache};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> keyplane::Result<()> {
//!     let secrets = SecretsConfig::from_env()?;
//!     let cache = Arc::new(SecretCache::new(Arc::new(EnvSecretStore::new()), secrets.ttl));
//!
//!     let db = DatabaseConfig::from_env()?;
//!     let provider = ConnectionProvider::new(cache, PgConnector);
//!     let _conn = provider.connect(&db.target(&secrets)?).await?;
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod config;
pub mod database;
pub mod errors;
pub mod observability;
pub mod secrets;

// Re-export commonly used types and traits
pub use chat::{ChatClient, Intelligence};
pub use config::{DatabaseConfig, SecretsConfig};
pub use database::{ConnectionProvider, DbTarget, PgConnector};
pub use errors::{Error, Result};
pub use secrets::{SecretCache, SecretStore};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_available() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "keyplane");
    }
}
