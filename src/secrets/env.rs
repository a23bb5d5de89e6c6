//! Environment variable secret store implementation.
//!
//! Reads secret payloads from environment variables. Intended for
//! **development and testing only** - NOT for production use.
//!
//! # Security Warning
//!
//! Environment variables are NOT secure for production secrets:
//! - Visible in process listings (`ps aux`)
//! - No encryption at rest
//! - No audit logging or rotation support
//!
//! Use AWS Secrets Manager (the `aws` feature) for production.
//!
//! # Usage
//!
//! Payloads are read from variables with the `KEYPLANE_SECRET_` prefix. The
//! secret id is uppercased and non-alphanumeric characters become `_`, so
//! the id `db/creds` maps to `KEYPLANE_SECRET_DB_CREDS`:
//!
//! ```bash
//! export KEYPLANE_SECRET_DB_CREDS='{"username":"app","password":"hunter2"}'
//! ```
//!
//! The region argument is accepted but ignored; the process environment has
//! no regions.

use async_trait::async_trait;
use std::env;

use super::error::Result;
use super::store::SecretStore;

/// Environment variable prefix for secret payloads.
const SECRET_PREFIX: &str = "KEYPLANE_SECRET_";

/// Environment variable secret store (development only).
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore {
    // No internal state needed - reads directly from env
}

impl EnvSecretStore {
    /// Creates a new environment variable secret store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts a secret id to the environment variable name.
    fn id_to_env_var(secret_id: &str) -> String {
        let suffix: String = secret_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("{}{}", SECRET_PREFIX, suffix)
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn fetch(&self, secret_id: &str, _region: &str) -> Result<Option<String>> {
        Ok(env::var(Self::id_to_env_var(secret_id)).ok())
    }
}
