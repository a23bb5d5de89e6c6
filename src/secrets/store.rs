//! Secret store backend trait.

use async_trait::async_trait;

use super::error::Result;

/// Trait for secret store backends.
///
/// A store holds encrypted credential/config blobs addressed by an opaque
/// identifier and a region. Implementations return the raw payload as a JSON
/// string; parsing and caching are handled by [`super::SecretCache`].
///
/// # Security Considerations
///
/// - Implementations MUST NOT log payload contents
/// - Network communication MUST use TLS
///
/// # Contract
///
/// `fetch` returns `Ok(None)` when the store has no entry for the id. Any
/// transport or permission failure is surfaced as
/// [`super::SecretsError::Unavailable`].
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the raw JSON payload for a secret, or `None` if the store has
    /// no data for the id.
    async fn fetch(&self, secret_id: &str, region: &str) -> Result<Option<String>>;
}
