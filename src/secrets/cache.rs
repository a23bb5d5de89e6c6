//! TTL-bound secret cache.
//!
//! Caches fetched secret payloads per `(secret id, region)` so that every
//! database connection or chat call does not hit the external store. The
//! cache is the only component that calls [`SecretStore::fetch`].
//!
//! # Concurrency
//!
//! One `RwLock` guards the whole map (coarse-grained; credential lookups are
//! not a hot path). The store fetch happens outside the lock, so two
//! concurrent misses for the same key may both fetch and both write - the
//! last writer wins. Callers must not rely on strict recency; the guarantee
//! is at-most-TTL staleness.
//!
//! # Example
//!
//! ```rust,ignore
//! use keyplane::secrets::{EnvSecretStore, SecretCache};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let cache = SecretCache::new(Arc::new(EnvSecretStore::new()), Duration::from_secs(300));
//!
//! // First call fetches from the store
//! let creds = cache.get("db/creds", "us-west-2", false).await?;
//!
//! // Within the TTL this is served from memory
//! let cached = cache.get("db/creds", "us-west-2", false).await?;
//!
//! // After a rotation, bypass the cache
//! let fresh = cache.get("db/creds", "us-west-2", true).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};

use super::error::{Result, SecretsError};
use super::store::SecretStore;

/// A decoded secret payload: a JSON object mapping field names to values.
pub type SecretPayload = serde_json::Map<String, serde_json::Value>;

/// Cache key combining secret identifier and region.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct CacheKey {
    secret_id: String,
    region: String,
}

impl CacheKey {
    fn new(secret_id: &str, region: &str) -> Self {
        Self { secret_id: secret_id.to_string(), region: region.to_string() }
    }
}

/// Cached payload with expiry on the monotonic clock.
#[derive(Debug, Clone)]
struct CacheEntry {
    payload: SecretPayload,
    expires_at: Instant,
}

/// Thread-safe TTL cache of secret payloads.
///
/// Constructed explicitly and passed to consumers (no process-global
/// singleton); the host application controls its lifecycle.
pub struct SecretCache {
    store: Arc<dyn SecretStore>,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl std::fmt::Debug for SecretCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCache").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl SecretCache {
    /// Create a new cache over the given store.
    ///
    /// A zero `ttl` disables caching: every `get` fetches from the store and
    /// nothing is retained between calls.
    pub fn new(store: Arc<dyn SecretStore>, ttl: Duration) -> Self {
        Self { store, entries: RwLock::new(HashMap::new()), ttl }
    }

    /// Get the TTL for this cache.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Resolve a secret payload.
    ///
    /// Returns an owned copy of the payload; mutating it never affects what
    /// later calls observe.
    ///
    /// # Arguments
    ///
    /// * `secret_id` - opaque identifier of the secret (non-empty)
    /// * `region` - resolved region (non-empty; resolving a default region
    ///   from the environment is the caller's job, see
    ///   [`crate::config::SecretsConfig::resolve_region`])
    /// * `force_refresh` - bypass the cache and overwrite the entry
    ///
    /// # Errors
    ///
    /// - [`SecretsError::Config`] for an empty id or region
    /// - [`SecretsError::NotFound`] when the store returns no data
    /// - [`SecretsError::Malformed`] when the payload is not a JSON object
    /// - [`SecretsError::Unavailable`] when the store cannot be reached
    pub async fn get(
        &self,
        secret_id: &str,
        region: &str,
        force_refresh: bool,
    ) -> Result<SecretPayload> {
        if secret_id.is_empty() {
            return Err(SecretsError::config("secret id must not be empty"));
        }
        if region.is_empty() {
            return Err(SecretsError::config("region must not be empty"));
        }

        let key = CacheKey::new(secret_id, region);
        let caching = !self.ttl.is_zero();

        if !force_refresh && caching {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&key) {
                if entry.expires_at > Instant::now() {
                    debug!(secret_id, region, "Cache hit for secret");
                    return Ok(entry.payload.clone());
                }
                debug!(secret_id, region, "Cached secret expired");
            }
        }

        // Fetch outside the lock so an in-flight fetch never blocks
        // concurrent cache reads. Replacement below is atomic under the
        // write lock; entries are never partially updated.
        let payload = self.fetch_payload(secret_id, region).await?;

        let mut entries = self.entries.write().await;
        if caching {
            entries.insert(
                key,
                CacheEntry { payload: payload.clone(), expires_at: Instant::now() + self.ttl },
            );
        } else {
            // A zero-TTL cache must never serve data stored under an
            // earlier non-zero TTL.
            entries.remove(&key);
        }

        Ok(payload)
    }

    /// Remove the entry for a key, if present.
    pub async fn invalidate(&self, secret_id: &str, region: &str) {
        let mut entries = self.entries.write().await;
        if entries.remove(&CacheKey::new(secret_id, region)).is_some() {
            debug!(secret_id, region, "Invalidated cached secret");
        }
    }

    /// Number of entries currently cached (expired entries included until
    /// they are overwritten).
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn fetch_payload(&self, secret_id: &str, region: &str) -> Result<SecretPayload> {
        info!(secret_id, region, "Fetching secret from store");

        let raw = self
            .store
            .fetch(secret_id, region)
            .await?
            .filter(|raw| !raw.trim().is_empty())
            .ok_or_else(|| SecretsError::not_found(secret_id))?;

        let value: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| SecretsError::malformed(secret_id, e.to_string()))?;

        match value {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(SecretsError::malformed(
                secret_id,
                format!("expected a JSON object, got {}", json_type_name(&other)),
            )),
        }
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
