//! Secret resolution for backend services.
//!
//! This module fetches credential/config blobs from an external secret store
//! and caches them with a configurable TTL. It is built around two pieces:
//!
//! - [`SecretStore`]: the backend trait. One implementation ships by default
//!   ([`EnvSecretStore`], development only); the `aws` cargo feature adds
//!   [`AwsSecretStore`] backed by AWS Secrets Manager.
//! - [`SecretCache`]: a thread-safe TTL cache keyed by `(secret id, region)`.
//!   All reads and writes of the internal map happen under one lock; the
//!   network fetch itself runs outside the lock so an in-flight fetch never
//!   blocks concurrent cache reads.
//!
//! # Caching semantics
//!
//! - TTL > 0: a fetched payload is served from memory until its expiry,
//!   unless the caller passes `force_refresh` (used after credential
//!   rotation).
//! - TTL == 0: caching is disabled. Every `get` fetches, and any entry left
//!   over from an earlier non-zero TTL is removed so stale data is never
//!   served.
//! - Two concurrent misses for the same key may both fetch and both write;
//!   the last writer wins. The cache guarantees at-most-TTL staleness, not
//!   single-flight deduplication.
//!
//! # Security Considerations
//!
//! - Payload contents are never logged; fetches log only secret id and region
//! - Callers receive owned copies of payloads, never references into the cache
//! - Credential fields are carried in [`SecretString`], which redacts itself
//!   in Debug/Display output and zeroes its memory on drop

pub mod cache;
pub mod env;
pub mod error;
pub mod store;
pub mod types;

#[cfg(feature = "aws")]
pub mod aws;

// Re-export main types
pub use cache::{SecretCache, SecretPayload};
pub use env::EnvSecretStore;
pub use error::{Result, SecretsError};
pub use store::SecretStore;
pub use types::SecretString;

#[cfg(feature = "aws")]
pub use aws::AwsSecretStore;
