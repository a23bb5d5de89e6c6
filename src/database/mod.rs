//! Database connections built from rotated secrets.
//!
//! This module turns a secret payload into PostgreSQL connection parameters
//! and recovers from credential rotation: a connection attempt that fails
//! with an operational-class error (authentication/connectivity) is retried
//! exactly once with freshly fetched credentials.
//!
//! The driver is wrapped by composition, not inheritance: the provider
//! accepts any [`DatabaseConnector`] implementation and supplies it with
//! credentials from a [`crate::secrets::SecretCache`]. Production code uses
//! [`PgConnector`] (sqlx); tests substitute a stub connector.
//!
//! Connection pooling is delegated to sqlx - see [`DatabaseSettings`] for
//! building pool options from a database secret.

pub mod provider;
pub mod settings;

pub use provider::{
    ConnectParams, ConnectionProvider, DatabaseConnector, DbTarget, PgConnector,
};
pub use settings::DatabaseSettings;
