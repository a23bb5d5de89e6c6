//! Connection provider with retry-once credential rotation.

use futures::future::BoxFuture;
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::{Error, Result};
use crate::secrets::{SecretCache, SecretPayload, SecretString};

/// A database to connect to, plus where its credentials live.
///
/// Host, port, and database name are fixed by deployment configuration and
/// are never taken from the secret; the secret contributes identity fields
/// only (username/password).
#[derive(Debug, Clone)]
pub struct DbTarget {
    pub host: String,
    pub port: u16,
    pub database: String,
    /// Secret holding the credentials for this database.
    pub secret_id: String,
    /// Resolved region of the secret.
    pub region: String,
}

/// Fully resolved connection parameters handed to the connector.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: SecretString,
}

impl ConnectParams {
    fn from_target(target: &DbTarget) -> Self {
        Self {
            host: target.host.clone(),
            port: target.port,
            database: target.database.clone(),
            user: String::new(),
            password: SecretString::default(),
        }
    }
}

/// Trait over the driver's connect call.
///
/// Implementations translate [`ConnectParams`] into a live connection and
/// close one on request. Errors stay as `sqlx::Error` so the provider can
/// classify them before wrapping.
#[async_trait::async_trait]
pub trait DatabaseConnector: Send + Sync {
    type Connection: Send;

    async fn connect(
        &self,
        params: &ConnectParams,
    ) -> std::result::Result<Self::Connection, sqlx::Error>;

    async fn close(&self, conn: Self::Connection) -> std::result::Result<(), sqlx::Error>;
}

/// PostgreSQL connector backed by sqlx.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgConnector;

#[async_trait::async_trait]
impl DatabaseConnector for PgConnector {
    type Connection = PgConnection;

    async fn connect(
        &self,
        params: &ConnectParams,
    ) -> std::result::Result<Self::Connection, sqlx::Error> {
        let options = PgConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .database(&params.database)
            .username(&params.user)
            .password(params.password.expose_secret());

        PgConnection::connect_with(&options).await
    }

    async fn close(&self, conn: Self::Connection) -> std::result::Result<(), sqlx::Error> {
        conn.close().await
    }
}

/// Builds database connections from cached credentials.
///
/// Holds no per-connection state; it is a pure function of (target, current
/// secret payload) → connection. The cache instance is injected so the host
/// application controls its lifecycle.
pub struct ConnectionProvider<C: DatabaseConnector> {
    cache: Arc<SecretCache>,
    connector: C,
}

impl<C: DatabaseConnector> ConnectionProvider<C> {
    /// Create a provider over the given cache and connector.
    pub fn new(cache: Arc<SecretCache>, connector: C) -> Self {
        Self { cache, connector }
    }

    /// The underlying connector.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Open a connection to the target.
    ///
    /// The normal path uses cached (possibly pre-rotation) credentials. If
    /// the attempt fails with an operational-class error, credentials are
    /// force-refreshed from the store and the connection is retried exactly
    /// once, with no backoff - the retry exists for credential rotation, not
    /// transient-fault tolerance. A second failure propagates to the caller.
    pub async fn connect(&self, target: &DbTarget) -> Result<C::Connection> {
        let params = self.params_for(target, false).await?;

        match self.connector.connect(&params).await {
            Ok(conn) => Ok(conn),
            Err(err) if is_operational(&err) => {
                warn!(
                    error = %err,
                    host = %target.host,
                    database = %target.database,
                    "Connection attempt failed; refreshing credentials and retrying"
                );
                let refreshed = self.params_for(target, true).await?;
                self.connector
                    .connect(&refreshed)
                    .await
                    .map_err(|e| Error::database(e, "connection retry with refreshed credentials failed"))
            }
            Err(err) => Err(Error::database(err, "connection attempt failed")),
        }
    }

    /// Run `f` against a scoped connection.
    ///
    /// The connection is closed on every exit path, including when `f`
    /// returns an error. A close failure is logged but does not mask the
    /// closure's result.
    pub async fn with_connection<T, F>(&self, target: &DbTarget, f: F) -> Result<T>
    where
        F: for<'c> FnOnce(&'c mut C::Connection) -> BoxFuture<'c, Result<T>> + Send,
        T: Send,
    {
        let mut conn = self.connect(target).await?;
        let result = f(&mut conn).await;

        if let Err(err) = self.connector.close(conn).await {
            warn!(error = %err, host = %target.host, "Failed to close database connection");
        }

        result
    }

    async fn params_for(&self, target: &DbTarget, force_refresh: bool) -> Result<ConnectParams> {
        let payload = self.cache.get(&target.secret_id, &target.region, force_refresh).await?;

        let mut params = ConnectParams::from_target(target);
        apply_credentials(&mut params, &payload);
        debug!(
            host = %params.host,
            database = %params.database,
            user = %params.user,
            force_refresh,
            "Resolved connection parameters"
        );
        Ok(params)
    }
}

/// Merge identity fields from a secret payload into connection parameters.
///
/// Only fields present and non-empty in the payload are overwritten;
/// host/port/database are never taken from the secret.
fn apply_credentials(params: &mut ConnectParams, payload: &SecretPayload) {
    if let Some(user) = payload.get("username").and_then(serde_json::Value::as_str) {
        if !user.is_empty() {
            params.user = user.to_string();
        }
    }
    if let Some(password) = payload.get("password").and_then(serde_json::Value::as_str) {
        if !password.is_empty() {
            params.password = SecretString::new(password);
        }
    }
}

/// Classify a driver error as operational (authentication/connectivity).
///
/// Only operational-class failures trigger a credential refresh; anything
/// else (bad query, protocol violation, row decoding) is terminal for the
/// attempt. SQLSTATE class 28 covers invalid authorization/password, class
/// 08 covers connection exceptions.
pub(crate) fn is_operational(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db
            .code()
            .map(|code| code.starts_with("28") || code.starts_with("08"))
            .unwrap_or(false),
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut => true,
        _ => false,
    }
}
