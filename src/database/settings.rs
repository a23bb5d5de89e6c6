//! Pool settings resolved from a full database secret.
//!
//! Some deployments store the entire connection identity - endpoint and
//! credentials - in one secret. [`DatabaseSettings`] maps such a payload
//! into sqlx connect/pool options, the surface an ORM-style persistence
//! layer configures itself from.

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::time::Duration;

use crate::errors::{Error, Result};
use crate::secrets::{SecretCache, SecretPayload, SecretString, SecretsError};

/// Environment variable controlling pooled connection max lifetime (seconds).
const CONN_MAX_LIFETIME_VAR: &str = "KEYPLANE_DB_CONN_MAX_LIFETIME";

const DEFAULT_CONN_MAX_LIFETIME: Duration = Duration::from_secs(60);

/// Connection and pool settings for a PostgreSQL database.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: SecretString,
    /// Maximum lifetime of a pooled connection before it is recycled.
    pub max_lifetime: Duration,
}

impl DatabaseSettings {
    /// Build settings from a database secret payload.
    ///
    /// The payload must carry `host`, `port`, `dbname`, `username`, and
    /// `password`. `port` may be a JSON number or a numeric string (secret
    /// stores frequently stringify it).
    pub fn from_secret(payload: &SecretPayload) -> Result<Self> {
        Ok(Self {
            host: required_str(payload, "host")?.to_string(),
            port: required_port(payload)?,
            database: required_str(payload, "dbname")?.to_string(),
            user: required_str(payload, "username")?.to_string(),
            password: SecretString::new(required_str(payload, "password")?),
            max_lifetime: DEFAULT_CONN_MAX_LIFETIME,
        })
    }

    /// Fetch the secret through the cache and build settings from it,
    /// applying the pool lifetime override from the environment.
    pub async fn resolve(
        cache: &SecretCache,
        secret_id: &str,
        region: &str,
    ) -> Result<Self> {
        let payload = cache.get(secret_id, region, false).await?;
        let mut settings = Self::from_secret(&payload)?;
        settings.max_lifetime = max_lifetime_from_env()?;
        Ok(settings)
    }

    /// Override the pooled connection max lifetime.
    pub fn with_max_lifetime(mut self, max_lifetime: Duration) -> Self {
        self.max_lifetime = max_lifetime;
        self
    }

    /// sqlx connect options for this database.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(self.password.expose_secret())
    }

    /// sqlx pool options honoring the configured connection lifetime.
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new().max_lifetime(self.max_lifetime)
    }
}

fn required_str<'a>(payload: &'a SecretPayload, key: &str) -> Result<&'a str> {
    payload
        .get(key)
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            Error::Secrets(SecretsError::malformed(
                "database secret",
                format!("missing or empty field '{key}'"),
            ))
        })
}

fn required_port(payload: &SecretPayload) -> Result<u16> {
    let value = payload.get("port").ok_or_else(|| {
        Error::Secrets(SecretsError::malformed("database secret", "missing field 'port'"))
    })?;

    let port = match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    port.and_then(|p| u16::try_from(p).ok()).ok_or_else(|| {
        Error::Secrets(SecretsError::malformed(
            "database secret",
            format!("field 'port' is not a valid port: {value}"),
        ))
    })
}

fn max_lifetime_from_env() -> Result<Duration> {
    match std::env::var(CONN_MAX_LIFETIME_VAR) {
        Err(_) => Ok(DEFAULT_CONN_MAX_LIFETIME),
        Ok(raw) => {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                Error::config(format!(
                    "{CONN_MAX_LIFETIME_VAR} must be a non-negative integer, got '{raw}'"
                ))
            })?;
            Ok(Duration::from_secs(secs))
        }
    }
}
