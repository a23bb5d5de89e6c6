//! Configuration loading from environment variables.

use std::time::Duration;

use tracing::debug;

use crate::database::DbTarget;
use crate::errors::{Error, Result};

/// Cache TTL for secret payloads, in seconds. Zero disables caching.
const SECRET_TTL_VAR: &str = "KEYPLANE_SECRET_TTL_SECONDS";

/// Preferred region for secret lookups.
const DEFAULT_REGION_VAR: &str = "KEYPLANE_DEFAULT_REGION";

/// Environment variable naming the database credentials secret.
const DB_SECRET_ID_VAR: &str = "KEYPLANE_DB_SECRET_ID";

const DEFAULT_SECRET_TTL: Duration = Duration::from_secs(300);

/// Secret resolution configuration.
#[derive(Debug, Clone)]
pub struct SecretsConfig {
    /// How long a cached secret payload stays fresh. Zero disables caching.
    pub ttl: Duration,
    /// Region used when a lookup does not specify one.
    pub default_region: Option<String>,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self { ttl: DEFAULT_SECRET_TTL, default_region: None }
    }
}

impl SecretsConfig {
    /// Load from the environment.
    ///
    /// TTL comes from `KEYPLANE_SECRET_TTL_SECONDS` (default 300). The
    /// default region is the first non-empty of `KEYPLANE_DEFAULT_REGION`,
    /// `AWS_REGION`, `AWS_DEFAULT_REGION`, matching how the AWS SDK resolves
    /// its own region.
    pub fn from_env() -> Result<Self> {
        let ttl = parse_ttl(env_non_empty(SECRET_TTL_VAR).as_deref())?;
        let default_region = [DEFAULT_REGION_VAR, "AWS_REGION", "AWS_DEFAULT_REGION"]
            .iter()
            .find_map(|var| env_non_empty(var));

        debug!(ttl_seconds = ttl.as_secs(), region = ?default_region, "Loaded secrets configuration");
        Ok(Self { ttl, default_region })
    }

    /// Pick the region for a lookup: explicit argument, else the configured
    /// default, else an error.
    pub fn resolve_region(&self, explicit: Option<&str>) -> Result<String> {
        explicit
            .filter(|r| !r.is_empty())
            .map(ToString::to_string)
            .or_else(|| self.default_region.clone())
            .ok_or_else(|| {
                Error::config(format!(
                    "no region specified and none of {DEFAULT_REGION_VAR}, AWS_REGION, AWS_DEFAULT_REGION are set"
                ))
            })
    }
}

/// Read a secret id from the environment variable that names it.
///
/// Configuration carries the variable name, not the secret id itself, so
/// different environments can point the same code at different secrets.
pub fn resolve_secret_id(env_var: &str) -> Result<String> {
    env_non_empty(env_var)
        .ok_or_else(|| Error::config(format!("environment variable '{env_var}' is not set or empty")))
}

/// Database endpoint configuration.
///
/// Host, port, and database name are fixed deployment settings; only the
/// credentials come from the secret store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    /// Environment variable holding the credentials secret id.
    pub secret_id_env: String,
    /// Region override for the credentials secret.
    pub secret_region: Option<String>,
}

impl DatabaseConfig {
    /// Load from `KEYPLANE_DB_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let host = env_non_empty("KEYPLANE_DB_HOST")
            .ok_or_else(|| Error::config("KEYPLANE_DB_HOST is not set"))?;
        let port = match env_non_empty("KEYPLANE_DB_PORT") {
            None => 5432,
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::config(format!("KEYPLANE_DB_PORT is not a valid port: '{raw}'")))?,
        };
        let database = env_non_empty("KEYPLANE_DB_NAME")
            .ok_or_else(|| Error::config("KEYPLANE_DB_NAME is not set"))?;

        Ok(Self {
            host,
            port,
            database,
            secret_id_env: DB_SECRET_ID_VAR.to_string(),
            secret_region: env_non_empty("KEYPLANE_DB_SECRET_REGION"),
        })
    }

    /// Resolve into a connection target, pulling the secret id from the
    /// environment and the region from this config or the secrets defaults.
    pub fn target(&self, secrets: &SecretsConfig) -> Result<DbTarget> {
        Ok(DbTarget {
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
            secret_id: resolve_secret_id(&self.secret_id_env)?,
            region: secrets.resolve_region(self.secret_region.as_deref())?,
        })
    }
}

fn env_non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn parse_ttl(raw: Option<&str>) -> Result<Duration> {
    match raw {
        None => Ok(DEFAULT_SECRET_TTL),
        Some(raw) => {
            let secs: i64 = raw.trim().parse().map_err(|_| {
                Error::config(format!("{SECRET_TTL_VAR} must be an integer, got '{raw}'"))
            })?;
            if secs < 0 {
                return Err(Error::config(format!(
                    "{SECRET_TTL_VAR} must not be negative, got {secs}"
                )));
            }
            Ok(Duration::from_secs(secs as u64))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ttl_default_and_explicit() {
        assert_eq!(parse_ttl(None).unwrap(), Duration::from_secs(300));
        assert_eq!(parse_ttl(Some("60")).unwrap(), Duration::from_secs(60));
        assert_eq!(parse_ttl(Some("0")).unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_ttl_rejects_invalid() {
        assert!(parse_ttl(Some("-5")).is_err());
        assert!(parse_ttl(Some("soon")).is_err());
    }

    #[test]
    fn test_resolve_region_prefers_explicit() {
        let config = SecretsConfig {
            ttl: Duration::from_secs(300),
            default_region: Some("us-east-1".to_string()),
        };

        assert_eq!(config.resolve_region(Some("eu-west-1")).unwrap(), "eu-west-1");
        assert_eq!(config.resolve_region(Some("")).unwrap(), "us-east-1");
        assert_eq!(config.resolve_region(None).unwrap(), "us-east-1");
    }

    #[test]
    fn test_resolve_region_without_default_is_error() {
        let config = SecretsConfig { ttl: Duration::from_secs(300), default_region: None };
        assert!(config.resolve_region(None).is_err());
    }

    #[test]
    fn test_resolve_secret_id_from_env() {
        std::env::set_var("KEYPLANE_TEST_SECRET_ID_SET", "arn:aws:secretsmanager:abc");
        assert_eq!(
            resolve_secret_id("KEYPLANE_TEST_SECRET_ID_SET").unwrap(),
            "arn:aws:secretsmanager:abc"
        );
        std::env::remove_var("KEYPLANE_TEST_SECRET_ID_SET");
    }

    #[test]
    fn test_resolve_secret_id_missing_is_error() {
        assert!(resolve_secret_id("KEYPLANE_TEST_SECRET_ID_UNSET").is_err());
    }

    #[test]
    fn test_database_target_combines_config_and_env() {
        std::env::set_var("KEYPLANE_TEST_DB_SECRET", "prod/db-credentials");
        let db = DatabaseConfig {
            host: "db.internal".to_string(),
            port: 5432,
            database: "appdb".to_string(),
            secret_id_env: "KEYPLANE_TEST_DB_SECRET".to_string(),
            secret_region: Some("eu-central-1".to_string()),
        };
        let secrets = SecretsConfig {
            ttl: Duration::from_secs(300),
            default_region: Some("us-east-1".to_string()),
        };

        let target = db.target(&secrets).unwrap();
        assert_eq!(target.secret_id, "prod/db-credentials");
        assert_eq!(target.region, "eu-central-1");
        assert_eq!(target.host, "db.internal");
        std::env::remove_var("KEYPLANE_TEST_DB_SECRET");
    }
}
