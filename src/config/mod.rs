//! Environment-driven configuration.
//!
//! All knobs come from `KEYPLANE_*` environment variables with sensible
//! defaults, so a bare process in a correctly provisioned environment needs
//! no configuration files. Secret identifiers are themselves resolved
//! through environment indirection: configuration names the variable, the
//! environment supplies the secret id.

pub mod settings;

pub use settings::{resolve_secret_id, DatabaseConfig, SecretsConfig};

/// Load a `.env` file into the process environment, if one exists.
///
/// Call once at startup, before any `from_env` constructor. Missing files
/// are not an error; development machines have one, deployments do not.
pub fn load_env_file() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded environment from .env file");
    }
}
