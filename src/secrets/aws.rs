//! AWS Secrets Manager secret store implementation.
//!
//! Only compiled with the `aws` cargo feature. Authentication goes through
//! the SDK's default credential chain (environment keys, shared profile, or
//! IRSA on EKS), so no credentials are configured here.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_secretsmanager::Client as SecretsManagerClient;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::error::{Result, SecretsError};
use super::store::SecretStore;

/// AWS Secrets Manager store.
///
/// Clients are constructed lazily per region and reused; the store itself
/// is region-agnostic so one instance can serve secrets from several
/// regions.
pub struct AwsSecretStore {
    clients: RwLock<HashMap<String, SecretsManagerClient>>,
}

impl std::fmt::Debug for AwsSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSecretStore").finish_non_exhaustive()
    }
}

impl Default for AwsSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AwsSecretStore {
    /// Create a new AWS Secrets Manager store.
    pub fn new() -> Self {
        Self { clients: RwLock::new(HashMap::new()) }
    }

    async fn sdk_config(region: &str) -> SdkConfig {
        aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await
    }

    async fn client_for(&self, region: &str) -> SecretsManagerClient {
        {
            let clients = self.clients.read().await;
            if let Some(client) = clients.get(region) {
                return client.clone();
            }
        }

        let client = SecretsManagerClient::new(&Self::sdk_config(region).await);
        let mut clients = self.clients.write().await;
        clients.entry(region.to_string()).or_insert_with(|| client.clone());
        client
    }
}

#[async_trait]
impl SecretStore for AwsSecretStore {
    async fn fetch(&self, secret_id: &str, region: &str) -> Result<Option<String>> {
        let client = self.client_for(region).await;

        match client.get_secret_value().secret_id(secret_id).send().await {
            Ok(response) => {
                let value = response.secret_string().map(ToString::to_string).or_else(|| {
                    response
                        .secret_binary()
                        .map(|blob| String::from_utf8_lossy(blob.as_ref()).to_string())
                });
                debug!(secret_id, region, found = value.is_some(), "AWS Secrets Manager fetch");
                Ok(value)
            }
            Err(e) => {
                let message = e.to_string();
                if message.contains("ResourceNotFoundException") {
                    Ok(None)
                } else {
                    Err(SecretsError::unavailable(format!(
                        "AWS Secrets Manager request for '{secret_id}' failed: {message}"
                    )))
                }
            }
        }
    }
}
