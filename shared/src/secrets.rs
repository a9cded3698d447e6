//! AWS Secrets Manager integration.

use aws_sdk_secretsmanager::Client as SecretsClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::RwLock;

use crate::{Error, Result};

/// Cached secrets with lazy initialization.
static SECRETS_CACHE: OnceLock<RwLock<HashMap<String, String>>> = OnceLock::new();

fn get_cache() -> &'static RwLock<HashMap<String, String>> {
    SECRETS_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Database credentials from Secrets Manager.
#[derive(Debug, Deserialize)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
}

/// LINE Messaging API channel credentials.
#[derive(Debug, Deserialize)]
pub struct LineCredentials {
    pub channel_secret: String,
    pub channel_access_token: String,
}

/// Get a secret value from Secrets Manager with caching.
pub async fn get_secret(client: &SecretsClient, secret_arn: &str) -> Result<String> {
    {
        let cache = get_cache().read().await;
        if let Some(value) = cache.get(secret_arn) {
            return Ok(value.clone());
        }
    }

    let response = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| Error::Aws(format!("Failed to get secret: {}", e)))?;

    let secret_string = response
        .secret_string()
        .ok_or_else(|| Error::Aws("Secret has no string value".to_string()))?
        .to_string();

    {
        let mut cache = get_cache().write().await;
        cache.insert(secret_arn.to_string(), secret_string.clone());
    }

    Ok(secret_string)
}

async fn get_json_secret<T: DeserializeOwned>(
    client: &SecretsClient,
    secret_arn: &str,
    what: &str,
) -> Result<T> {
    let secret_string = get_secret(client, secret_arn).await?;

    serde_json::from_str(&secret_string)
        .map_err(|e| Error::Aws(format!("Failed to parse {}: {}", what, e)))
}

/// Get database credentials from Secrets Manager.
pub async fn get_database_credentials(
    client: &SecretsClient,
    secret_arn: &str,
) -> Result<DatabaseCredentials> {
    get_json_secret(client, secret_arn, "database credentials").await
}

/// Get the LINE channel secret and access token from Secrets Manager.
pub async fn get_line_credentials(client: &SecretsClient, secret_arn: &str) -> Result<LineCredentials> {
    get_json_secret(client, secret_arn, "LINE credentials").await
}
