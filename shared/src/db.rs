//! Database connection management.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::secrets::DatabaseCredentials;
use crate::store::PgStore;
use crate::{Config, Error, Result};

/// Create a database connection pool.
pub async fn create_pool(config: &Config, credentials: &DatabaseCredentials) -> Result<PgPool> {
    let host = credentials.host.as_deref().unwrap_or(&config.db_host);
    let database_url = format!(
        "postgres://{}:{}@{}:{}/{}",
        urlencoding::encode(&credentials.username),
        urlencoding::encode(&credentials.password),
        host,
        credentials.port.unwrap_or(5432),
        credentials.dbname.as_deref().unwrap_or(&config.db_name)
    );

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&database_url)
        .await
        .map_err(Error::StoreUnavailable)?;

    Ok(pool)
}

/// Connect and make sure the key-value table exists.
pub async fn connect_store(config: &Config, credentials: &DatabaseCredentials) -> Result<PgStore> {
    let store = PgStore::new(create_pool(config, credentials).await?);
    store.migrate().await?;
    Ok(store)
}
