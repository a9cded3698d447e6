//! Key-value storage used by the ledger.
//!
//! The ledger only needs string get/set, a multi-key set and a prefix scan.
//! Production uses a single Postgres table; tests and local runs use the
//! in-memory map.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::debug;

use crate::Result;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Write several keys. Implementations should apply them together where
    /// the backend allows it.
    async fn mset(&self, entries: &[(String, String)]) -> Result<()>;

    /// All keys starting with `prefix`, in ascending order.
    async fn scan(&self, prefix: &str) -> Result<Vec<String>>;
}

/// In-process store backed by an ordered map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn mset(&self, entries: &[(String, String)]) -> Result<()> {
        let mut map = self.entries.write().await;
        for (key, value) in entries {
            map.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .entries
            .read()
            .await
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

/// Postgres-backed store over a single `kv_store` table.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the backing table if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

const UPSERT: &str = r#"
    INSERT INTO kv_store (key, value)
    VALUES ($1, $2)
    ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
"#;

#[async_trait]
impl KeyValueStore for PgStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(UPSERT)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mset(&self, entries: &[(String, String)]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (key, value) in entries {
            sqlx::query(UPSERT)
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        debug!("Wrote {} keys", entries.len());
        Ok(())
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<String>> {
        let keys = sqlx::query_scalar::<_, String>(
            "SELECT key FROM kv_store WHERE starts_with(key, $1) ORDER BY key",
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_get_set() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").await.unwrap(), None);
        store.set("a", "1").await.unwrap();
        store.set("a", "2").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_memory_scan_prefix() {
        let store = MemoryStore::new();
        store
            .mset(&[
                ("C1:U2:2024-03".to_string(), "X".to_string()),
                ("C1:U1:2024-03".to_string(), "X".to_string()),
                ("C10:U1:2024-03".to_string(), "X".to_string()),
                ("display_name:U1".to_string(), "Kim".to_string()),
            ])
            .await
            .unwrap();

        let keys = store.scan("C1:").await.unwrap();
        assert_eq!(keys, vec!["C1:U1:2024-03", "C1:U2:2024-03"]);
        assert_eq!(store.scan("").await.unwrap().len(), 4);
        assert!(store.scan("Z").await.unwrap().is_empty());
    }
}
