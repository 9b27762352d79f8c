use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info};

/// String-keyed blob store holding the persisted slice of the view state.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn load(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn save(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct SqliteStorage {
    db: Pool<Sqlite>,
}

impl SqliteStorage {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        Ok(Self::new(init_db(database_url).await?))
    }
}

pub async fn init_db(database_url: &str) -> anyhow::Result<Pool<Sqlite>> {
    // every connection to an in-memory database sees its own empty database
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&pool)
    .await?;

    info!("Database migrations completed");

    Ok(pool)
}

#[async_trait]
impl BlobStorage for SqliteStorage {
    async fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    async fn save(&self, key: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.db)
        .await?;

        debug!("Saved {} bytes under {}", value.len(), key);
        Ok(())
    }
}

/// Process-local storage, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(key: &str, value: &str) -> Self {
        let storage = Self::default();
        storage
            .blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value.to_string());
        storage
    }
}

#[async_trait]
impl BlobStorage for MemoryStorage {
    async fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        let blobs = self
            .blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(blobs.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
