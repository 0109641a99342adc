/// Key-value storage seam with change notification
///
/// Every persisted marketplace collection goes through [`StorageAdapter`].
/// Two implementations are provided:
/// - [`MemoryStorage`]: lock-free snapshot map, swapped atomically on write
/// - [`SqliteStorage`]: SQLite persistence with sqlx, one row per key
///
/// Both broadcast a [`StorageEvent`] after every write so that other holders
/// of the same store (other tabs, other handles) can pick up the new value.

use anyhow::Result;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool},
    Row,
};
use std::{collections::HashMap, path::Path, sync::Arc};
use tokio::sync::broadcast;

/// Buffered change events per subscriber before lagging
const EVENT_CAPACITY: usize = 64;

/// Notification emitted after a key changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    /// New raw value, `None` after removal
    pub new_value: Option<String>,
}

/// Async key-value store with change notification
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;
    async fn remove_item(&self, key: &str) -> Result<()>;

    /// Subscribe to change events; dropping the receiver unsubscribes
    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}

/// Shared handle passed to fetchers; `None` where storage is unavailable
pub type SharedStorage = Arc<dyn StorageAdapter>;

/// In-memory store with lock-free reads
///
/// Uses ArcSwap for the whole map, the same way a hot-reload registry swaps
/// its pointer: readers never block, writers publish a fresh snapshot.
#[derive(Debug)]
pub struct MemoryStorage {
    entries: ArcSwap<HashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_entries(HashMap::new())
    }

    /// Start from pre-populated raw values
    pub fn with_entries(entries: HashMap<String, String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: ArcSwap::new(Arc::new(entries)),
            events,
        }
    }

    fn publish(&self, key: &str, new_value: Option<String>) {
        // No subscribers is not an error
        let _ = self.events.send(StorageEvent {
            key: key.to_string(),
            new_value,
        });
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.load().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.entries.rcu(|current| {
            let mut next = (**current).clone();
            next.insert(key.to_string(), value.to_string());
            next
        });
        self.publish(key, Some(value.to_string()));
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        let previous = self.entries.rcu(|current| {
            let mut next = (**current).clone();
            next.remove(key);
            next
        });
        if previous.contains_key(key) {
            self.publish(key, None);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}

/// SQLite-backed key-value store
///
/// Values are stored verbatim (already JSON-encoded by callers) in a single
/// `kv_store` table keyed by storage key.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    /// SQLite connection pool for the key-value database
    pool: SqlitePool,
    events: broadcast::Sender<StorageEvent>,
}

impl SqliteStorage {
    /// Create new storage instance with an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { pool, events }
    }

    /// Open (or create) the database file and initialize the schema
    pub async fn connect(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("Failed to create storage directory '{}': {}", parent.display(), e)
            })?;
        }

        tracing::info!("🗄️ Opening key-value store: {}", db_path.display());

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Initialize the key-value schema
    ///
    /// Safe to call multiple times (uses IF NOT EXISTS).
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get("value")))
    }

    /// Uses UPSERT so create and overwrite are a single statement
    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        let _ = self.events.send(StorageEvent {
            key: key.to_string(),
            new_value: Some(value.to_string()),
        });
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            let _ = self.events.send(StorageEvent {
                key: key.to_string(),
                new_value: None,
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}
