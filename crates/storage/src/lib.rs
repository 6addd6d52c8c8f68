use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tokio::sync::Mutex;
use tracing::debug;

/// Durable string key/value storage for client-local state.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_value(&self, key: &str) -> Result<Option<String>>;
    async fn set_value(&self, key: &str, value: &str) -> Result<()>;
    async fn remove_value(&self, key: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);
        // Every connection to `sqlite::memory:` opens its own empty database.
        let max_connections = if is_memory_url(database_url) { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open client state at '{database_url}'"))?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for Storage {
    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM client_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to read client state key '{key}'"))?;
        Ok(value)
    }

    async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO client_state (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write client state key '{key}'"))?;
        debug!(key, "storage: value written");
        Ok(())
    }

    async fn remove_value(&self, key: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM client_state WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete client state key '{key}'"))?;
        debug!(key, removed = result.rows_affected(), "storage: value removed");
        Ok(())
    }
}

/// Process-local store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_value(&self, key: &str) -> Result<()> {
        self.values.lock().await.remove(key);
        Ok(())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:")
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_memory_url(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
