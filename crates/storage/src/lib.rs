use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

mod memory;

pub use memory::MemoryStore;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub key: String,
    pub body: Value,
}

/// Keyed JSON documents grouped into collections.
///
/// `set` is an unconditional upsert: last write wins and there is no optimistic
/// concurrency check. `get_all` returns documents in the backend's own order.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn get_all(&self, collection: &str) -> Result<Vec<StoredDocument>>;
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>>;
    async fn set(&self, collection: &str, key: &str, document: &Value) -> Result<()>;
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool_options = if database_url.starts_with("sqlite::memory:") {
            // In-memory databases live and die with their connection.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(connect_options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
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
impl DirectoryStore for Storage {
    async fn get_all(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let rows = sqlx::query(
            "SELECT doc_key, body FROM documents WHERE collection = ? ORDER BY doc_key ASC",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to list collection '{collection}'"))?;

        rows.into_iter()
            .map(|row| {
                let key: String = row.get(0);
                let raw: String = row.get(1);
                let body = serde_json::from_str(&raw).with_context(|| {
                    format!("corrupt document body at '{collection}/{key}'")
                })?;
                Ok(StoredDocument { key, body })
            })
            .collect()
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = ? AND doc_key = ?")
            .bind(collection)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to read '{collection}/{key}'"))?;

        row.map(|r| {
            let raw: String = r.get(0);
            serde_json::from_str(&raw)
                .with_context(|| format!("corrupt document body at '{collection}/{key}'"))
        })
        .transpose()
    }

    async fn set(&self, collection: &str, key: &str, document: &Value) -> Result<()> {
        let body = serde_json::to_string(document)?;
        sqlx::query(
            "INSERT INTO documents (collection, doc_key, body) VALUES (?, ?, ?)
             ON CONFLICT(collection, doc_key) DO UPDATE SET body=excluded.body, updated_at=CURRENT_TIMESTAMP",
        )
        .bind(collection)
        .bind(key)
        .bind(body)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write '{collection}/{key}'"))?;
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

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
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
