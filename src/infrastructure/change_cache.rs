//! Change-cache backends
//!
//! The cache is an optimization signal only. Every backend answers `get` with
//! `Ok(None)` for a title it has never seen.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::repositories::{CacheError, ChangeCache};

/// Process-local cache; lives as long as the value that owns it
#[derive(Debug, Clone, Default)]
pub struct InMemoryChangeCache {
    prices: Arc<RwLock<HashMap<String, f64>>>,
}

impl InMemoryChangeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.prices.read().await.len()
    }
}

#[async_trait]
impl ChangeCache for InMemoryChangeCache {
    async fn get(&self, title: &str) -> Result<Option<f64>, CacheError> {
        Ok(self.prices.read().await.get(title).copied())
    }

    async fn set(&self, title: &str, price: f64) -> Result<(), CacheError> {
        self.prices.write().await.insert(title.to_string(), price);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Cache persisted in the `price_cache` table
#[derive(Clone)]
pub struct SqliteChangeCache {
    pool: Arc<SqlitePool>,
}

impl SqliteChangeCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

#[async_trait]
impl ChangeCache for SqliteChangeCache {
    async fn get(&self, title: &str) -> Result<Option<f64>, CacheError> {
        let row = sqlx::query("SELECT price FROM price_cache WHERE title = ?")
            .bind(title)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(row.map(|r| r.try_get::<f64, _>("price")).transpose()?)
    }

    async fn set(&self, title: &str, price: f64) -> Result<(), CacheError> {
        sqlx::query("INSERT OR REPLACE INTO price_cache (title, price) VALUES (?, ?)")
            .bind(title)
            .bind(price)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

/// Prices stored as decimal strings in Redis, keyed `{prefix}{title}`
#[cfg(feature = "redis-cache")]
#[derive(Clone)]
pub struct RedisChangeCache {
    connection: redis::aio::MultiplexedConnection,
    key_prefix: String,
}

#[cfg(feature = "redis-cache")]
impl RedisChangeCache {
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(|e| CacheError::Unavailable(e.to_string()))?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        Ok(Self {
            connection,
            key_prefix: key_prefix.into(),
        })
    }

    fn key(&self, title: &str) -> String {
        format!("{}{}", self.key_prefix, title)
    }
}

#[cfg(feature = "redis-cache")]
#[async_trait]
impl ChangeCache for RedisChangeCache {
    async fn get(&self, title: &str) -> Result<Option<f64>, CacheError> {
        use redis::AsyncCommands;

        let key = self.key(title);
        let mut connection = self.connection.clone();
        let value: Option<String> = connection
            .get(&key)
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;

        value
            .map(|v| {
                v.trim()
                    .parse::<f64>()
                    .map_err(|_| CacheError::InvalidValue { key, value: v.clone() })
            })
            .transpose()
    }

    async fn set(&self, title: &str, price: f64) -> Result<(), CacheError> {
        use redis::AsyncCommands;

        let mut connection = self.connection.clone();
        connection
            .set::<_, _, ()>(self.key(title), price.to_string())
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database_connection::DatabaseConnection;
    use tempfile::tempdir;

    #[tokio::test]
    async fn memory_cache_get_set() {
        let cache = InMemoryChangeCache::new();
        assert_eq!(cache.get("Widget A").await.unwrap(), None);

        cache.set("Widget A", 10.0).await.unwrap();
        cache.set("Widget A", 12.0).await.unwrap();
        assert_eq!(cache.get("Widget A").await.unwrap(), Some(12.0));
        assert_eq!(cache.get("widget a").await.unwrap(), None);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn sqlite_cache_survives_reconnect() {
        let dir = tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("cache.db").display());

        {
            let db = DatabaseConnection::new(&url).await.unwrap();
            db.migrate().await.unwrap();
            let cache = SqliteChangeCache::new(db.pool().clone());
            assert_eq!(cache.get("Widget A").await.unwrap(), None);
            cache.set("Widget A", 99.5).await.unwrap();
            db.pool().close().await;
        }

        let db = DatabaseConnection::new(&url).await.unwrap();
        let cache = SqliteChangeCache::new(db.pool().clone());
        assert_eq!(cache.get("Widget A").await.unwrap(), Some(99.5));
    }
}
