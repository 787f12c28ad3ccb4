//! Storage-side collaborator contracts: the persisted snapshot and the change cache.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::product::ProductRecord;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored row is invalid: {0}")]
    InvalidRow(String),
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("Cached value for '{key}' is not a price: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Durable system of record for product snapshots
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load every persisted record in stored order (empty when nothing was saved yet)
    async fn load(&self) -> Result<Vec<ProductRecord>, StoreError>;

    /// Overwrite the full persisted set
    async fn save(&self, records: &[ProductRecord]) -> Result<(), StoreError>;

    fn backend_name(&self) -> &'static str;
}

/// Non-authoritative last-seen price store keyed by product title
#[async_trait]
pub trait ChangeCache: Send + Sync {
    /// `Ok(None)` is the expected first-sighting state
    async fn get(&self, title: &str) -> Result<Option<f64>, CacheError>;

    async fn set(&self, title: &str, price: f64) -> Result<(), CacheError>;

    fn backend_name(&self) -> &'static str;
}
