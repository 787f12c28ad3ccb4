//! Backend selection
//!
//! Storage, cache and notification backends are named by string tags in the
//! configuration. Tags are resolved into a closed set of variants before a run
//! starts; an unknown tag is rejected as client input.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::domain::repositories::{ChangeCache, SnapshotStore};
use crate::domain::services::Notifier;
use crate::infrastructure::change_cache::{InMemoryChangeCache, SqliteChangeCache};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::database_connection::DatabaseConnection;
use crate::infrastructure::json_snapshot_store::JsonSnapshotStore;
use crate::infrastructure::notification::{ConsoleNotifier, SmsNotifier};
use crate::infrastructure::sqlite_snapshot_store::SqliteSnapshotStore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Invalid storage type: '{0}' (expected 'json' or 'sql')")]
    UnknownStorage(String),

    #[error("Invalid cache type: '{0}' (expected 'memory', 'sqlite' or 'redis')")]
    UnknownCache(String),

    #[error("Invalid notification type: '{0}' (expected 'console' or 'sms')")]
    UnknownNotification(String),

    #[error("Backend '{backend}' requires the '{feature}' feature")]
    FeatureDisabled { backend: String, feature: String },

    #[error("Backend '{backend}' requires setting '{setting}'")]
    MissingSetting { backend: String, setting: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Json,
    Sql,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Memory,
    Sqlite,
    Redis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Console,
    Sms,
}

impl FromStr for StorageKind {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "sql" | "sqlite" => Ok(Self::Sql),
            _ => Err(SelectionError::UnknownStorage(s.to_string())),
        }
    }
}

impl FromStr for CacheKind {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            "redis" => Ok(Self::Redis),
            _ => Err(SelectionError::UnknownCache(s.to_string())),
        }
    }
}

impl FromStr for NotificationKind {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "console" => Ok(Self::Console),
            "sms" => Ok(Self::Sms),
            _ => Err(SelectionError::UnknownNotification(s.to_string())),
        }
    }
}

/// Collaborators for one run
pub struct RunBackends {
    pub store: Arc<dyn SnapshotStore>,
    pub cache: Arc<dyn ChangeCache>,
    pub notifier: Arc<dyn Notifier>,
}

/// Resolved backend choice for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendSelection {
    pub storage: StorageKind,
    pub cache: CacheKind,
    pub notification: NotificationKind,
}

impl BackendSelection {
    /// Resolve every tag and check required settings; no I/O
    pub fn resolve(config: &AppConfig) -> Result<Self, SelectionError> {
        let selection = Self {
            storage: config.storage.kind.parse()?,
            cache: config.cache.kind.parse()?,
            notification: config.notification.kind.parse()?,
        };

        if selection.cache == CacheKind::Redis {
            if !cfg!(feature = "redis-cache") {
                return Err(SelectionError::FeatureDisabled {
                    backend: "redis".into(),
                    feature: "redis-cache".into(),
                });
            }
            if config.cache.redis_url.as_deref().is_none_or(|url| url.trim().is_empty()) {
                return Err(SelectionError::MissingSetting {
                    backend: "redis".into(),
                    setting: "cache.redis_url".into(),
                });
            }
        }

        if selection.notification == NotificationKind::Sms {
            let sms = &config.notification.sms;
            for (setting, value) in [
                ("notification.sms.account_sid", &sms.account_sid),
                ("notification.sms.auth_token", &sms.auth_token),
                ("notification.sms.from", &sms.from),
                ("notification.sms.to", &sms.to),
            ] {
                if value.trim().is_empty() {
                    return Err(SelectionError::MissingSetting {
                        backend: "sms".into(),
                        setting: setting.into(),
                    });
                }
            }
        }

        Ok(selection)
    }

    /// Construct the selected backends. `memory_cache` is the process-wide
    /// in-memory cache shared by every run that selects it.
    pub async fn build(&self, config: &AppConfig, memory_cache: &Arc<InMemoryChangeCache>) -> Result<RunBackends> {
        let store: Arc<dyn SnapshotStore> = match self.storage {
            StorageKind::Json => Arc::new(JsonSnapshotStore::new(config.storage.json_path.clone())),
            StorageKind::Sql => {
                let db = Self::connect(&config.storage.database_url).await?;
                Arc::new(SqliteSnapshotStore::new(db.pool().clone()))
            }
        };

        let cache: Arc<dyn ChangeCache> = match self.cache {
            CacheKind::Memory => memory_cache.clone(),
            CacheKind::Sqlite => {
                let db = Self::connect(&config.cache.database_url).await?;
                Arc::new(SqliteChangeCache::new(db.pool().clone()))
            }
            CacheKind::Redis => Self::redis_cache(config).await?,
        };

        let notifier: Arc<dyn Notifier> = match self.notification {
            NotificationKind::Console => Arc::new(ConsoleNotifier),
            NotificationKind::Sms => Arc::new(
                SmsNotifier::new(config.notification.sms.clone()).context("Failed to build SMS client")?,
            ),
        };

        info!(
            "🔧 Backends: storage={}, cache={}, notification={}",
            store.backend_name(),
            cache.backend_name(),
            notifier.channel_name()
        );
        Ok(RunBackends { store, cache, notifier })
    }

    async fn connect(database_url: &str) -> Result<DatabaseConnection> {
        let db = DatabaseConnection::new(database_url)
            .await
            .with_context(|| format!("Failed to open database {}", database_url))?;
        db.migrate().await.context("Failed to prepare database schema")?;
        Ok(db)
    }

    #[cfg(feature = "redis-cache")]
    async fn redis_cache(config: &AppConfig) -> Result<Arc<dyn ChangeCache>> {
        use crate::infrastructure::change_cache::RedisChangeCache;

        let url = config.cache.redis_url.as_deref().unwrap_or_default();
        let cache = RedisChangeCache::connect(url, config.cache.key_prefix.clone()).await?;
        Ok(Arc::new(cache))
    }

    #[cfg(not(feature = "redis-cache"))]
    async fn redis_cache(_config: &AppConfig) -> Result<Arc<dyn ChangeCache>> {
        Err(SelectionError::FeatureDisabled {
            backend: "redis".into(),
            feature: "redis-cache".into(),
        }
        .into())
    }
}
