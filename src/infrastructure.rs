//! Infrastructure layer for HTTP access, parsing, storage, caching and notifications
//!
//! Concrete implementations of the collaborator traits declared in `domain`.

pub mod change_cache;
pub mod config;
pub mod database_connection;
pub mod json_snapshot_store;
pub mod logging;
pub mod notification;
pub mod parsing;
pub mod parsing_error;
pub mod simple_http_client;
pub mod sqlite_snapshot_store;

// Re-export commonly used items
#[cfg(feature = "redis-cache")]
pub use change_cache::RedisChangeCache;
pub use change_cache::{InMemoryChangeCache, SqliteChangeCache};
pub use config::{AppConfig, ConfigError, ConfigManager};
pub use database_connection::DatabaseConnection;
pub use json_snapshot_store::JsonSnapshotStore;
pub use logging::{get_log_directory, init_logging_with_config};
pub use notification::{ConsoleNotifier, SmsNotifier};
pub use parsing::{ParseContext, ParsingError, ProductListParser};
pub use simple_http_client::{FetchError, HttpClient, HttpClientConfig};
pub use sqlite_snapshot_store::SqliteSnapshotStore;
