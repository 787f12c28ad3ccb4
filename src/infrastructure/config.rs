//! Configuration infrastructure
//!
//! Settings are layered with the `config` crate:
//! 1. Built-in defaults (`defaults` module)
//! 2. Optional config file (`config/scraper.toml` unless overridden)
//! 3. Environment variables, e.g. `SCRAPER_STORAGE__KIND=sql`
//!
//! Backend selection tags (`storage.kind`, `notification.kind`, `cache.kind`)
//! stay as strings here and are resolved per run, so an unknown tag surfaces
//! as a client-input error instead of a startup failure.

#![allow(clippy::derivable_impls)]

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub use crate::infrastructure::parsing::config::ListingSelectors;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    FileLoad {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub fetch: FetchConfig,
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub notification: NotificationConfig,
    pub images: ImageConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Catalog source and listing markup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Listing root; page N is `{base_url}?{page_param}=N`
    pub base_url: String,
    pub page_param: String,
    pub selectors: ListingSelectors,
    /// Symbols stripped from price text before parsing
    pub currency_symbols: Vec<String>,
}

/// Page fetch retry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Fail the run instead of ending pagination when a page cannot be fetched
    pub abort_on_source_unavailable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// "json" | "sql"
    pub kind: String,
    pub json_path: PathBuf,
    pub database_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// "memory" | "sqlite" | "redis"
    pub kind: String,
    pub database_url: String,
    pub redis_url: Option<String>,
    pub key_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// "console" | "sms"
    pub kind: String,
    pub sms: SmsConfig,
}

/// Twilio-style messaging endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsConfig {
    pub api_base: String,
    pub account_sid: String,
    pub auth_token: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub folder: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub static_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,
    pub json_format: bool,
    pub console_output: bool,
    pub file_output: bool,
    /// Defaults to `<data dir>/catalog-scraper/logs`
    pub log_dir: Option<PathBuf>,
    pub file_name: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            page_param: defaults::PAGE_PARAM.to_string(),
            selectors: ListingSelectors::default(),
            currency_symbols: defaults::CURRENCY_SYMBOLS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::FETCH_MAX_ATTEMPTS,
            retry_delay_secs: defaults::FETCH_RETRY_DELAY_SECS,
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECONDS,
            user_agent: defaults::USER_AGENT.to_string(),
            abort_on_source_unavailable: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: "json".to_string(),
            json_path: PathBuf::from("products.json"),
            database_url: "sqlite:products.db".to_string(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            kind: "memory".to_string(),
            database_url: "sqlite:products.db".to_string(),
            redis_url: None,
            key_prefix: String::new(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            kind: "console".to_string(),
            sms: SmsConfig::default(),
        }
    }
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.twilio.com".to_string(),
            account_sid: String::new(),
            auth_token: String::new(),
            from: String::new(),
            to: String::new(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("images"),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            static_token: String::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: defaults::SERVER_PORT,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_dir: None,
            file_name: "catalog-scraper.log".to_string(),
        }
    }
}

impl FetchConfig {
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl AppConfig {
    /// 설정값 유효성 검증
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.max_attempts == 0 {
            return Err(ConfigError::Validation {
                message: "fetch.max_attempts must be greater than 0".to_string(),
            });
        }
        if self.source.base_url.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "source.base_url must not be empty".to_string(),
            });
        }
        url::Url::parse(&self.source.base_url).map_err(|e| ConfigError::Validation {
            message: format!("source.base_url is not a valid URL: {e}"),
        })?;
        if self.source.page_param.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "source.page_param must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Loads `AppConfig` from file and environment
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    #[must_use]
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Application data directory (`~/.local/share/catalog-scraper` on Linux)
    #[must_use]
    pub fn get_app_data_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join(defaults::APP_DIR_NAME))
    }

    /// Load configuration; a missing file falls back to defaults plus environment
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(self.config_path.as_path()).required(false))
            .add_source(
                config::Environment::with_prefix(defaults::ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;

        info!(
            "Loaded configuration (file: {:?}, storage: {}, cache: {}, notification: {})",
            self.config_path, config.storage.kind, config.cache.kind, config.notification.kind
        );
        Ok(config)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new(defaults::CONFIG_PATH)
    }
}

/// Default values for every configuration section
pub mod defaults {
    pub const APP_DIR_NAME: &str = "catalog-scraper";

    /// Config file path without extension; the `config` crate probes known formats
    pub const CONFIG_PATH: &str = "config/scraper";

    pub const ENV_PREFIX: &str = "SCRAPER";

    pub const BASE_URL: &str = "https://dentalstall.com/shop/";

    pub const PAGE_PARAM: &str = "page";

    pub const CURRENCY_SYMBOLS: &[&str] = &["₹", "$", "€", "£", "¥"];

    /// Attempts per page before the fetch is reported as failed
    pub const FETCH_MAX_ATTEMPTS: u32 = 3;

    /// Fixed delay between attempts
    pub const FETCH_RETRY_DELAY_SECS: u64 = 5;

    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    pub const USER_AGENT: &str = "catalog-scraper/0.2 (+https://github.com/Chanseok)";

    pub const SERVER_PORT: u16 = 8000;

    pub const LOG_LEVEL: &str = "info";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fetch.max_attempts, 3);
        assert_eq!(config.fetch.retry_delay(), Duration::from_secs(5));
        assert_eq!(config.source.selectors.product_container, "li.product");
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let mut config = AppConfig::default();
        config.fetch.max_attempts = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let mut config = AppConfig::default();
        config.source.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::new(dir.path().join("absent.toml"));
        let config = manager.load_config().unwrap();
        assert_eq!(config.storage.kind, "json");
    }

    #[test]
    fn shipped_config_parses_without_a_usable_token() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/scraper.toml");
        let config = ConfigManager::new(path).load_config().unwrap();
        assert_eq!(config.source.selectors.product_container, "li.product");
        assert!(config.auth.static_token.is_empty());
        assert!(crate::commands::authorize(&config.auth.static_token, Some("Bearer change-me")).is_err());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scraper.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[storage]\nkind = \"sql\"\n\n[fetch]\nmax_attempts = 5\n\n[auth]\nstatic_token = \"secret\""
        )
        .unwrap();

        let config = ConfigManager::new(&path).load_config().unwrap();
        assert_eq!(config.storage.kind, "sql");
        assert_eq!(config.fetch.max_attempts, 5);
        assert_eq!(config.fetch.retry_delay_secs, 5);
        assert_eq!(config.auth.static_token, "secret");
    }
}
