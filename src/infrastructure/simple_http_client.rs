//! HTTP client for listing pages and product images
//!
//! Page fetches use a fixed attempt budget with a fixed delay between attempts.
//! Outcomes are tagged so the caller can tell "page does not exist" apart from
//! "source unreachable". Image downloads are single-attempt and best-effort.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, ClientBuilder, Proxy, StatusCode};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::domain::outcomes::{FetchOutcome, ImageOutcome};
use crate::domain::services::{ImageFetcher, PageFetcher};
use crate::infrastructure::config::FetchConfig;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error {status}: {url}")]
    Status { status: StatusCode, url: String },

    #[error("Invalid proxy '{proxy}': {reason}")]
    InvalidProxy { proxy: String, reason: String },

    #[error("I/O error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration for HTTP client behavior
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Attempts per page before reporting failure
    pub max_attempts: u32,
    /// Fixed wait between attempts
    pub retry_delay: Duration,
    pub timeout: Duration,
    pub user_agent: String,
    pub follow_redirects: bool,
}

impl HttpClientConfig {
    #[must_use]
    pub fn from_fetch_config(fetch: &FetchConfig) -> Self {
        Self {
            max_attempts: fetch.max_attempts.max(1),
            retry_delay: fetch.retry_delay(),
            timeout: fetch.request_timeout(),
            user_agent: fetch.user_agent.clone(),
            follow_redirects: true,
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from_fetch_config(&FetchConfig::default())
    }
}

/// reqwest-backed fetcher for pages and images
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    /// Last proxied client, reused while a run keeps the same proxy
    proxied: Mutex<Option<(String, Client)>>,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self, FetchError> {
        let client = Self::builder(&config).build()?;
        Ok(Self {
            client,
            config,
            proxied: Mutex::new(None),
        })
    }

    pub fn from_fetch_config(fetch: &FetchConfig) -> Result<Self, FetchError> {
        Self::with_config(HttpClientConfig::from_fetch_config(fetch))
    }

    fn builder(config: &HttpClientConfig) -> ClientBuilder {
        ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .gzip(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
    }

    #[must_use]
    pub const fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Client routed through `proxy` for both http and https, or the direct client
    async fn client_for(&self, proxy: Option<&str>) -> Result<Client, FetchError> {
        let Some(proxy) = proxy else {
            return Ok(self.client.clone());
        };

        let mut cached = self.proxied.lock().await;
        if let Some((current, client)) = cached.as_ref() {
            if current == proxy {
                return Ok(client.clone());
            }
        }

        let route = Proxy::all(proxy).map_err(|e| FetchError::InvalidProxy {
            proxy: proxy.to_string(),
            reason: e.to_string(),
        })?;
        let client = Self::builder(&self.config).proxy(route).build()?;
        debug!("Built proxied HTTP client for {}", proxy);
        *cached = Some((proxy.to_string(), client.clone()));
        Ok(client)
    }

    /// Single GET; non-2xx statuses are errors
    async fn fetch_once(client: &Client, url: &str) -> Result<String, FetchError> {
        let response = client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }

    /// Fetch a listing page with the fixed retry policy
    pub async fn fetch_html_string(&self, url: &str, proxy: Option<&str>) -> FetchOutcome {
        let max_attempts = self.config.max_attempts;
        let client = match self.client_for(proxy).await {
            Ok(client) => client,
            Err(e) => {
                error!("❌ Cannot build HTTP client for {}: {}", url, e);
                return FetchOutcome::TransientFailure {
                    attempts: 0,
                    last_error: e.to_string(),
                };
            }
        };

        let mut last_error = String::new();
        for attempt in 1..=max_attempts {
            info!("🌐 HTTP GET (attempt {}/{}): {}", attempt, max_attempts, url);
            match Self::fetch_once(&client, url).await {
                Ok(body) => {
                    debug!("Fetched {} on attempt {} ({} bytes)", url, attempt, body.len());
                    return FetchOutcome::Success(body);
                }
                Err(FetchError::Status { status, .. })
                    if matches!(status, StatusCode::NOT_FOUND | StatusCode::GONE) =>
                {
                    info!("Page not found ({}): {}", status, url);
                    return FetchOutcome::NotFound;
                }
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < max_attempts {
                        warn!(
                            "Request failed (attempt {}/{}): {}. Retrying in {:?}...",
                            attempt, max_attempts, e, self.config.retry_delay
                        );
                        sleep(self.config.retry_delay).await;
                    } else {
                        warn!("Request failed (attempt {}/{}): {}", attempt, max_attempts, e);
                    }
                }
            }
        }

        error!("Failed to retrieve URL after {} attempts: {}", max_attempts, url);
        FetchOutcome::TransientFailure {
            attempts: max_attempts,
            last_error,
        }
    }

    /// Stream an image body into `path`, creating parent directories
    async fn download_to(&self, url: &str, path: &Path, proxy: Option<&str>) -> Result<(), FetchError> {
        let io_err = |source| FetchError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let client = self.client_for(proxy).await?;
        let response = client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        let mut file = tokio::fs::File::create(path).await.map_err(io_err)?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await.map_err(io_err)?;
        }
        file.flush().await.map_err(io_err)?;
        Ok(())
    }

    /// Best-effort image download; the returned outcome always carries the target path
    pub async fn download_image(&self, url: &str, folder: &Path, proxy: Option<&str>) -> ImageOutcome {
        let path = image_target_path(url, folder);
        match self.download_to(url, &path, proxy).await {
            Ok(()) => {
                debug!("🖼️ Saved image {} -> {:?}", url, path);
                ImageOutcome::Fetched(path)
            }
            Err(e) => {
                warn!("Image download failed for {}: {}", url, e);
                ImageOutcome::Failed {
                    path,
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Deterministic local path for an image URL: `folder/<last path segment>`
#[must_use]
pub fn image_target_path(url: &str, folder: &Path) -> PathBuf {
    let from_parsed = url::Url::parse(url).ok().and_then(|parsed| {
        parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(ToString::to_string))
    });

    let name = from_parsed
        .unwrap_or_else(|| {
            let without_query = url.split(['?', '#']).next().unwrap_or_default();
            without_query.rsplit('/').next().unwrap_or_default().to_string()
        })
        .trim()
        .to_string();

    if name.is_empty() {
        folder.join("image")
    } else {
        folder.join(name)
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch_page(&self, url: &str, proxy: Option<&str>) -> FetchOutcome {
        self.fetch_html_string(url, proxy).await
    }
}

#[async_trait]
impl ImageFetcher for HttpClient {
    async fn fetch_image(&self, url: &str, folder: &Path, proxy: Option<&str>) -> ImageOutcome {
        self.download_image(url, folder, proxy).await
    }
}
