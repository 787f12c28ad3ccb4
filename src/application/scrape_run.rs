//! Scrape run use case
//!
//! One run = resolve backends, crawl, merge, persist. The whole run executes
//! as a single sequential task inside a `scrape_run` span carrying its id.

#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use crate::application::backend_selection::{BackendSelection, SelectionError};
use crate::application::crawl_controller::{CrawlController, CrawlControllerConfig, CrawlError, CrawlReport, StopReason};
use crate::application::merge_engine::{MergeEngine, MergeReport};
use crate::domain::repositories::StoreError;
use crate::domain::services::{ImageFetcher, PageFetcher};
use crate::domain::settings::CrawlSettings;
use crate::infrastructure::change_cache::InMemoryChangeCache;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::parsing::{ParsingError, ProductListParser};
use crate::infrastructure::simple_http_client::HttpClient;

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("Failed to initialize backends: {0:#}")]
    BackendInit(anyhow::Error),

    #[error(transparent)]
    Crawl(#[from] CrawlError),

    #[error("Failed to persist snapshot: {0}")]
    Store(#[from] StoreError),
}

/// Outcome of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub pages_fetched: u32,
    pub scraped: usize,
    pub skipped: usize,
    pub skip_tally: BTreeMap<&'static str, usize>,
    pub images_failed: usize,
    pub stop_reason: StopReason,
    pub merge: MergeReport,
}

impl RunSummary {
    /// Count of new or re-priced products
    #[must_use]
    pub const fn changed(&self) -> usize {
        self.merge.changed
    }
}

pub struct ScrapeRunUseCase {
    config: Arc<AppConfig>,
    page_fetcher: Arc<dyn PageFetcher>,
    image_fetcher: Arc<dyn ImageFetcher>,
    parser: Arc<ProductListParser>,
    memory_cache: Arc<InMemoryChangeCache>,
}

impl ScrapeRunUseCase {
    pub fn new(
        config: Arc<AppConfig>,
        page_fetcher: Arc<dyn PageFetcher>,
        image_fetcher: Arc<dyn ImageFetcher>,
    ) -> Result<Self, ParsingError> {
        let parser = ProductListParser::with_config(&config.source.selectors, &config.source.currency_symbols)?;
        Ok(Self {
            config,
            page_fetcher,
            image_fetcher,
            parser: Arc::new(parser),
            memory_cache: Arc::new(InMemoryChangeCache::new()),
        })
    }

    /// Wire the real HTTP client for both page and image fetches
    pub fn from_config(config: Arc<AppConfig>) -> Result<Self> {
        let http_client = Arc::new(HttpClient::from_fetch_config(&config.fetch)?);
        Ok(Self::new(config, http_client.clone(), http_client)?)
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Execute one run. Backend tags are resolved before any page is fetched.
    pub async fn execute(&self, settings: CrawlSettings) -> Result<RunSummary, RunError> {
        let selection = BackendSelection::resolve(&self.config)?;
        let run_id = Uuid::new_v4();
        let span = info_span!("scrape_run", %run_id);

        async move {
            info!(
                "🚀 Starting scrape run (limit: {:?}, proxy: {})",
                settings.page_limit(),
                settings.proxy().unwrap_or("none")
            );

            let backends = selection
                .build(&self.config, &self.memory_cache)
                .await
                .map_err(RunError::BackendInit)?;

            let controller = CrawlController::new(
                self.page_fetcher.clone(),
                self.image_fetcher.clone(),
                backends.notifier,
                self.parser.clone(),
                CrawlControllerConfig::from_app_config(&self.config),
            );
            let CrawlReport {
                records,
                pages_fetched,
                pages: _,
                total_skipped,
                skip_tally,
                images_failed,
                stop_reason,
            } = controller.crawl(&settings).await?;
            let scraped = records.len();

            let engine = MergeEngine::new(backends.store, backends.cache);
            let merge = engine.merge_and_persist(records).await.map_err(|e| {
                error!("❌ Snapshot persistence failed: {}", e);
                e
            })?;

            info!("✅ Scraped and updated {} products", merge.changed);
            Ok::<_, RunError>(RunSummary {
                run_id,
                pages_fetched,
                scraped,
                skipped: total_skipped,
                skip_tally,
                images_failed,
                stop_reason,
                merge,
            })
        }
        .instrument(span)
        .await
    }
}
