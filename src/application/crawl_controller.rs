//! Crawl controller: page-by-page state machine for one run
//!
//! Pages are fetched strictly in order starting at 1. The loop ends on the
//! first of: page limit reached, fetch failure, page with no listing elements.
//! Listing elements that fail extraction are tallied and skipped.

#![allow(clippy::uninlined_format_args)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::domain::outcomes::{FetchOutcome, SkipReason};
use crate::domain::product::ProductRecord;
use crate::domain::services::{ImageFetcher, Notifier, PageFetcher};
use crate::domain::settings::CrawlSettings;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::parsing::{ListingFields, ParseContext, ProductListParser};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CrawlError {
    #[error("Source unavailable at page {page} ({url}) after {attempts} attempts: {last_error}")]
    SourceUnavailable {
        page: u32,
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Cannot build URL for page {page} from '{base_url}': {reason}")]
    InvalidPageUrl {
        page: u32,
        base_url: String,
        reason: String,
    },
}

/// Why pagination ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The configured page limit was reached
    PageLimit,
    /// The source answered "not found" for the next page
    CatalogEnd,
    /// A page came back with zero listing elements
    EmptyPage,
    /// The fetcher gave up after its retry budget
    FetchExhausted,
}

/// Per-page counts; `elements` includes listings that were skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSummary {
    pub page: u32,
    pub elements: usize,
    pub skipped: usize,
}

impl std::fmt::Display for PageSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Page {} summary: Total products: {}, Skipped: {}",
            self.page, self.elements, self.skipped
        )
    }
}

/// Everything one crawl produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub records: Vec<ProductRecord>,
    pub pages_fetched: u32,
    /// One entry per page that had listing elements
    pub pages: Vec<PageSummary>,
    pub total_skipped: usize,
    /// Skip counts keyed by `SkipReason::tag`
    pub skip_tally: BTreeMap<&'static str, usize>,
    pub images_failed: usize,
    pub stop_reason: StopReason,
}

impl CrawlReport {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            pages_fetched: 0,
            pages: Vec::new(),
            total_skipped: 0,
            skip_tally: BTreeMap::new(),
            images_failed: 0,
            stop_reason: StopReason::EmptyPage,
        }
    }

    fn record_skip(&mut self, reason: &SkipReason) {
        self.total_skipped += 1;
        *self.skip_tally.entry(reason.tag()).or_insert(0) += 1;
    }

    /// Completion message sent through the notification channel
    #[must_use]
    pub fn summary_message(&self) -> String {
        format!(
            "Scraping completed. Total products scraped: {}, Total skipped: {}",
            self.records.len(),
            self.total_skipped
        )
    }
}

/// Static inputs of the controller, derived from `AppConfig`
#[derive(Debug, Clone)]
pub struct CrawlControllerConfig {
    pub base_url: String,
    pub page_param: String,
    pub image_folder: PathBuf,
    /// Return `CrawlError::SourceUnavailable` instead of ending pagination
    pub abort_on_source_unavailable: bool,
}

impl CrawlControllerConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.source.base_url.clone(),
            page_param: config.source.page_param.clone(),
            image_folder: config.images.folder.clone(),
            abort_on_source_unavailable: config.fetch.abort_on_source_unavailable,
        }
    }
}

/// `{base_url}?{param}={page}`; other query pairs on the base URL are kept
pub fn page_url(base_url: &str, page_param: &str, page: u32) -> Result<String, CrawlError> {
    let mut url = Url::parse(base_url).map_err(|e| CrawlError::InvalidPageUrl {
        page,
        base_url: base_url.to_string(),
        reason: e.to_string(),
    })?;

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != page_param)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(page_param, &page.to_string());

    Ok(url.to_string())
}

pub struct CrawlController {
    page_fetcher: Arc<dyn PageFetcher>,
    image_fetcher: Arc<dyn ImageFetcher>,
    notifier: Arc<dyn Notifier>,
    parser: Arc<ProductListParser>,
    config: CrawlControllerConfig,
}

impl CrawlController {
    pub fn new(
        page_fetcher: Arc<dyn PageFetcher>,
        image_fetcher: Arc<dyn ImageFetcher>,
        notifier: Arc<dyn Notifier>,
        parser: Arc<ProductListParser>,
        config: CrawlControllerConfig,
    ) -> Self {
        Self {
            page_fetcher,
            image_fetcher,
            notifier,
            parser,
            config,
        }
    }

    /// Crawl pages until a stop condition, then send the summary notification
    pub async fn crawl(&self, settings: &CrawlSettings) -> Result<CrawlReport, CrawlError> {
        let mut report = CrawlReport::new();
        let result = self.crawl_pages(settings, &mut report).await;

        info!(
            "🏁 Crawl finished ({:?}): {} pages, {} products, {} skipped, {} image failures",
            report.stop_reason,
            report.pages_fetched,
            report.records.len(),
            report.total_skipped,
            report.images_failed
        );
        self.notifier.send(&report.summary_message()).await;

        result.map(|()| report)
    }

    async fn crawl_pages(&self, settings: &CrawlSettings, report: &mut CrawlReport) -> Result<(), CrawlError> {
        let mut page: u32 = 1;

        loop {
            if settings.exceeds_limit(page) {
                info!("Page limit reached ({} pages)", page - 1);
                report.stop_reason = StopReason::PageLimit;
                return Ok(());
            }

            let url = page_url(&self.config.base_url, &self.config.page_param, page)?;
            debug!("Fetching page {}: {}", page, url);

            let body = match self.page_fetcher.fetch_page(&url, settings.proxy()).await {
                FetchOutcome::Success(body) => body,
                FetchOutcome::NotFound => {
                    info!("📭 Page {} not found; catalog end", page);
                    report.stop_reason = StopReason::CatalogEnd;
                    return Ok(());
                }
                FetchOutcome::TransientFailure { attempts, last_error } => {
                    report.stop_reason = StopReason::FetchExhausted;
                    if self.config.abort_on_source_unavailable {
                        error!("❌ Aborting crawl: page {} unavailable", page);
                        return Err(CrawlError::SourceUnavailable {
                            page,
                            url,
                            attempts,
                            last_error,
                        });
                    }
                    warn!(
                        "Page {} unavailable after {} attempts ({}); ending pagination",
                        page, attempts, last_error
                    );
                    return Ok(());
                }
            };
            report.pages_fetched += 1;

            let listings = self.parser.extract_listings(&body, &ParseContext::new(page, url.as_str()));
            if listings.is_empty() {
                info!("No products found on page {}. Stopping.", page);
                report.stop_reason = StopReason::EmptyPage;
                return Ok(());
            }

            let mut summary = PageSummary {
                page,
                elements: listings.element_count,
                skipped: 0,
            };
            for candidate in listings.candidates {
                let outcome = match candidate {
                    Ok(fields) => self.build_record(fields, settings, report).await,
                    Err(reason) => Err(reason),
                };
                match outcome {
                    Ok(record) => report.records.push(record),
                    Err(reason) => {
                        warn!("Skipping product on page {} due to {}", page, reason);
                        summary.skipped += 1;
                        report.record_skip(&reason);
                    }
                }
            }

            info!("{}", summary);
            report.pages.push(summary);
            page += 1;
        }
    }

    /// Validate the fields, then download the image into the configured folder
    async fn build_record(
        &self,
        fields: ListingFields,
        settings: &CrawlSettings,
        report: &mut CrawlReport,
    ) -> Result<ProductRecord, SkipReason> {
        let record = ProductRecord::new(fields.title, fields.price, String::new())?;

        let image = self
            .image_fetcher
            .fetch_image(&fields.image_url, &self.config.image_folder, settings.proxy())
            .await;
        if !image.is_fetched() {
            report.images_failed += 1;
        }

        Ok(record.with_image_path(image.path().to_string_lossy()))
    }
}
