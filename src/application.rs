//! Application layer module
//!
//! Use cases that orchestrate one scrape run over the domain contracts.

pub mod backend_selection;
pub mod crawl_controller;
pub mod merge_engine;
pub mod scrape_run;

pub use backend_selection::{BackendSelection, RunBackends, SelectionError};
pub use crawl_controller::{CrawlController, CrawlControllerConfig, CrawlError, CrawlReport, PageSummary, StopReason};
pub use merge_engine::{MergeEngine, MergeReport};
pub use scrape_run::{RunError, RunSummary, ScrapeRunUseCase};
