//! Domain module - core value types and collaborator contracts
//!
//! Everything here is free of transport and storage details; concrete
//! backends live in `infrastructure`.

pub mod outcomes;
pub mod product;
pub mod repositories;
pub mod services;
pub mod settings;
pub mod snapshot;

// Re-export commonly used items for convenience
pub use outcomes::{FetchOutcome, ImageOutcome, SkipReason};
pub use product::{ProductRecord, RecordError};
pub use repositories::{CacheError, ChangeCache, SnapshotStore, StoreError};
pub use services::{ImageFetcher, Notifier, PageFetcher};
pub use settings::{CrawlSettings, ScrapeRequest, SettingsError};
pub use snapshot::{PersistedSnapshot, Upsert};
