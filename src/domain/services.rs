//! Network- and channel-side collaborator contracts used by a run.

use async_trait::async_trait;
use std::path::Path;

use crate::domain::outcomes::{FetchOutcome, ImageOutcome};

/// Retrieves one listing page with the fetcher's own retry policy
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str, proxy: Option<&str>) -> FetchOutcome;
}

/// Best-effort byte download into `folder`, named after the URL's last path segment
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_image(&self, url: &str, folder: &Path, proxy: Option<&str>) -> ImageOutcome;
}

/// Fire-and-forget delivery of a one-line message
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str);

    fn channel_name(&self) -> &'static str;
}
