//! Tagged outcomes for the two blocking I/O points of a run, plus the
//! per-listing skip signal.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::product::RecordError;

/// Result of one page retrieval after the fetcher's own retries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Page body retrieved
    Success(String),
    /// The source answered that the page does not exist (catalog end)
    NotFound,
    /// Every attempt failed with a transport-level error or non-success status
    TransientFailure { attempts: u32, last_error: String },
}

/// Result of a best-effort image download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    Fetched(PathBuf),
    /// `path` is where the bytes would have been written
    Failed { path: PathBuf, reason: String },
}

impl ImageOutcome {
    /// The deterministic target path, whether or not the download succeeded
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Fetched(path) | Self::Failed { path, .. } => path,
        }
    }

    #[must_use]
    pub const fn is_fetched(&self) -> bool {
        matches!(self, Self::Fetched(_))
    }
}

/// Why a listing element did not produce a record. Counted and logged, never fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    #[error("missing title element")]
    MissingTitle,

    #[error("missing price element")]
    MissingPrice,

    #[error("missing image element")]
    MissingImage,

    #[error("invalid price format '{raw}'")]
    InvalidPrice { raw: String },

    #[error("missing image URL")]
    MissingImageUrl,

    #[error("validation error: {0}")]
    InvalidRecord(#[from] RecordError),
}

impl SkipReason {
    /// Stable tag used as the skip tally key
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::MissingTitle => "missing_title",
            Self::MissingPrice => "missing_price",
            Self::MissingImage => "missing_image",
            Self::InvalidPrice { .. } => "invalid_price",
            Self::MissingImageUrl => "missing_image_url",
            Self::InvalidRecord(_) => "invalid_record",
        }
    }
}
