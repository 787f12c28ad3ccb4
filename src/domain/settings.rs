//! Crawl settings accepted by the inbound trigger.
//!
//! `ScrapeRequest` is the raw client payload; `CrawlSettings` is the validated,
//! immutable form handed to the pipeline.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("page limit must be a positive integer, got {0}")]
    InvalidPageLimit(i64),

    #[error("invalid proxy '{proxy}': {reason}")]
    InvalidProxy { proxy: String, reason: String },
}

/// Raw scrape request body (`{"limit": 5, "proxy": "http://..."}`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapeRequest {
    /// Limit the number of pages to scrape
    #[serde(default)]
    pub limit: Option<i64>,
    /// Proxy string to use for scraping
    #[serde(default)]
    pub proxy: Option<String>,
}

/// Validated crawl configuration for a single run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSettings {
    page_limit: Option<NonZeroU32>,
    proxy: Option<String>,
}

impl CrawlSettings {
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            page_limit: None,
            proxy: None,
        }
    }

    #[must_use]
    pub fn with_page_limit(mut self, limit: NonZeroU32) -> Self {
        self.page_limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn page_limit(&self) -> Option<NonZeroU32> {
        self.page_limit
    }

    #[must_use]
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    /// True once `page` is past the configured limit
    #[must_use]
    pub fn exceeds_limit(&self, page: u32) -> bool {
        self.page_limit.is_some_and(|limit| page > limit.get())
    }
}

impl TryFrom<ScrapeRequest> for CrawlSettings {
    type Error = SettingsError;

    fn try_from(request: ScrapeRequest) -> Result<Self, Self::Error> {
        let page_limit = match request.limit {
            None => None,
            Some(raw) => {
                let limit = u32::try_from(raw)
                    .ok()
                    .and_then(NonZeroU32::new)
                    .ok_or(SettingsError::InvalidPageLimit(raw))?;
                Some(limit)
            }
        };

        // 빈 문자열 프록시는 "프록시 없음"으로 취급
        let proxy = match request.proxy.map(|p| p.trim().to_string()) {
            Some(p) if !p.is_empty() => {
                url::Url::parse(&p).map_err(|e| SettingsError::InvalidProxy {
                    proxy: p.clone(),
                    reason: e.to_string(),
                })?;
                Some(p)
            }
            _ => None,
        };

        Ok(Self { page_limit, proxy })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_request_is_unlimited() {
        let settings = CrawlSettings::try_from(ScrapeRequest::default()).unwrap();
        assert_eq!(settings, CrawlSettings::unlimited());
        assert!(!settings.exceeds_limit(10_000));
    }

    #[test]
    fn positive_limit_is_enforced() {
        let settings = CrawlSettings::try_from(ScrapeRequest {
            limit: Some(2),
            proxy: None,
        })
        .unwrap();
        assert!(!settings.exceeds_limit(1));
        assert!(!settings.exceeds_limit(2));
        assert!(settings.exceeds_limit(3));
    }

    #[test]
    fn zero_and_negative_limits_are_rejected() {
        for raw in [0, -1, i64::from(u32::MAX) + 1] {
            let err = CrawlSettings::try_from(ScrapeRequest {
                limit: Some(raw),
                proxy: None,
            })
            .unwrap_err();
            assert_eq!(err, SettingsError::InvalidPageLimit(raw));
        }
    }

    #[test]
    fn proxy_is_trimmed_and_validated() {
        let settings = CrawlSettings::try_from(ScrapeRequest {
            limit: None,
            proxy: Some(" http://10.0.0.1:3128 ".into()),
        })
        .unwrap();
        assert_eq!(settings.proxy(), Some("http://10.0.0.1:3128"));

        let blank = CrawlSettings::try_from(ScrapeRequest {
            limit: None,
            proxy: Some("  ".into()),
        })
        .unwrap();
        assert_eq!(blank.proxy(), None);

        assert!(matches!(
            CrawlSettings::try_from(ScrapeRequest {
                limit: None,
                proxy: Some("not a proxy".into()),
            }),
            Err(SettingsError::InvalidProxy { .. })
        ));
    }
}
