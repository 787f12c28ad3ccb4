//! Scrape trigger command
//!
//! Bearer-token gate, request validation, and mapping of run failures onto
//! client-input vs internal errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::application::scrape_run::{RunError, RunSummary, ScrapeRunUseCase};
use crate::domain::settings::{CrawlSettings, ScrapeRequest};

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid or missing authentication token")]
    Unauthorized,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Scrape run failed: {0}")]
    Internal(String),
}

impl From<RunError> for CommandError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::Selection(e) => Self::InvalidInput(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Response body of a completed run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrapeResponse {
    pub message: String,
    pub count: usize,
}

impl ScrapeResponse {
    #[must_use]
    pub fn from_summary(summary: &RunSummary) -> Self {
        Self {
            message: format!("Scraped and updated {} products.", summary.changed()),
            count: summary.changed(),
        }
    }
}

/// Check an `Authorization` header value against the configured static token.
/// An empty configured token rejects every request.
pub fn authorize(expected_token: &str, authorization: Option<&str>) -> Result<(), CommandError> {
    let presented = authorization
        .and_then(|value| value.trim().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim());

    match presented {
        Some(token) if !expected_token.is_empty() && token == expected_token => Ok(()),
        _ => {
            if expected_token.is_empty() {
                warn!("auth.static_token is not configured; rejecting request");
            }
            Err(CommandError::Unauthorized)
        }
    }
}

/// Start a scrape run on behalf of an authenticated caller
pub async fn start_scrape_run(
    use_case: &ScrapeRunUseCase,
    authorization: Option<&str>,
    request: ScrapeRequest,
) -> Result<ScrapeResponse, CommandError> {
    authorize(&use_case.config().auth.static_token, authorization)?;
    run_validated(use_case, request).await
}

/// Validate the request and run it; used directly by the local CLI
pub async fn run_validated(use_case: &ScrapeRunUseCase, request: ScrapeRequest) -> Result<ScrapeResponse, CommandError> {
    let settings = CrawlSettings::try_from(request).map_err(|e| CommandError::InvalidInput(e.to_string()))?;

    match use_case.execute(settings).await {
        Ok(summary) => {
            info!(
                "Run {} finished: {} changed, {} scraped, {} skipped",
                summary.run_id,
                summary.changed(),
                summary.scraped,
                summary.skipped
            );
            Ok(ScrapeResponse::from_summary(&summary))
        }
        Err(e) => {
            error!("❌ Scrape run rejected or failed: {}", e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("Bearer secret"), true)]
    #[case(Some("bearer secret"), true)]
    #[case(Some("Bearer  secret "), true)]
    #[case(Some("Bearer wrong"), false)]
    #[case(Some("Basic secret"), false)]
    #[case(Some("secret"), false)]
    #[case(None, false)]
    fn bearer_gate(#[case] header: Option<&str>, #[case] allowed: bool) {
        assert_eq!(authorize("secret", header).is_ok(), allowed);
    }

    #[test]
    fn empty_configured_token_rejects_everything() {
        assert!(matches!(authorize("", Some("Bearer ")), Err(CommandError::Unauthorized)));
        assert!(authorize("", None).is_err());
    }

    #[test]
    fn selection_errors_are_client_input() {
        let err: CommandError =
            RunError::Selection(crate::application::SelectionError::UnknownStorage("csv".into())).into();
        assert!(matches!(err, CommandError::InvalidInput(_)));
    }
}
