//! Parsing error types
//!
//! `ParsingError` covers parser construction problems (bad selectors), which
//! are configuration faults. Per-listing failures are `SkipReason`s.

use thiserror::Error;

pub use crate::domain::outcomes::SkipReason;

#[derive(Error, Debug, Clone)]
pub enum ParsingError {
    #[error("Invalid CSS selector for {field}: '{selector}' - {reason}")]
    InvalidSelector {
        field: String,
        selector: String,
        reason: String,
    },
}

impl ParsingError {
    /// Create an invalid selector error
    pub fn invalid_selector(field: &str, selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            field: field.to_string(),
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
