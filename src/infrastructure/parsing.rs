//! HTML parsing infrastructure for catalog listing pages
//!
//! Extraction is pure: page markup in, candidate fields out. Image download
//! and record construction happen in the crawl controller.

pub mod config;
pub mod context;
pub mod error;
pub mod product_list_parser;

// Re-export public types
pub use config::ListingSelectors;
pub use context::ParseContext;
pub use error::{ParsingError, ParsingResult, SkipReason};
pub use product_list_parser::{ListingFields, PageListings, ProductListParser, parse_price};
