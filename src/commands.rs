//! Inbound commands
//!
//! Transport-agnostic entry points shared by the HTTP server and the CLI.

pub mod scrape_commands;

// Re-export all commands for easy access
pub use scrape_commands::*;
