//! Parsing context for listing extraction

/// Context information for parsing one catalog page
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Current page being parsed (1-based)
    pub page: u32,

    /// Page URL, used to resolve relative image links
    pub page_url: String,
}

impl ParseContext {
    #[must_use]
    pub fn new(page: u32, page_url: impl Into<String>) -> Self {
        Self {
            page,
            page_url: page_url.into(),
        }
    }
}
