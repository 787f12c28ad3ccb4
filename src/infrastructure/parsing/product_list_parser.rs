//! Product list parser for catalog listing pages
//!
//! Every listing element on a page becomes either `ListingFields` or a
//! `SkipReason`. Parsing is synchronous and returns owned data, so the
//! caller can await image downloads afterwards without holding the DOM.

#![allow(clippy::uninlined_format_args)]

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};
use url::Url;

use super::config::ListingSelectors;
use super::{ParseContext, ParsingError, ParsingResult, SkipReason};
use crate::infrastructure::config::defaults;

lazy_static! {
    /// Non-negative decimal: "12", "12.", "12.50", ".5"
    static ref PRICE_PATTERN: Regex = Regex::new(r"^(\d+(\.\d*)?|\.\d+)$").unwrap();
}

/// Raw fields of one listing element that passed extraction
#[derive(Debug, Clone, PartialEq)]
pub struct ListingFields {
    pub title: String,
    pub price: f64,
    /// Absolute image URL (relative links resolved against the page URL)
    pub image_url: String,
}

/// Extraction result for one page
#[derive(Debug, Clone, Default)]
pub struct PageListings {
    /// Number of listing elements found; zero means catalog end
    pub element_count: usize,
    /// One entry per listing element, in document order
    pub candidates: Vec<Result<ListingFields, SkipReason>>,
}

impl PageListings {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.element_count == 0
    }

    pub fn skipped(&self) -> usize {
        self.candidates.iter().filter(|c| c.is_err()).count()
    }
}

/// Parser for extracting listing fields from catalog pages
pub struct ProductListParser {
    container_selector: Selector,
    title_selector: Selector,
    price_selector: Selector,
    image_selector: Selector,
    image_lazy_attr: String,
    image_src_attr: String,
    currency_symbols: Vec<String>,
}

impl ProductListParser {
    /// Create a parser with the default WooCommerce selectors
    pub fn new() -> ParsingResult<Self> {
        let symbols: Vec<String> = defaults::CURRENCY_SYMBOLS.iter().map(ToString::to_string).collect();
        Self::with_config(&ListingSelectors::default(), &symbols)
    }

    /// Create parser with custom selector configuration
    pub fn with_config(selectors: &ListingSelectors, currency_symbols: &[String]) -> ParsingResult<Self> {
        Ok(Self {
            container_selector: Self::compile_selector("product_container", &selectors.product_container)?,
            title_selector: Self::compile_selector("title", &selectors.title)?,
            price_selector: Self::compile_selector("price", &selectors.price)?,
            image_selector: Self::compile_selector("image", &selectors.image)?,
            image_lazy_attr: selectors.image_lazy_attr.clone(),
            image_src_attr: selectors.image_src_attr.clone(),
            currency_symbols: currency_symbols.to_vec(),
        })
    }

    fn compile_selector(field: &str, selector: &str) -> ParsingResult<Selector> {
        Selector::parse(selector).map_err(|e| ParsingError::invalid_selector(field, selector, e))
    }

    /// Extract every listing element on the page
    pub fn extract_listings(&self, html: &str, context: &ParseContext) -> PageListings {
        let document = Html::parse_document(html);
        let candidates: Vec<_> = document
            .select(&self.container_selector)
            .map(|element| self.extract_fields(element, context))
            .collect();

        debug!(
            "Page {}: found {} listing elements ({} extractable)",
            context.page,
            candidates.len(),
            candidates.iter().filter(|c| c.is_ok()).count()
        );

        PageListings {
            element_count: candidates.len(),
            candidates,
        }
    }

    /// Extract required sub-fields of one listing element; fails closed
    fn extract_fields(&self, element: ElementRef<'_>, context: &ParseContext) -> Result<ListingFields, SkipReason> {
        let title = element
            .select(&self.title_selector)
            .next()
            .map(|e| Self::element_text(&e))
            .ok_or(SkipReason::MissingTitle)?;
        let price_text = element
            .select(&self.price_selector)
            .next()
            .map(|e| Self::element_text(&e))
            .ok_or(SkipReason::MissingPrice)?;
        let image = element
            .select(&self.image_selector)
            .next()
            .ok_or(SkipReason::MissingImage)?;

        let price = parse_price(&price_text, &self.currency_symbols)
            .ok_or_else(|| SkipReason::InvalidPrice { raw: price_text.clone() })?;

        let raw_url = self.image_url(&image).ok_or(SkipReason::MissingImageUrl)?;
        let image_url = resolve_url(&context.page_url, raw_url);

        trace!("Extracted '{}' at {} ({})", title, price, image_url);
        Ok(ListingFields {
            title,
            price,
            image_url,
        })
    }

    /// Lazy-load attribute first, then the standard source attribute
    fn image_url<'a>(&self, image: &'a ElementRef<'_>) -> Option<&'a str> {
        [&self.image_lazy_attr, &self.image_src_attr]
            .into_iter()
            .filter_map(|attr| image.value().attr(attr))
            .map(str::trim)
            .find(|value| !value.is_empty())
    }

    fn element_text(element: &ElementRef<'_>) -> String {
        element.text().collect::<String>().trim().to_string()
    }
}

/// Resolve a possibly relative URL against the page URL; unparsable input is kept as-is
fn resolve_url(base: &str, href: &str) -> String {
    match Url::parse(href) {
        Ok(url) => url.to_string(),
        Err(_) => Url::parse(base)
            .and_then(|base| base.join(href))
            .map(|url| url.to_string())
            .unwrap_or_else(|_| href.to_string()),
    }
}

/// Parse price text after stripping currency symbols, thousands separators and whitespace.
/// Returns `None` for anything that is not a non-negative decimal.
pub fn parse_price(raw: &str, currency_symbols: &[String]) -> Option<f64> {
    let mut cleaned = raw.to_string();
    for symbol in currency_symbols {
        cleaned = cleaned.replace(symbol.as_str(), "");
    }
    let cleaned: String = cleaned
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if !PRICE_PATTERN.is_match(&cleaned) {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|p| p.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn symbols() -> Vec<String> {
        defaults::CURRENCY_SYMBOLS.iter().map(ToString::to_string).collect()
    }

    fn listing(title: Option<&str>, price: Option<&str>, img_attrs: Option<&str>) -> String {
        let title = title
            .map(|t| format!(r#"<h2 class="woo-loop-product__title"><a href="/p">{t}</a></h2>"#))
            .unwrap_or_default();
        let price = price
            .map(|p| {
                format!(
                    r#"<span class="price"><span class="woocommerce-Price-amount amount"><bdi>{p}</bdi></span></span>"#
                )
            })
            .unwrap_or_default();
        let image = img_attrs
            .map(|attrs| format!(r#"<div class="mf-product-thumbnail"><img {attrs}></div>"#))
            .unwrap_or_default();
        format!(r#"<li class="product">{image}{title}{price}</li>"#)
    }

    fn page(items: &[String]) -> String {
        format!(r#"<html><body><ul class="products">{}</ul></body></html>"#, items.join(""))
    }

    fn ctx() -> ParseContext {
        ParseContext::new(1, "https://shop.example.com/shop/?page=1")
    }

    #[rstest]
    #[case("₹12,345.00", Some(12345.0))]
    #[case("$ 1,000", Some(1000.0))]
    #[case("€0.99", Some(0.99))]
    #[case("£\u{a0}7.", Some(7.0))]
    #[case(".5", Some(0.5))]
    #[case("Free", None)]
    #[case("", None)]
    #[case("-5.00", None)]
    #[case("12.3.4", None)]
    #[case("₹", None)]
    fn price_parsing(#[case] raw: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_price(raw, &symbols()), expected);
    }

    #[test]
    fn extracts_complete_listing() {
        let html = page(&[listing(
            Some("Widget A"),
            Some("₹1,250.00"),
            Some(r#"src="https://cdn.example.com/a.jpg""#),
        )]);
        let parser = ProductListParser::new().unwrap();
        let result = parser.extract_listings(&html, &ctx());

        assert_eq!(result.element_count, 1);
        assert_eq!(
            result.candidates[0],
            Ok(ListingFields {
                title: "Widget A".into(),
                price: 1250.0,
                image_url: "https://cdn.example.com/a.jpg".into(),
            })
        );
    }

    #[rstest]
    #[case(listing(None, Some("₹10"), Some(r#"src="a.jpg""#)), SkipReason::MissingTitle)]
    #[case(listing(Some("A"), None, Some(r#"src="a.jpg""#)), SkipReason::MissingPrice)]
    #[case(listing(Some("A"), Some("₹10"), None), SkipReason::MissingImage)]
    #[case(listing(Some("A"), Some("₹10"), Some(r#"alt="x""#)), SkipReason::MissingImageUrl)]
    #[case(listing(Some("A"), Some("call us"), Some(r#"src="a.jpg""#)), SkipReason::InvalidPrice { raw: "call us".into() })]
    fn incomplete_listing_is_skipped(#[case] item: String, #[case] expected: SkipReason) {
        let parser = ProductListParser::new().unwrap();
        let result = parser.extract_listings(&page(&[item]), &ctx());
        assert_eq!(result.element_count, 1);
        assert_eq!(result.skipped(), 1);
        assert_eq!(result.candidates[0], Err(expected));
    }

    #[test]
    fn lazy_attribute_takes_priority() {
        let html = page(&[listing(
            Some("A"),
            Some("₹10"),
            Some(r#"src="data:image/svg+xml,placeholder" data-lazy-src="https://cdn.example.com/real.jpg""#),
        )]);
        let result = ProductListParser::new().unwrap().extract_listings(&html, &ctx());
        let fields = result.candidates[0].as_ref().unwrap();
        assert_eq!(fields.image_url, "https://cdn.example.com/real.jpg");
    }

    #[test]
    fn empty_lazy_attribute_falls_back_to_src() {
        let html = page(&[listing(
            Some("A"),
            Some("₹10"),
            Some(r#"data-lazy-src="" src="/media/a.jpg""#),
        )]);
        let result = ProductListParser::new().unwrap().extract_listings(&html, &ctx());
        let fields = result.candidates[0].as_ref().unwrap();
        assert_eq!(fields.image_url, "https://shop.example.com/media/a.jpg");
    }

    #[test]
    fn one_bad_listing_does_not_affect_others() {
        let html = page(&[
            listing(Some("A"), Some("₹10"), Some(r#"src="a.jpg""#)),
            listing(Some("B"), None, Some(r#"src="b.jpg""#)),
            listing(Some("C"), Some("₹30"), Some(r#"src="c.jpg""#)),
        ]);
        let result = ProductListParser::new().unwrap().extract_listings(&html, &ctx());
        assert_eq!(result.element_count, 3);
        assert_eq!(result.skipped(), 1);
        let titles: Vec<_> = result
            .candidates
            .iter()
            .filter_map(|c| c.as_ref().ok())
            .map(|f| f.title.as_str())
            .collect();
        assert_eq!(titles, ["A", "C"]);
    }

    #[test]
    fn page_without_listings_is_empty() {
        let html = "<html><body><p>No products were found.</p></body></html>";
        let result = ProductListParser::new().unwrap().extract_listings(html, &ctx());
        assert!(result.is_empty());
        assert!(result.candidates.is_empty());
    }

    #[test]
    fn invalid_selector_is_reported() {
        let selectors = ListingSelectors {
            price: "[[[".into(),
            ..ListingSelectors::default()
        };
        let err = ProductListParser::with_config(&selectors, &symbols()).err().unwrap();
        assert!(matches!(err, ParsingError::InvalidSelector { ref field, .. } if field == "price"));
    }

    proptest! {
        #[test]
        fn formatted_prices_round_trip(whole in 0u64..10_000_000, cents in 0u32..100) {
            let digits = whole.to_string();
            let mut grouped = String::new();
            for (i, ch) in digits.chars().enumerate() {
                if i > 0 && (digits.len() - i) % 3 == 0 {
                    grouped.push(',');
                }
                grouped.push(ch);
            }
            let text = format!("₹{grouped}.{cents:02}");
            let expected: f64 = format!("{whole}.{cents:02}").parse().unwrap();
            prop_assert_eq!(parse_price(&text, &symbols()), Some(expected));
        }

        #[test]
        fn alphabetic_remainders_are_rejected(word in "[a-zA-Z]{1,12}") {
            prop_assert_eq!(parse_price(&format!("₹{word}"), &symbols()), None);
        }
    }
}
