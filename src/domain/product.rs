//! # Product Record
//!
//! Immutable value type for one scraped catalog entry. Identity is the exact
//! title string (case- and whitespace-sensitive).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejection reasons for record construction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("product title is empty")]
    EmptyTitle,

    #[error("product price is not a finite number: {0}")]
    NonFinitePrice(f64),

    #[error("product price is negative: {0}")]
    NegativePrice(f64),
}

/// Product record as persisted in the snapshot
///
/// Field names on the wire (`product_title`, `product_price`, `path_to_image`)
/// are shared by every snapshot backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProductRecord")]
pub struct ProductRecord {
    #[serde(rename = "product_title")]
    title: String,
    #[serde(rename = "product_price")]
    price: f64,
    #[serde(rename = "path_to_image")]
    image_path: String,
}

/// Unvalidated shape used only to route deserialization through `ProductRecord::new`
#[derive(Deserialize)]
struct RawProductRecord {
    product_title: String,
    product_price: f64,
    #[serde(default)]
    path_to_image: String,
}

impl TryFrom<RawProductRecord> for ProductRecord {
    type Error = RecordError;

    fn try_from(raw: RawProductRecord) -> Result<Self, Self::Error> {
        Self::new(raw.product_title, raw.product_price, raw.path_to_image)
    }
}

impl ProductRecord {
    /// Build a record, failing closed on empty title or invalid price.
    /// `image_path` may be empty when the image could not be resolved.
    pub fn new(
        title: impl Into<String>,
        price: f64,
        image_path: impl Into<String>,
    ) -> Result<Self, RecordError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(RecordError::EmptyTitle);
        }
        if !price.is_finite() {
            return Err(RecordError::NonFinitePrice(price));
        }
        if price < 0.0 {
            return Err(RecordError::NegativePrice(price));
        }

        Ok(Self {
            title,
            price,
            image_path: image_path.into(),
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub const fn price(&self) -> f64 {
        self.price
    }

    #[must_use]
    pub fn image_path(&self) -> &str {
        &self.image_path
    }

    /// Same title and price, pointing at a different local image
    #[must_use]
    pub fn with_image_path(self, image_path: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
            ..self
        }
    }

    /// Exact price comparison; prices come from the same parser on both sides
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn same_price(&self, price: f64) -> bool {
        self.price == price
    }
}
