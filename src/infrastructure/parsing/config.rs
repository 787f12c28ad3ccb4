//! Parsing configuration for listing extraction
//!
//! Centralized CSS selectors and attribute names for one listing element.

use serde::{Deserialize, Serialize};

/// CSS selectors for product listing pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    /// One match per listing element on a catalog page
    pub product_container: String,

    /// Title text, relative to the container
    pub title: String,

    /// Price text, relative to the container
    pub price: String,

    /// Image element, relative to the container
    pub image: String,

    /// Lazy-load attribute; preferred over `image_src_attr` when both exist
    pub image_lazy_attr: String,

    /// Standard source attribute
    pub image_src_attr: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            product_container: "li.product".to_string(),
            title: ".woo-loop-product__title a".to_string(),
            price: ".price .woocommerce-Price-amount bdi".to_string(),
            image: ".mf-product-thumbnail img".to_string(),
            image_lazy_attr: "data-lazy-src".to_string(),
            image_src_attr: "src".to_string(),
        }
    }
}
