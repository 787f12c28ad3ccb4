#![allow(missing_docs)]

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    catalog_scraper_lib::run().await
}
