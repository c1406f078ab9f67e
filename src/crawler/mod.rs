//! Crawler module for storefront page rendering and listing extraction
//!
//! This module contains the core crawling logic, including:
//! - HTTP client construction and static page fetching
//! - Page rendering behind the [`RenderablePage`] seam (HTTP or headless Chromium)
//! - Listing extraction from rendered catalog markup
//! - Overall crawl coordination driven by a [`CrawlCursor`](crate::state::CrawlCursor)

#[cfg(feature = "browser")]
mod chromium;
mod coordinator;
mod extractor;
mod fetcher;
mod page;

#[cfg(feature = "browser")]
pub use chromium::ChromiumPage;
pub use coordinator::{Coordinator, CrawlReport};
pub use extractor::{ListingExtractor, Rejection};
pub use fetcher::{build_http_client, fetch_page, user_agent_string};
pub use page::{HttpPage, RenderablePage};

use crate::config::{Config, RenderMode};
use crate::state::CrawlCursor;
use crate::storage::ListingStore;
use crate::Result;
use std::time::Duration;

/// Runs a complete crawl operation
///
/// This is the main entry point for scraping. It will:
/// 1. Open a page renderer for the configured render mode
/// 2. Walk the catalog from page 1 until the last page
/// 3. Reconcile every extracted listing with the store
/// 4. Close the renderer
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `store` - The listing store to reconcile with
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed successfully
/// * `Err(HarvestError)` - Crawl failed
pub async fn crawl<S: ListingStore>(config: &Config, store: &mut S) -> Result<CrawlReport> {
    let mut cursor = CrawlCursor::new();

    match config.render.mode {
        RenderMode::Http => {
            let client = build_http_client(
                &config.user_agent,
                Duration::from_secs(config.render.navigation_timeout_secs),
            )?;
            let mut coordinator = Coordinator::new(HttpPage::new(client), store, &config.site)?;
            coordinator.run(&mut cursor).await
        }
        RenderMode::Chromium => crawl_with_browser(config, store, &mut cursor).await,
    }
}

#[cfg(feature = "browser")]
async fn crawl_with_browser<S: ListingStore>(
    config: &Config,
    store: &mut S,
    cursor: &mut CrawlCursor,
) -> Result<CrawlReport> {
    let page = ChromiumPage::launch(&config.render).await?;
    let mut coordinator = Coordinator::new(page, store, &config.site)?;
    coordinator.run(cursor).await
}

#[cfg(not(feature = "browser"))]
async fn crawl_with_browser<S: ListingStore>(
    _config: &Config,
    _store: &mut S,
    _cursor: &mut CrawlCursor,
) -> Result<CrawlReport> {
    Err(crate::ConfigError::Validation(
        "render mode 'chromium' requires building with the 'browser' feature".to_string(),
    )
    .into())
}
