//! Crawler coordinator - main crawl orchestration logic
//!
//! This module walks the storefront page by page:
//! - Rendering each catalog page through a [`RenderablePage`]
//! - Extracting every listing on the page
//! - Reconciling listings with the store (update when known, insert otherwise)
//! - Following pagination until the last page
//!
//! Page-level and store failures abort the crawl. Listings rejected during
//! extraction are logged, counted in the [`CrawlReport`], and skipped.

use crate::config::SiteConfig;
use crate::crawler::extractor::ListingExtractor;
use crate::crawler::page::RenderablePage;
use crate::state::{CrawlCursor, CrawlPhase};
use crate::storage::{Listing, ListingStore};
use crate::{HarvestError, Result};
use scraper::Html;
use url::Url;

/// Outcome counters of one crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Page numbers visited, in visiting order
    pub pages_visited: Vec<u32>,

    /// Listing fragments found across all pages
    pub listings_found: u64,

    /// Listings created in the store
    pub inserted: u64,

    /// Listings already known to the store and updated in place
    pub updated: u64,

    /// Fragments rejected during extraction
    pub rejected: u64,
}

/// Main crawler coordinator structure
pub struct Coordinator<'s, P, S> {
    page: P,
    store: &'s mut S,
    extractor: ListingExtractor,
    listings_url: Url,
    max_pages: Option<u32>,
}

impl<'s, P, S> Coordinator<'s, P, S>
where
    P: RenderablePage,
    S: ListingStore,
{
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `page` - The page renderer; it is closed when the crawl ends
    /// * `store` - The listing store to reconcile with
    /// * `site` - Storefront location and crawl bounds
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - The site URLs could not be parsed
    pub fn new(page: P, store: &'s mut S, site: &SiteConfig) -> Result<Self> {
        let base_url = Url::parse(&site.base_url)?;
        let listings_url = base_url.join(&site.listings_path)?;

        Ok(Self {
            page,
            store,
            extractor: ListingExtractor::new(base_url)?,
            listings_url,
            max_pages: site.max_pages,
        })
    }

    /// The page renderer driven by this coordinator
    pub fn page(&self) -> &P {
        &self.page
    }

    /// URL of a numbered catalog page
    pub fn page_url(&self, page_number: u32) -> String {
        let mut url = self.listings_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("page", &page_number.to_string());
        url.to_string()
    }

    /// Runs the crawl until the cursor reaches `Done`
    ///
    /// The browsing session is closed on every exit path. If the crawl itself
    /// failed, that error is returned and a close failure is only logged.
    pub async fn run(&mut self, cursor: &mut CrawlCursor) -> Result<CrawlReport> {
        tracing::info!("Starting crawl of {}", self.listings_url);

        let mut report = CrawlReport::default();
        let outcome = self.drive(cursor, &mut report).await;
        let closed = self.page.close().await;

        match (outcome, closed) {
            (Ok(()), Ok(())) => {
                tracing::info!(
                    "Crawl completed: {} pages, {} inserted, {} updated, {} rejected",
                    report.pages_visited.len(),
                    report.inserted,
                    report.updated,
                    report.rejected
                );
                Ok(report)
            }
            (Ok(()), Err(close_err)) => Err(close_err),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                tracing::warn!("Failed to close browsing session: {}", close_err);
                Err(e)
            }
        }
    }

    /// Steps the state machine until it reaches `Done`
    async fn drive(&mut self, cursor: &mut CrawlCursor, report: &mut CrawlReport) -> Result<()> {
        let mut markup = String::new();

        loop {
            match cursor.phase() {
                CrawlPhase::FetchingPage => {
                    markup = self.fetch_page(cursor.page()).await?;
                    report.pages_visited.push(cursor.page());
                    advance(cursor, CrawlPhase::ProcessingListings)?;
                }
                CrawlPhase::ProcessingListings => {
                    self.process_listings(&markup, cursor.page(), report)?;
                    advance(cursor, CrawlPhase::CheckingPagination)?;
                }
                CrawlPhase::CheckingPagination => {
                    let next = if self.is_last_page(&markup) {
                        tracing::info!("Page {} is the last page", cursor.page());
                        CrawlPhase::Done
                    } else if self.max_pages.is_some_and(|max| cursor.page() >= max) {
                        tracing::warn!(
                            "Stopping after page {}: max-pages limit reached",
                            cursor.page()
                        );
                        CrawlPhase::Done
                    } else {
                        CrawlPhase::FetchingPage
                    };
                    advance(cursor, next)?;
                }
                CrawlPhase::Done => return Ok(()),
            }
        }
    }

    /// Loads a catalog page, scrolls it fully, and returns the rendered markup
    async fn fetch_page(&mut self, page_number: u32) -> Result<String> {
        let url = self.page_url(page_number);
        tracing::info!("Scraping page {} ({})", page_number, url);

        self.page.navigate(&url).await?;
        self.page.scroll_to_bottom().await?;
        self.page.rendered_markup().await
    }

    /// Extracts and reconciles every listing on a rendered page
    ///
    /// A store failure stops the page at the failing listing.
    fn process_listings(
        &mut self,
        markup: &str,
        page_number: u32,
        report: &mut CrawlReport,
    ) -> Result<()> {
        let document = Html::parse_document(markup);
        let mut found = 0u64;

        for fragment in self.extractor.listing_fragments(&document) {
            found += 1;
            match self.extractor.extract(fragment) {
                Ok(listing) => reconcile(self.store, &listing, report)?,
                Err(rejection) => {
                    tracing::warn!("Skipping listing on page {}: {}", page_number, rejection);
                    report.rejected += 1;
                }
            }
        }

        if found == 0 {
            tracing::warn!("No listings found on page {}", page_number);
        }
        report.listings_found += found;
        Ok(())
    }

    fn is_last_page(&self, markup: &str) -> bool {
        let document = Html::parse_document(markup);
        self.extractor.is_last_page(&document)
    }
}

/// Applies a phase transition, surfacing a rejected one as an error
fn advance(cursor: &mut CrawlCursor, next: CrawlPhase) -> Result<()> {
    cursor
        .transition(next)
        .map_err(|(from, to)| HarvestError::InvalidTransition { from, to })
}

/// Updates the listing if its external id is known, inserts it otherwise
fn reconcile<S: ListingStore>(
    store: &mut S,
    listing: &Listing,
    report: &mut CrawlReport,
) -> Result<()> {
    let external_id = listing.external_id;

    let written = match store.find_by_external_id(external_id) {
        Ok(Some(existing)) => store.update(existing.id, listing).map(|_| {
            tracing::debug!("Updated listing {}", external_id);
            report.updated += 1;
        }),
        Ok(None) => store.insert(listing).map(|_| {
            tracing::debug!("Inserted listing {}", external_id);
            report.inserted += 1;
        }),
        Err(e) => Err(e),
    };

    written.map_err(|e| {
        tracing::error!("Failed to store listing {}: {}", external_id, e);
        HarvestError::Storage(e)
    })
}
