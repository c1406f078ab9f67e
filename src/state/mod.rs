//! State module for tracking crawl progress
//!
//! A crawl walks the storefront page by page through a small state machine.
//! The cursor holding that state is owned by the caller and passed into the
//! crawler, so separate crawls never share progress.
//!
//! # Components
//!
//! - `CrawlPhase`: The step the crawl is in (fetching, processing, pagination, done)
//! - `CrawlCursor`: Current page number plus the current phase

mod crawl_state;

// Re-export main types
pub use crawl_state::{CrawlCursor, CrawlPhase};
