//! Crawl phase definitions and the per-run cursor
//!
//! Transitions allowed by the state machine:
//!
//! ```text
//! FetchingPage -> ProcessingListings -> CheckingPagination -> FetchingPage
//!                                                          \-> Done
//! ```

use std::fmt;

/// The step a crawl is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Loading and rendering the current page
    FetchingPage,

    /// Extracting and reconciling every listing on the rendered page
    ProcessingListings,

    /// Deciding between the next page and stopping
    CheckingPagination,

    /// Terminal: no further pages will be visited
    Done,
}

impl CrawlPhase {
    /// Returns true for the terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::FetchingPage, Self::ProcessingListings)
                | (Self::ProcessingListings, Self::CheckingPagination)
                | (Self::CheckingPagination, Self::FetchingPage)
                | (Self::CheckingPagination, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchingPage => "fetching_page",
            Self::ProcessingListings => "processing_listings",
            Self::CheckingPagination => "checking_pagination",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// In-memory progress of a single crawl
///
/// Pages are numbered from 1 and only ever move forward. Nothing here is
/// persisted; a new cursor always starts over at page 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlCursor {
    page: u32,
    phase: CrawlPhase,
}

impl CrawlCursor {
    /// Creates a cursor positioned at page 1, about to fetch it
    pub fn new() -> Self {
        Self {
            page: 1,
            phase: CrawlPhase::FetchingPage,
        }
    }

    /// The page number currently being worked on
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Returns true once the crawl reached its terminal phase
    pub fn is_done(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Moves to `next`, rejecting transitions the state machine does not allow
    ///
    /// Moving from `CheckingPagination` back to `FetchingPage` also advances
    /// the page counter.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Transition applied
    /// * `Err((from, to))` - Transition not allowed; the cursor is unchanged
    pub fn transition(&mut self, next: CrawlPhase) -> Result<(), (CrawlPhase, CrawlPhase)> {
        if !self.phase.can_transition_to(next) {
            return Err((self.phase, next));
        }

        if self.phase == CrawlPhase::CheckingPagination && next == CrawlPhase::FetchingPage {
            self.page += 1;
        }
        self.phase = next;
        Ok(())
    }
}

impl Default for CrawlCursor {
    fn default() -> Self {
        Self::new()
    }
}
