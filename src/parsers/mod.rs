//! Value parsers for storefront markup
//!
//! Both parsers are pure and never fail loudly: malformed input yields `None`
//! and the caller decides whether the missing value is fatal for a listing.

mod price;
mod srcset;

pub use price::parse_price;
pub use srcset::{rank_candidates, select_highest_resolution, ImageCandidate};
