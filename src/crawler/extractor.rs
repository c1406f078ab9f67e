//! Listing extraction from rendered storefront markup
//!
//! Each field of a listing is extracted on its own and may be missing.
//! Missing optional fields are logged and left empty; a listing without an
//! identifier, a name, or a parsable price is rejected as a whole.

use crate::parsers::{parse_price, select_highest_resolution};
use crate::storage::Listing;
use crate::HarvestError;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

const LISTING_CARD: &str = "div.product-card";
const DETAIL_ANCHOR: &str = "a.card-header[href]";
const NAME: &str = "h4.title";
const DESCRIPTION: &str = "p.description";
const PRICE: &str = "div.price-wrapper";
const OUT_OF_STOCK: &str = "p.out-of-stock";
const CATEGORY_CONTAINER: &str = "p.category";
const CATEGORY_TAG: &str = "span";
const IMAGE: &str = "img.image";
const PAGINATION: &str = "ul.pagination";
const NEXT_DISABLED: &str = "li.next.disabled";

/// Why a listing fragment did not produce a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("listing has no resolvable identifier")]
    MissingIdentifier,

    #[error("listing {external_id} has no name")]
    MissingName { external_id: i64 },

    #[error("listing {external_id} ('{name}') has no parsable price")]
    MissingPrice { external_id: i64, name: String },
}

/// Compiled selectors for the storefront's markup
struct Selectors {
    listing_card: Selector,
    detail_anchor: Selector,
    name: Selector,
    description: Selector,
    price: Selector,
    out_of_stock: Selector,
    category_container: Selector,
    category_tag: Selector,
    image: Selector,
    pagination: Selector,
    next_disabled: Selector,
}

fn selector(css: &str) -> Result<Selector, HarvestError> {
    Selector::parse(css).map_err(|e| HarvestError::Selector(format!("{}: {:?}", css, e)))
}

impl Selectors {
    fn compile() -> Result<Self, HarvestError> {
        Ok(Self {
            listing_card: selector(LISTING_CARD)?,
            detail_anchor: selector(DETAIL_ANCHOR)?,
            name: selector(NAME)?,
            description: selector(DESCRIPTION)?,
            price: selector(PRICE)?,
            out_of_stock: selector(OUT_OF_STOCK)?,
            category_container: selector(CATEGORY_CONTAINER)?,
            category_tag: selector(CATEGORY_TAG)?,
            image: selector(IMAGE)?,
            pagination: selector(PAGINATION)?,
            next_disabled: selector(NEXT_DISABLED)?,
        })
    }
}

/// Collects the text of an element, trimmed
fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Extracts listings and pagination state from storefront pages
pub struct ListingExtractor {
    base_url: Url,
    selectors: Selectors,
}

impl ListingExtractor {
    /// Creates an extractor resolving relative links against `base_url`
    pub fn new(base_url: Url) -> Result<Self, HarvestError> {
        Ok(Self {
            base_url,
            selectors: Selectors::compile()?,
        })
    }

    /// Every listing fragment on the page, in document order
    pub fn listing_fragments<'a>(
        &'a self,
        document: &'a Html,
    ) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        document.select(&self.selectors.listing_card)
    }

    /// Returns true when the page has no further page to move to
    ///
    /// The last page marks its "next" control as disabled. A page without any
    /// pagination control is treated as the last page.
    pub fn is_last_page(&self, document: &Html) -> bool {
        match document.select(&self.selectors.pagination).next() {
            Some(pagination) => pagination
                .select(&self.selectors.next_disabled)
                .next()
                .is_some(),
            None => {
                tracing::warn!("Page has no pagination control, treating it as the last page");
                true
            }
        }
    }

    /// Builds a listing record from one listing fragment
    ///
    /// # Returns
    ///
    /// * `Ok(Listing)` - All mandatory fields were found
    /// * `Err(Rejection)` - The fragment must be skipped
    pub fn extract(&self, fragment: ElementRef<'_>) -> Result<Listing, Rejection> {
        let (url, external_id) = self
            .extract_id_and_url(fragment)
            .ok_or(Rejection::MissingIdentifier)?;

        let name = self
            .extract_name(fragment)
            .ok_or(Rejection::MissingName { external_id })?;

        let price = self
            .extract_price(fragment)
            .ok_or_else(|| Rejection::MissingPrice {
                external_id,
                name: name.clone(),
            })?;

        let description = self.extract_description(fragment);
        if description.is_none() {
            tracing::warn!("Listing {} has no description", external_id);
        }

        let image_url = self.extract_image_url(fragment);
        if image_url.is_none() {
            tracing::warn!("Listing {} has no usable image", external_id);
        }

        Ok(Listing {
            external_id,
            name,
            description,
            price,
            // The storefront markup carries no discount marker
            sale_price: None,
            in_stock: self.extract_in_stock(fragment),
            url: url.to_string(),
            image_url: image_url.map(|url| url.to_string()),
            categories: self.extract_categories(fragment),
        })
    }

    /// Detail page URL and the numeric id in its last path segment
    fn extract_id_and_url(&self, fragment: ElementRef<'_>) -> Option<(Url, i64)> {
        let href = fragment
            .select(&self.selectors.detail_anchor)
            .next()
            .and_then(|anchor| anchor.value().attr("href"));

        let Some(href) = href else {
            tracing::warn!("Listing has no detail link");
            return None;
        };

        let url = match self.base_url.join(href.trim()) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Listing detail link '{}' is invalid: {}", href, e);
                return None;
            }
        };

        let id = url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .and_then(|segment| segment.parse::<i64>().ok());

        match id {
            Some(id) => Some((url, id)),
            None => {
                tracing::warn!("Listing detail link '{}' does not end in a numeric id", href);
                None
            }
        }
    }

    fn extract_name(&self, fragment: ElementRef<'_>) -> Option<String> {
        fragment
            .select(&self.selectors.name)
            .next()
            .map(element_text)
            .filter(|name| !name.is_empty())
    }

    fn extract_description(&self, fragment: ElementRef<'_>) -> Option<String> {
        fragment
            .select(&self.selectors.description)
            .next()
            .map(element_text)
            .filter(|description| !description.is_empty())
    }

    fn extract_price(&self, fragment: ElementRef<'_>) -> Option<f64> {
        let text = fragment
            .select(&self.selectors.price)
            .next()
            .map(element_text)?;

        let price = parse_price(&text);
        if price.is_none() {
            tracing::warn!("Unparsable price text '{}'", text);
        }
        price
    }

    /// In stock unless the listing carries an out-of-stock marker
    fn extract_in_stock(&self, fragment: ElementRef<'_>) -> bool {
        fragment
            .select(&self.selectors.out_of_stock)
            .next()
            .is_none()
    }

    /// Category tag texts with quotes stripped; empty when there is no category container
    fn extract_categories(&self, fragment: ElementRef<'_>) -> Vec<String> {
        let Some(container) = fragment.select(&self.selectors.category_container).next() else {
            return Vec::new();
        };

        container
            .select(&self.selectors.category_tag)
            .map(|tag| element_text(tag).replace('"', "").trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Absolute URL of the widest rendition in the image's `srcset`
    fn extract_image_url(&self, fragment: ElementRef<'_>) -> Option<Url> {
        let srcset = fragment
            .select(&self.selectors.image)
            .next()
            .and_then(|img| img.value().attr("srcset"))?;

        let path = select_highest_resolution(srcset)?;
        match self.base_url.join(&path) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("Image path '{}' is invalid: {}", path, e);
                None
            }
        }
    }
}
