//! Storage module for persisting the extracted catalog
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - Listing upserts keyed by the storefront's own identifier
//! - Category names and their many-to-many links to listings
//! - Read paths for the image pipeline and the CSV export

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{init_database, SqliteStorage};
pub use traits::{ListingStore, StorageError, StorageResult};

use crate::HarvestError;

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(HarvestError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, HarvestError> {
    SqliteStorage::new(path)
}

/// A product listing as extracted from the storefront
///
/// A listing always carries a name and a price; records missing either are
/// rejected during extraction and never reach a store.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    /// Identifier used by the storefront itself, stable across runs
    pub external_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub sale_price: Option<f64>,
    pub in_stock: bool,
    /// Absolute URL of the listing's detail page
    pub url: String,
    /// Absolute URL of the widest image rendition, if one was found
    pub image_url: Option<String>,
    /// Category names in page order; duplicates are allowed
    pub categories: Vec<String>,
}

impl Listing {
    /// Column names matching [`Listing::to_row`]
    pub const FIELD_NAMES: [&'static str; 9] = [
        "external_id",
        "name",
        "description",
        "price",
        "sale_price",
        "in_stock",
        "url",
        "image_url",
        "categories",
    ];

    /// Flattens the listing into export cells, absent values as empty strings
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.external_id.to_string(),
            self.name.clone(),
            self.description.clone().unwrap_or_default(),
            format!("{:.2}", self.price),
            self.sale_price
                .map(|price| format!("{:.2}", price))
                .unwrap_or_default(),
            self.in_stock.to_string(),
            self.url.clone(),
            self.image_url.clone().unwrap_or_default(),
            self.categories.join(";"),
        ]
    }
}

/// A listing together with its row id in the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredListing {
    pub id: i64,
    pub listing: Listing,
    pub first_seen_at: String,
    pub updated_at: String,
}

/// Image source of one listing: its widest image URL and external id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub image_url: String,
    pub external_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_listing() -> Listing {
        Listing {
            external_id: 7,
            name: "Super Mario Galaxy".to_string(),
            description: None,
            price: 91.99,
            sale_price: None,
            in_stock: true,
            url: "https://shop.example.com/products/7".to_string(),
            image_url: Some("https://shop.example.com/assets/platformer.jpg".to_string()),
            categories: vec!["Platformer".to_string(), "Action".to_string()],
        }
    }

    #[test]
    fn test_row_matches_field_names() {
        let row = sample_listing().to_row();
        assert_eq!(row.len(), Listing::FIELD_NAMES.len());
    }

    #[test]
    fn test_row_formats_values() {
        let row = sample_listing().to_row();
        assert_eq!(row[0], "7");
        assert_eq!(row[2], "");
        assert_eq!(row[3], "91.99");
        assert_eq!(row[4], "");
        assert_eq!(row[5], "true");
        assert_eq!(row[8], "Platformer;Action");
    }
}
