//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{ImageSource, Listing, StoredListing};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Listing not found: {0}")]
    ListingNotFound(i64),

    #[error("Duplicate external id: {0}")]
    DuplicateExternalId(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for listing repositories
///
/// The crawler treats a store as an upsert target keyed by the storefront's
/// external id; the image pipeline and the exporter only read from it.
pub trait ListingStore {
    // ===== Reconciliation =====

    /// Looks up a listing by the storefront's identifier
    fn find_by_external_id(&self, external_id: i64) -> StorageResult<Option<StoredListing>>;

    /// Inserts a new listing and its categories
    ///
    /// # Returns
    ///
    /// The row id of the new listing
    fn insert(&mut self, listing: &Listing) -> StorageResult<i64>;

    /// Overwrites every mutable field of an existing listing
    ///
    /// The category links are replaced with the listing's current categories.
    fn update(&mut self, id: i64, listing: &Listing) -> StorageResult<()>;

    // ===== Read Paths =====

    /// Distinct category names, sorted
    fn list_category_names(&self) -> StorageResult<Vec<String>>;

    /// Image URL and external id of every listing that has an image
    fn list_image_sources(&self) -> StorageResult<Vec<ImageSource>>;

    /// Every listing linked to the named category
    fn list_by_category(&self, name: &str) -> StorageResult<Vec<Listing>>;

    // ===== Statistics =====

    fn count_listings(&self) -> StorageResult<u64>;

    fn count_in_stock(&self) -> StorageResult<u64>;
}
