//! Statistics generation from the listing store
//!
//! This module provides functionality for extracting and displaying
//! catalog statistics from the storage layer.

use crate::output::traits::OutputResult;
use crate::storage::ListingStore;

/// Catalog statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogStatistics {
    /// Total number of listings stored
    pub total_listings: u64,

    /// Listings currently marked in stock
    pub in_stock: u64,

    /// Listing count per category, sorted by category name
    pub listings_by_category: Vec<(String, u64)>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CatalogStatistics)` - Successfully loaded statistics
/// * `Err(OutputError)` - Failed to query statistics
pub fn load_statistics<S: ListingStore + ?Sized>(store: &S) -> OutputResult<CatalogStatistics> {
    let total_listings = store.count_listings()?;
    let in_stock = store.count_in_stock()?;

    let mut listings_by_category = Vec::new();
    for name in store.list_category_names()? {
        let count = store.list_by_category(&name)?.len() as u64;
        listings_by_category.push((name, count));
    }

    Ok(CatalogStatistics {
        total_listings,
        in_stock,
        listings_by_category,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CatalogStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Overview:");
    println!("  Total listings: {}", stats.total_listings);
    let percentage = if stats.total_listings > 0 {
        (stats.in_stock as f64 / stats.total_listings as f64) * 100.0
    } else {
        0.0
    };
    println!("  In stock: {} ({:.1}%)", stats.in_stock, percentage);
    println!();

    if !stats.listings_by_category.is_empty() {
        println!("Listings by Category ({}):", stats.listings_by_category.len());
        // Largest categories first, ties by name
        let mut counts: Vec<_> = stats.listings_by_category.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        for (name, count) in counts {
            println!("  {}: {}", name, count);
        }
    }
}
