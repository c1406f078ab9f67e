//! Output module for exporting the stored catalog
//!
//! This module handles:
//! - Exporting listings grouped by category as CSV
//! - Computing and printing catalog statistics

mod csv_export;
pub mod stats;
mod traits;

pub use csv_export::{export_by_category, CsvExporter, CATEGORY_COLUMN};
pub use stats::{load_statistics, print_statistics, CatalogStatistics};
pub use traits::{Exporter, OutputError, OutputResult};
