//! Exporter traits and error types
//!
//! This module defines the trait interface for export sinks and the
//! associated error types.

use crate::storage::StorageError;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A tabular export sink
///
/// Callers write one header, any number of rows, then flush. Rows are not
/// checked against the header width.
pub trait Exporter {
    /// Writes the column names
    fn write_header(&mut self, columns: &[&str]) -> OutputResult<()>;

    /// Writes one row of cells
    fn write_row(&mut self, cells: &[String]) -> OutputResult<()>;

    /// Flushes buffered rows to the underlying writer
    fn flush(&mut self) -> OutputResult<()>;
}
