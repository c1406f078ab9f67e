//! CSV export of the stored catalog
//!
//! The export is grouped by category: every listing appears once per category
//! it belongs to, with the category name in the first column.

use crate::output::traits::{Exporter, OutputResult};
use crate::storage::{Listing, ListingStore};
use std::io::Write;

/// Name of the leading column holding the category of each row
pub const CATEGORY_COLUMN: &str = "category";

/// [`Exporter`] writing comma-separated rows to any writer
pub struct CsvExporter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvExporter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(inner),
        }
    }

    /// Flushes and returns the underlying writer
    pub fn into_inner(self) -> OutputResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| e.into_error().into())
    }
}

impl<W: Write> Exporter for CsvExporter<W> {
    fn write_header(&mut self, columns: &[&str]) -> OutputResult<()> {
        self.writer.write_record(columns)?;
        Ok(())
    }

    fn write_row(&mut self, cells: &[String]) -> OutputResult<()> {
        self.writer.write_record(cells)?;
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Exports every listing grouped by category
///
/// # Arguments
///
/// * `store` - The listing store to read from
/// * `exporter` - Destination of the rows
///
/// # Returns
///
/// * `Ok(u64)` - Number of data rows written
/// * `Err(OutputError)` - Reading the store or writing a row failed
pub fn export_by_category<S, E>(store: &S, exporter: &mut E) -> OutputResult<u64>
where
    S: ListingStore + ?Sized,
    E: Exporter + ?Sized,
{
    let mut header = Vec::with_capacity(Listing::FIELD_NAMES.len() + 1);
    header.push(CATEGORY_COLUMN);
    header.extend_from_slice(&Listing::FIELD_NAMES);
    exporter.write_header(&header)?;

    let mut rows = 0u64;
    for category in store.list_category_names()? {
        let listings = store.list_by_category(&category)?;
        tracing::debug!("Exporting {} listings in '{}'", listings.len(), category);

        for listing in &listings {
            let mut cells = Vec::with_capacity(header.len());
            cells.push(category.clone());
            cells.extend(listing.to_row());
            exporter.write_row(&cells)?;
            rows += 1;
        }
    }

    exporter.flush()?;
    tracing::info!("Exported {} rows", rows);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;

    fn listing(id: i64, name: &str, categories: &[&str]) -> Listing {
        Listing {
            external_id: id,
            name: name.to_string(),
            description: Some(format!("About {}", name)),
            price: 10.5,
            sale_price: None,
            in_stock: id % 2 == 0,
            url: format!("https://shop.example.com/products/{}", id),
            image_url: None,
            categories: categories.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn export_to_string(store: &SqliteStorage) -> (u64, String) {
        let mut exporter = CsvExporter::new(Vec::new());
        let rows = export_by_category(store, &mut exporter).unwrap();
        let bytes = exporter.into_inner().unwrap();
        (rows, String::from_utf8(bytes).unwrap())
    }

    #[test]
    fn test_header_only_for_empty_store() {
        let store = SqliteStorage::new_in_memory().unwrap();
        let (rows, csv) = export_to_string(&store);

        assert_eq!(rows, 0);
        assert_eq!(
            csv,
            "category,external_id,name,description,price,sale_price,in_stock,url,image_url,categories\n"
        );
    }

    #[test]
    fn test_listing_repeated_per_category() {
        let mut store = SqliteStorage::new_in_memory().unwrap();
        store
            .insert(&listing(1, "Chess", &["Strategy", "Board"]))
            .unwrap();
        store.insert(&listing(2, "Go", &["Strategy"])).unwrap();

        let (rows, csv) = export_to_string(&store);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(rows, 3);
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("Board,1,Chess,"));
        assert!(lines[2].starts_with("Strategy,1,Chess,"));
        assert!(lines[3].starts_with("Strategy,2,Go,"));
    }

    #[test]
    fn test_cells_with_commas_are_quoted() {
        let mut store = SqliteStorage::new_in_memory().unwrap();
        store
            .insert(&listing(3, "Bread, Butter & Jam", &["Party"]))
            .unwrap();

        let (_, csv) = export_to_string(&store);
        assert!(csv.contains("\"Bread, Butter & Jam\""));
    }

    #[test]
    fn test_uncategorized_listing_not_exported() {
        let mut store = SqliteStorage::new_in_memory().unwrap();
        store.insert(&listing(4, "Loner", &[])).unwrap();

        let (rows, _) = export_to_string(&store);
        assert_eq!(rows, 0);
    }
}
