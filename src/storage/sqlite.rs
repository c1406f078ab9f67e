//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ListingStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ListingStore, StorageError, StorageResult};
use crate::storage::{ImageSource, Listing, StoredListing};
use crate::HarvestError;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, Transaction};
use std::path::Path;

const LISTING_COLUMNS: &str = "id, external_id, name, description, price, sale_price, in_stock,
     url, image_url, first_seen_at, updated_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = init_database(path)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Loads the category names of a listing in their original order
    fn load_categories(&self, listing_id: i64) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.name FROM listing_categories lc
             JOIN categories c ON c.id = lc.category_id
             WHERE lc.listing_id = ?1
             ORDER BY lc.position",
        )?;

        let names = stmt
            .query_map(params![listing_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(names)
    }

    /// Runs a listing query and attaches the categories of each result
    fn query_listings(
        &self,
        sql: &str,
        args: impl rusqlite::Params,
    ) -> StorageResult<Vec<StoredListing>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut listings = stmt
            .query_map(args, stored_listing_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        for stored in &mut listings {
            stored.listing.categories = self.load_categories(stored.id)?;
        }

        Ok(listings)
    }
}

/// Maps a row selected with `LISTING_COLUMNS`; categories are left empty
fn stored_listing_from_row(row: &Row<'_>) -> rusqlite::Result<StoredListing> {
    Ok(StoredListing {
        id: row.get(0)?,
        listing: Listing {
            external_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            price: row.get(4)?,
            sale_price: row.get(5)?,
            in_stock: row.get(6)?,
            url: row.get(7)?,
            image_url: row.get(8)?,
            categories: Vec::new(),
        },
        first_seen_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Replaces the category links of a listing inside an open transaction
fn write_categories(tx: &Transaction<'_>, listing_id: i64, categories: &[String]) -> StorageResult<()> {
    tx.execute(
        "DELETE FROM listing_categories WHERE listing_id = ?1",
        params![listing_id],
    )?;

    for (position, name) in categories.iter().enumerate() {
        tx.execute(
            "INSERT OR IGNORE INTO categories (name) VALUES (?1)",
            params![name],
        )?;
        let category_id: i64 =
            tx.query_row("SELECT id FROM categories WHERE name = ?1", params![name], |row| {
                row.get(0)
            })?;
        tx.execute(
            "INSERT INTO listing_categories (listing_id, category_id, position) VALUES (?1, ?2, ?3)",
            params![listing_id, category_id, position as i64],
        )?;
    }

    Ok(())
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

impl ListingStore for SqliteStorage {
    // ===== Reconciliation =====

    fn find_by_external_id(&self, external_id: i64) -> StorageResult<Option<StoredListing>> {
        let sql = format!(
            "SELECT {} FROM listings WHERE external_id = ?1",
            LISTING_COLUMNS
        );

        let stored = self
            .conn
            .query_row(&sql, params![external_id], stored_listing_from_row)
            .optional()?;

        match stored {
            Some(mut stored) => {
                stored.listing.categories = self.load_categories(stored.id)?;
                Ok(Some(stored))
            }
            None => Ok(None),
        }
    }

    fn insert(&mut self, listing: &Listing) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        let inserted = tx.execute(
            "INSERT INTO listings (external_id, name, description, price, sale_price, in_stock,
             url, image_url, first_seen_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                listing.external_id,
                listing.name,
                listing.description,
                listing.price,
                listing.sale_price,
                listing.in_stock,
                listing.url,
                listing.image_url,
                now,
            ],
        );

        if let Err(e) = inserted {
            if is_constraint_violation(&e) {
                return Err(StorageError::DuplicateExternalId(listing.external_id));
            }
            return Err(e.into());
        }

        let id = tx.last_insert_rowid();
        write_categories(&tx, id, &listing.categories)?;
        tx.commit()?;

        Ok(id)
    }

    fn update(&mut self, id: i64, listing: &Listing) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        let changed = tx.execute(
            "UPDATE listings SET external_id = ?1, name = ?2, description = ?3, price = ?4,
             sale_price = ?5, in_stock = ?6, url = ?7, image_url = ?8, updated_at = ?9
             WHERE id = ?10",
            params![
                listing.external_id,
                listing.name,
                listing.description,
                listing.price,
                listing.sale_price,
                listing.in_stock,
                listing.url,
                listing.image_url,
                now,
                id,
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::ListingNotFound(id));
        }

        write_categories(&tx, id, &listing.categories)?;
        tx.commit()?;

        Ok(())
    }

    // ===== Read Paths =====

    fn list_category_names(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT c.name FROM categories c
             JOIN listing_categories lc ON lc.category_id = c.id
             ORDER BY c.name",
        )?;

        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(names)
    }

    fn list_image_sources(&self) -> StorageResult<Vec<ImageSource>> {
        let mut stmt = self.conn.prepare(
            "SELECT image_url, external_id FROM listings
             WHERE image_url IS NOT NULL
             ORDER BY external_id",
        )?;

        let sources = stmt
            .query_map([], |row| {
                Ok(ImageSource {
                    image_url: row.get(0)?,
                    external_id: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sources)
    }

    fn list_by_category(&self, name: &str) -> StorageResult<Vec<Listing>> {
        let sql = format!(
            "SELECT {} FROM listings WHERE id IN (
                SELECT lc.listing_id FROM listing_categories lc
                JOIN categories c ON c.id = lc.category_id
                WHERE c.name = ?1
             )
             ORDER BY external_id",
            LISTING_COLUMNS
        );

        let listings = self
            .query_listings(&sql, params![name])?
            .into_iter()
            .map(|stored| stored.listing)
            .collect();

        Ok(listings)
    }

    // ===== Statistics =====

    fn count_listings(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_in_stock(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM listings WHERE in_stock = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

/// Initializes or opens a database at the given path
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(Connection)` - Successfully opened/created database
/// * `Err(rusqlite::Error)` - Failed to open database
pub fn init_database(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
    ",
    )?;

    initialize_schema(&conn)?;

    Ok(conn)
}
