//! Storage layer for logkeeper.
//!
//! This module provides a `SQLite`-backed document store. Records are kept
//! as JSON documents grouped into named collections; merging a batch
//! replaces every stored document that shares a `(date, aircraft)` group
//! with the batch.

pub mod migrations;
pub mod schema;

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::launch::Record;

const MEMORY_PATH: &str = ":memory:";

const INSERT_DOCUMENT: &str = r"
INSERT OR REPLACE INTO documents (collection, record_key, date, aircraft, body)
VALUES (?1, ?2, ?3, ?4, ?5)
";

/// Document store for launches and aircraft counters.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

/// Outcome of merging a batch into a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Distinct `(date, aircraft)` groups in the batch.
    pub groups: usize,
    /// Stored documents removed from those groups.
    pub deleted: usize,
    /// Documents written.
    pub inserted: usize,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(MEMORY_PATH),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(MEMORY_PATH),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of all collections holding at least one document.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn collection_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT collection FROM documents ORDER BY collection")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Count the documents in a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self, collection: &str) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            [collection],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete every document in a collection.
    ///
    /// Returns the number of documents deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn drop_collection(&self, collection: &str) -> Result<usize> {
        let affected = self
            .conn
            .execute("DELETE FROM documents WHERE collection = ?1", [collection])?;
        if affected > 0 {
            info!("Dropped collection {} ({} documents)", collection, affected);
        }
        Ok(affected)
    }

    /// Copy a collection to `<collection>_<yymmdd>`.
    ///
    /// A backup taken earlier the same day is replaced. Returns the name
    /// of the backup collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn backup_collection(&mut self, collection: &str, today: NaiveDate) -> Result<String> {
        let backup = format!("{collection}_{}", today.format("%y%m%d"));

        let tx = self.conn.transaction()?;
        let replaced = tx.execute("DELETE FROM documents WHERE collection = ?1", [&backup])?;
        let copied = tx.execute(
            r"
            INSERT INTO documents (collection, record_key, date, aircraft, body)
            SELECT ?2, record_key, date, aircraft, body
            FROM documents WHERE collection = ?1
            ",
            params![collection, backup],
        )?;
        tx.commit()?;

        if replaced > 0 {
            debug!("Replaced existing backup {}", backup);
        }
        info!("Backed up {} documents from {} to {}", copied, collection, backup);
        Ok(backup)
    }

    /// Merge a batch of records into a collection.
    ///
    /// In one transaction, every stored document sharing a `(date,
    /// aircraft)` group with the batch is deleted, then the batch is
    /// inserted. Later records with a repeated key replace earlier ones.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be serialized or the database
    /// operation fails; nothing is written in that case.
    pub fn merge<R: Record>(&mut self, collection: &str, records: &[R]) -> Result<MergeReport> {
        if records.is_empty() {
            info!("Nothing to merge into {}", collection);
            return Ok(MergeReport::default());
        }

        let groups: BTreeSet<(NaiveDate, &str)> =
            records.iter().map(|r| (r.date(), r.aircraft())).collect();

        let tx = self.conn.transaction()?;
        let mut deleted = 0;
        {
            let mut stmt = tx.prepare(
                "DELETE FROM documents WHERE collection = ?1 AND date = ?2 AND aircraft = ?3",
            )?;
            for (date, aircraft) in &groups {
                deleted += stmt.execute(params![collection, date.to_string(), aircraft])?;
            }
        }
        let inserted = insert_documents(&tx, collection, records)?;
        tx.commit()?;

        let report = MergeReport {
            groups: groups.len(),
            deleted,
            inserted,
        };
        info!(
            "Merged into {}: {} groups, {} replaced, {} written",
            collection, report.groups, report.deleted, report.inserted
        );
        Ok(report)
    }

    /// Append records to a collection without touching existing groups.
    ///
    /// Returns the number of distinct documents written.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be serialized or the database
    /// operation fails.
    pub fn insert_many<R: Record>(&mut self, collection: &str, records: &[R]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let inserted = insert_documents(&tx, collection, records)?;
        tx.commit()?;
        debug!("Inserted {} documents into {}", inserted, collection);
        Ok(inserted)
    }

    /// Load every document of a collection, ordered by date then key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find<R: Record>(&self, collection: &str) -> Result<Vec<R>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT record_key, body FROM documents
            WHERE collection = ?1
            ORDER BY date, record_key
            ",
        )?;
        let rows = stmt
            .query_map([collection], Self::row_to_body)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(decode_documents(collection, rows))
    }

    /// Load the documents of a collection dated within `since..=until`.
    ///
    /// # Errors
    ///
    /// Returns an error if `since` falls after `until` or the database
    /// operation fails.
    pub fn find_between<R: Record>(
        &self,
        collection: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<R>> {
        if since > until {
            return Err(Error::InvalidDateRange { since, until });
        }

        let mut stmt = self.conn.prepare(
            r"
            SELECT record_key, body FROM documents
            WHERE collection = ?1 AND date >= ?2 AND date <= ?3
            ORDER BY date, record_key
            ",
        )?;
        let rows = stmt
            .query_map(
                params![collection, since.to_string(), until.to_string()],
                Self::row_to_body,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(decode_documents(collection, rows))
    }

    /// Get statistics for a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self, collection: &str) -> Result<StorageStats> {
        let total_documents = self.count(collection)?;

        let (first, last): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(date), MAX(date) FROM documents WHERE collection = ?1",
            [collection],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT aircraft FROM documents WHERE collection = ?1 ORDER BY aircraft",
        )?;
        let aircraft = stmt
            .query_map([collection], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        let last_modified: Option<String> = self.conn.query_row(
            "SELECT MAX(created_at) FROM documents WHERE collection = ?1",
            [collection],
            |row| row.get(0),
        )?;

        let db_size_bytes = if self.path.as_os_str() == MEMORY_PATH {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            collection: collection.to_string(),
            total_documents,
            first_date: first.and_then(|s| s.parse().ok()),
            last_date: last.and_then(|s| s.parse().ok()),
            aircraft,
            last_modified,
            collections: self.collection_names()?,
            schema_version: migrations::schema_version(&self.conn)?,
            db_size_bytes,
        })
    }

    fn row_to_body(row: &rusqlite::Row) -> rusqlite::Result<(String, String)> {
        Ok((row.get(0)?, row.get(1)?))
    }
}

fn insert_documents<R: Record>(conn: &Connection, collection: &str, records: &[R]) -> Result<usize> {
    let mut stmt = conn.prepare(INSERT_DOCUMENT)?;
    let mut keys = HashSet::with_capacity(records.len());
    for record in records {
        let key = record.record_key();
        let body = serde_json::to_string(record)?;
        stmt.execute(params![
            collection,
            key,
            record.date().to_string(),
            record.aircraft(),
            body
        ])?;
        keys.insert(key);
    }
    Ok(keys.len())
}

fn decode_documents<R: Record>(collection: &str, rows: Vec<(String, String)>) -> Vec<R> {
    rows.into_iter()
        .filter_map(|(key, body)| match serde_json::from_str(&body) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping undecodable document {} in {}: {}", key, collection, e);
                None
            }
        })
        .collect()
}

/// Statistics about a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Collection the statistics describe.
    pub collection: String,
    /// Number of documents in the collection.
    pub total_documents: i64,
    /// Earliest document date.
    pub first_date: Option<NaiveDate>,
    /// Latest document date.
    pub last_date: Option<NaiveDate>,
    /// Distinct aircraft in the collection.
    pub aircraft: Vec<String>,
    /// When a document was last written, as `SQLite` UTC text.
    pub last_modified: Option<String>,
    /// Every collection in the database.
    pub collections: Vec<String>,
    /// Schema version of the database.
    pub schema_version: i32,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
