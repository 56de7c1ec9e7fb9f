//! `SQLite` schema definitions for logkeeper.
//!
//! Every collection lives in the one `documents` table. A document is a
//! JSON body plus the columns needed to find it again: its collection,
//! its record key and its `(date, aircraft)` merge group.

/// SQL statement to create the documents table.
pub const CREATE_DOCUMENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    collection TEXT NOT NULL,
    record_key TEXT NOT NULL,
    date TEXT NOT NULL,
    aircraft TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (collection, record_key)
)
";

/// SQL statement to create an index on the merge group.
pub const CREATE_GROUP_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_documents_group ON documents(collection, date, aircraft)
";

/// SQL statement to create an index on aircraft for per-aircraft queries.
pub const CREATE_AIRCRAFT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_documents_aircraft ON documents(collection, aircraft)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_DOCUMENTS_TABLE,
    CREATE_GROUP_INDEX,
    CREATE_AIRCRAFT_INDEX,
    CREATE_METADATA_TABLE,
];
