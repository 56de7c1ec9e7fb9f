//! Database schema versioning.
//!
//! The schema version lives in the `metadata` table. Opening a database
//! creates any missing tables, then steps the version up one migration
//! at a time.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{Error, Result};

use super::schema::SCHEMA_STATEMENTS;

/// The current schema version.
pub const CURRENT_VERSION: i32 = 1;

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// Key recording the logkeeper version that created the database.
const CREATED_WITH_KEY: &str = "created_with";

/// Initialize the database schema.
///
/// Creates all tables and indexes if they don't exist, then runs any
/// pending migrations to bring the schema up to the current version.
///
/// # Errors
///
/// Returns an error if schema creation or migration fails, or if the
/// database was written by a newer logkeeper.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let version = schema_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {version} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }
    if version < CURRENT_VERSION {
        run_migrations(conn, version)?;
    }

    Ok(())
}

/// Get the schema version from the database.
///
/// Returns 0 if no version is set (fresh database).
///
/// # Errors
///
/// Returns an error if the metadata table cannot be read or holds a
/// malformed version.
pub fn schema_version(conn: &Connection) -> Result<i32> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        Some(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
        None => Ok(0),
    }
}

fn set_metadata(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (key, value),
    )?;
    Ok(())
}

fn run_migrations(conn: &Connection, from_version: i32) -> Result<()> {
    for version in (from_version + 1)..=CURRENT_VERSION {
        match version {
            1 => migrate_v1(conn)?,
            _ => {
                return Err(Error::DatabaseMigration {
                    message: format!("unknown migration version: {version}"),
                })
            }
        }
        set_metadata(conn, VERSION_KEY, &version.to_string())?;
    }
    Ok(())
}

/// Version 1 is the base schema; record who created it.
fn migrate_v1(conn: &Connection) -> Result<()> {
    set_metadata(conn, CREATED_WITH_KEY, env!("CARGO_PKG_VERSION"))
}
