//! Fixed DDL for the `examples` table and the compatibility check run on open.

use reframe_core::{Error, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::to_init_err;

pub const TABLE: &str = "examples";

/// Column names in declaration order
pub const COLUMNS: [&str; 4] = ["id", "dysfunctional_text", "embedding", "functional_text"];

pub const CREATE_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS examples (
        id                  INTEGER PRIMARY KEY AUTOINCREMENT,
        dysfunctional_text  TEXT NOT NULL,
        embedding           TEXT NOT NULL,
        functional_text     TEXT NOT NULL
    );
";

/// Create the table if absent, or verify that an existing one matches.
///
/// Returns `true` when the table was created by this call. The schema is never
/// altered once it exists.
pub fn ensure_schema(conn: &Connection) -> Result<bool> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [TABLE],
            |row| row.get(0),
        )
        .optional()
        .map_err(to_init_err)?;

    if existing.is_none() {
        conn.execute_batch(CREATE_SCHEMA).map_err(to_init_err)?;
        return Ok(true);
    }

    let found = table_columns(conn)?;
    if found != COLUMNS {
        return Err(Error::StoreInit(format!(
            "incompatible schema for table '{}': expected columns {:?}, found {:?}",
            TABLE, COLUMNS, found
        )));
    }
    Ok(false)
}

fn table_columns(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info('examples') ORDER BY cid")
        .map_err(to_init_err)?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(to_init_err)?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(to_init_err)
}
