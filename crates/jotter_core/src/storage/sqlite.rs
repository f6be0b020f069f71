//! SQLite-backed key-value storage.
//!
//! # Responsibility
//! - Persist string values in the `key_value` table of a migrated database.
//!
//! # Invariants
//! - One row per key; writes are single-statement upserts.
//! - Construction fails fast when the schema is not ready.

use super::{KeyValueStorage, StorageError, StorageResult};
use rusqlite::{params, Connection, OptionalExtension};

const KEY_VALUE_TABLE: &str = "key_value";
const KEY_VALUE_COLUMNS: [&str; 3] = ["key", "value", "updated_at"];

/// Durable storage owning a connection returned by `db::open_db`.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Takes ownership of a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when migrations
    ///   were not applied to `conn`.
    pub fn try_new(conn: Connection) -> StorageResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self { conn })
    }
}

impl KeyValueStorage for SqliteStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM key_value WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO key_value (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM key_value WHERE key = ?1;", [key])?;
        Ok(())
    }
}

fn ensure_connection_ready(conn: &Connection) -> StorageResult<()> {
    if !table_exists(conn, KEY_VALUE_TABLE)? {
        return Err(StorageError::MissingRequiredTable(KEY_VALUE_TABLE));
    }

    for column in KEY_VALUE_COLUMNS {
        if !table_has_column(conn, KEY_VALUE_TABLE, column)? {
            return Err(StorageError::MissingRequiredColumn {
                table: KEY_VALUE_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StorageResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StorageResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
