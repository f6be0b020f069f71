//! Durable key-value storage port.
//!
//! # Responsibility
//! - Define the read/write contract the note store persists through.
//! - Keep backend details (SQLite, memory) out of store logic.
//!
//! # Invariants
//! - `set_item` replaces the whole value of one key atomically.
//! - Absence of a key is `Ok(None)`, never an error.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage backend error.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    /// Connection schema lacks a required table.
    MissingRequiredTable(&'static str),
    /// Connection schema lacks a required column.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Backend refused the write (quota, read-only medium).
    WriteRejected(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "storage schema is missing table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "storage schema is missing column `{table}.{column}`")
            }
            Self::WriteRejected(reason) => write!(f, "storage write rejected: {reason}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// String key-value storage, shaped after browser local storage.
pub trait KeyValueStorage {
    /// Reads the value stored under `key`.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    /// Replaces the value stored under `key`.
    fn set_item(&mut self, key: &str, value: &str) -> StorageResult<()>;
    /// Removes `key`; removing a missing key is a no-op.
    fn remove_item(&mut self, key: &str) -> StorageResult<()>;
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for &mut S {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> StorageResult<()> {
        (**self).remove_item(key)
    }
}
