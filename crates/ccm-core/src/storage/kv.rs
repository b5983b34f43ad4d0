//! Key-value blob operations

use crate::storage::db::DatabaseError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

/// Key-value storage operations
pub struct KvStore<'a> {
    conn: &'a Connection,
}

impl<'a> KvStore<'a> {
    /// Create a new key-value store
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Get the value stored under a key
    ///
    /// # Errors
    /// Returns an error if the value cannot be retrieved
    pub fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row(
                r"
                SELECT value FROM kv WHERE key = ?1
                ",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }

    /// Insert or replace the value under a key
    ///
    /// # Errors
    /// Returns an error if the value cannot be written
    pub fn put(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            r"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, value, Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }

    /// Delete a key
    ///
    /// # Errors
    /// Returns an error if the key cannot be deleted
    pub fn delete(&self, key: &str) -> Result<bool, DatabaseError> {
        let deleted = self.conn.execute(
            r"
            DELETE FROM kv WHERE key = ?1
            ",
            params![key],
        )?;

        Ok(deleted > 0)
    }
}
