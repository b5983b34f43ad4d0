//! Storage layer (`SQLite` key-value blobs)

pub mod db;
pub mod kv;
pub mod migrations;

pub use db::{Database, DatabaseError};
pub use kv::KvStore;

/// A keyed store of opaque string blobs
pub trait BlobStore {
    /// Read the blob under `key`
    ///
    /// # Errors
    /// Returns an error if the medium cannot be read
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError>;

    /// Write the blob under `key`, replacing any previous value
    ///
    /// # Errors
    /// Returns an error if the medium cannot be written
    fn put(&self, key: &str, value: &str) -> Result<(), DatabaseError>;

    /// Remove the blob under `key`; missing keys are not an error
    ///
    /// # Errors
    /// Returns an error if the medium cannot be written
    fn remove(&self, key: &str) -> Result<(), DatabaseError>;
}

impl BlobStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        KvStore::new(self.connection()).get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        KvStore::new(self.connection()).put(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), DatabaseError> {
        KvStore::new(self.connection()).delete(key).map(|_| ())
    }
}
