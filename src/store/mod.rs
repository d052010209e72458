//! Append-only storage for location records.
//!
//! Two backends share the [`LocationStore`] contract: [`SqliteStore`] survives
//! restarts, [`MemoryStore`] lives as long as the process. Records are read back
//! in insertion order and are never updated or deleted.

mod memory;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{StorageBackend, StorageConfig};
use crate::models::location::LocationRecord;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Appends a record. Once this returns the record is visible to `list_all`.
    async fn append(&self, record: LocationRecord) -> Result<(), StoreError>;

    /// All records in insertion order.
    async fn list_all(&self) -> Result<Vec<LocationRecord>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    /// Check that the backing medium answers.
    async fn health_check(&self) -> Result<(), StoreError> {
        self.count().await.map(|_| ())
    }
}

/// Opens the backend selected in the configuration.
pub async fn open(config: &StorageConfig) -> Result<Arc<dyn LocationStore>, StoreError> {
    match config.backend {
        StorageBackend::Sqlite => Ok(Arc::new(SqliteStore::new(&config.sqlite_path).await?)),
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
