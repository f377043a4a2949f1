//! Storage trait definitions

use crate::record::{CanonicalSupplierRecord, IdentityKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Insert hit the uniqueness constraint on the identity key
    #[error("Supplier already stored: {0}")]
    Duplicate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    /// A stored row carries an id that is not a UUID
    #[error("Invalid supplier id: {0}")]
    InvalidId(String),

    #[error("Store lock poisoned")]
    Lock,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Identifier assigned to a supplier when it is first stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SupplierId(Uuid);

impl SupplierId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for SupplierId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SupplierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored supplier with its assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSupplier {
    pub id: SupplierId,
    pub stored_at: DateTime<Utc>,
    pub record: CanonicalSupplierRecord,
}

/// Trait for supplier storage backends
///
/// Implementations must be thread-safe (Send + Sync) and must enforce
/// uniqueness of the identity key themselves: a second `insert` for the
/// same key fails with [`StorageError::Duplicate`], whatever the caller
/// checked beforehand.
pub trait SupplierStore: Send + Sync {
    /// Whether a supplier with this identity is already stored
    fn exists(&self, key: &IdentityKey) -> StorageResult<bool>;

    /// Store a new supplier
    fn insert(&self, record: &CanonicalSupplierRecord) -> StorageResult<SupplierId>;

    /// Load a supplier by id
    fn get(&self, id: &SupplierId) -> StorageResult<Option<StoredSupplier>>;

    fn count(&self) -> StorageResult<usize>;

    /// Stored suppliers, oldest first
    fn list(&self, limit: Option<usize>) -> StorageResult<Vec<StoredSupplier>>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: SupplierStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
