//! Deduplicating persister

use crate::record::{CanonicalSupplierRecord, IdentityKey};
use crate::storage::{StorageError, StorageResult, SupplierId, SupplierStore};
use std::sync::Arc;
use tracing::debug;

/// Result of [`DeduplicatingPersister::save_if_new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted(SupplierId),
    /// A supplier with the same identity key is already stored
    Duplicate,
}

impl SaveOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// Stores a record only when its identity key is not stored yet.
///
/// `exists` is a fast path; the store's uniqueness constraint is what makes
/// the check-then-insert safe when two writers race on one key.
#[derive(Clone)]
pub struct DeduplicatingPersister {
    store: Arc<dyn SupplierStore>,
}

impl DeduplicatingPersister {
    pub fn new(store: Arc<dyn SupplierStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SupplierStore> {
        &self.store
    }

    /// Insert `record` unless its identity is already present.
    ///
    /// Store failures other than the uniqueness violation are returned to
    /// the caller.
    pub fn save_if_new(&self, record: &CanonicalSupplierRecord) -> StorageResult<SaveOutcome> {
        let key = IdentityKey::for_record(record);
        if self.store.exists(&key)? {
            debug!(identity = %key, "duplicate supplier skipped");
            return Ok(SaveOutcome::Duplicate);
        }

        match self.store.insert(record) {
            Ok(id) => {
                debug!(identity = %key, %id, "supplier stored");
                Ok(SaveOutcome::Inserted(id))
            }
            Err(StorageError::Duplicate(_)) => {
                debug!(identity = %key, "duplicate supplier lost insert race");
                Ok(SaveOutcome::Duplicate)
            }
            Err(e) => Err(e),
        }
    }
}
