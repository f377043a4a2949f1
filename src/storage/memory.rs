//! In-memory storage backend

use super::traits::{
    OpenStore, StorageError, StorageResult, StoredSupplier, SupplierId, SupplierStore,
};
use crate::record::{CanonicalSupplierRecord, IdentityKey};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// DashMap-backed store for tests and dry runs.
///
/// The identity map's `entry` API makes check-and-insert atomic per key, so
/// concurrent inserts of the same identity yield exactly one success.
#[derive(Debug, Default)]
pub struct MemoryStore {
    by_identity: DashMap<IdentityKey, SupplierId>,
    by_id: DashMap<SupplierId, (u64, StoredSupplier)>,
    next_seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OpenStore for MemoryStore {
    /// Memory stores have no backing file; the path is ignored.
    fn open(_path: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self::new())
    }

    fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::new())
    }
}

impl SupplierStore for MemoryStore {
    fn exists(&self, key: &IdentityKey) -> StorageResult<bool> {
        Ok(self.by_identity.contains_key(key))
    }

    fn insert(&self, record: &CanonicalSupplierRecord) -> StorageResult<SupplierId> {
        let key = IdentityKey::for_record(record);
        match self.by_identity.entry(key) {
            Entry::Occupied(occupied) => Err(StorageError::Duplicate(occupied.key().to_string())),
            Entry::Vacant(vacant) => {
                let id = SupplierId::new();
                let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
                self.by_id.insert(
                    id,
                    (
                        seq,
                        StoredSupplier {
                            id,
                            stored_at: Utc::now(),
                            record: record.clone(),
                        },
                    ),
                );
                vacant.insert(id);
                Ok(id)
            }
        }
    }

    fn get(&self, id: &SupplierId) -> StorageResult<Option<StoredSupplier>> {
        Ok(self.by_id.get(id).map(|entry| entry.value().1.clone()))
    }

    fn count(&self) -> StorageResult<usize> {
        Ok(self.by_identity.len())
    }

    fn list(&self, limit: Option<usize>) -> StorageResult<Vec<StoredSupplier>> {
        let mut all: Vec<(u64, StoredSupplier)> =
            self.by_id.iter().map(|entry| entry.value().clone()).collect();
        all.sort_by_key(|(seq, _)| *seq);
        Ok(all
            .into_iter()
            .map(|(_, supplier)| supplier)
            .take(limit.unwrap_or(usize::MAX))
            .collect())
    }
}
