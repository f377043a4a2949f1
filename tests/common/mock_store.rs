//! Store wrapper that panics on selected inserts

use semisupply::{
    CanonicalSupplierRecord, IdentityKey, MemoryStore, StorageResult, StoredSupplier, SupplierId,
    SupplierStore,
};

/// Delegates to a [`MemoryStore`] but panics when asked to insert a
/// supplier whose name contains `trigger`.
pub struct PanickingStore {
    inner: MemoryStore,
    trigger: String,
}

impl PanickingStore {
    pub fn new(trigger: &str) -> Self {
        Self {
            inner: MemoryStore::new(),
            trigger: trigger.to_string(),
        }
    }
}

impl SupplierStore for PanickingStore {
    fn exists(&self, key: &IdentityKey) -> StorageResult<bool> {
        self.inner.exists(key)
    }

    fn insert(&self, record: &CanonicalSupplierRecord) -> StorageResult<SupplierId> {
        if record.company_name.contains(&self.trigger) {
            panic!("store blew up on {}", record.company_name);
        }
        self.inner.insert(record)
    }

    fn get(&self, id: &SupplierId) -> StorageResult<Option<StoredSupplier>> {
        self.inner.get(id)
    }

    fn count(&self) -> StorageResult<usize> {
        self.inner.count()
    }

    fn list(&self, limit: Option<usize>) -> StorageResult<Vec<StoredSupplier>> {
        self.inner.list(limit)
    }
}
