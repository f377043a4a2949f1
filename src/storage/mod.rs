//! Storage backends for supplier records
//!
//! All backends implement `SupplierStore`. `SqliteStore` is the persistent
//! implementation; `MemoryStore` backs tests and dry runs.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{OpenStore, StorageError, StorageResult, StoredSupplier, SupplierId, SupplierStore};
