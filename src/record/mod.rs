//! Supplier record types
//!
//! Raw records come out of adapters, canonical records come out of the
//! normalizer, identity keys drive deduplication.

mod canonical;
mod identity;
mod raw;

pub use canonical::{
    CanonicalSupplierRecord, CertificationLevel, SupplierScale, SupplierType, ValidationWarning,
};
pub use identity::IdentityKey;
pub use raw::{RawFields, RawRecord, RawRecordError};
