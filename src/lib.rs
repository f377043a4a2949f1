//! semisupply: concurrent ingestion of semiconductor supplier directories
//!
//! Collects supplier records from industry-association member lists,
//! trade-show exhibitor lists, B2B keyword search and enterprise-information
//! APIs, then normalizes, filters and stores them without duplicates.
//!
//! # Pipeline
//!
//! - **Guard**: per-host connection caps, randomized delays, access policy
//! - **Adapters**: one per source, producing source-tagged raw records
//! - **Orchestrator**: runs adapters concurrently, isolating failures
//! - **Normalizer**: field cleaning into the canonical schema, with warnings
//! - **Relevance**: keyword filter for semiconductor-domain suppliers
//! - **Persister**: insert-if-absent keyed on normalized name and country
//!
//! # Example
//!
//! ```
//! use semisupply::{Normalizer, RawRecord};
//! use serde_json::json;
//!
//! let raw = RawRecord::from_json(
//!     "manual",
//!     chrono::Utc::now(),
//!     json!({"company_name": " Foo Semi Co ", "country": "usa"}),
//! )
//! .unwrap();
//! let record = Normalizer::new().clean(&raw);
//! assert_eq!(record.company_name, "Foo Semi Co");
//! assert_eq!(record.country, "美国");
//! ```

pub mod adapter;
pub mod config;
pub mod guard;
pub mod normalize;
pub mod orchestrator;
pub mod persist;
pub mod record;
pub mod relevance;
pub mod service;
pub mod storage;

pub use adapter::{
    build_adapters, AdapterError, HttpFetcher, PageClient, ParseError, ReqwestFetcher,
    SourceAdapter, SourceDescriptor, SourceKind,
};
pub use config::{CollectionConfig, ConfigError, CrawlerConfig};
pub use guard::{GuardError, RateGuard};
pub use normalize::Normalizer;
pub use orchestrator::{
    CollectionResult, FetchOrchestrator, FetchOutcome, SourceReport, SourceStatus,
};
pub use persist::{DeduplicatingPersister, SaveOutcome};
pub use record::{
    CanonicalSupplierRecord, CertificationLevel, IdentityKey, RawFields, RawRecord, SupplierScale,
    SupplierType, ValidationWarning,
};
pub use relevance::RelevanceValidator;
pub use service::{
    CollectionService, Completion, IngestOutcome, InvalidReason, RunId, RunReport, RunState,
    StartAck,
};
pub use storage::{
    MemoryStore, OpenStore, SqliteStore, StorageError, StorageResult, StoredSupplier, SupplierId,
    SupplierStore,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
