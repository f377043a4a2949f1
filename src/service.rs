//! Collection service: the trigger surface and manual ingestion
//!
//! `start_collection` runs the whole pipeline (fetch, normalize, relevance,
//! deduplicating persist) in the background and returns at once. Run state
//! lives in memory only and is lost on restart.

use crate::adapter::{build_adapters, HttpFetcher, SourceAdapter, SourceDescriptor};
use crate::config::{CollectionConfig, ConfigError};
use crate::guard::RateGuard;
use crate::normalize::Normalizer;
use crate::orchestrator::{CollectionResult, FetchOrchestrator};
use crate::persist::{DeduplicatingPersister, SaveOutcome};
use crate::record::RawRecord;
use crate::relevance::RelevanceValidator;
use crate::storage::{StorageResult, SupplierId, SupplierStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Identifier of one collection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reply to [`CollectionService::start_collection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAck {
    Started { run_id: RunId },
    /// A run was already in progress; nothing new was started
    AlreadyRunning { run_id: RunId },
}

impl StartAck {
    pub fn run_id(&self) -> RunId {
        match self {
            Self::Started { run_id } | Self::AlreadyRunning { run_id } => *run_id,
        }
    }
}

/// How much of a completed run's source set succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    NoSourcesAttempted,
    /// At least one source failed
    Partial,
    Full,
}

/// Everything a finished run did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub fetch: CollectionResult,
    /// Raw records run through the normalizer
    pub normalized: usize,
    /// Dropped for lacking a company name
    pub rejected: usize,
    pub irrelevant: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub storage_errors: usize,
}

impl RunReport {
    pub fn completion(&self) -> Completion {
        if self.fetch.per_source.is_empty() {
            Completion::NoSourcesAttempted
        } else if self.fetch.is_partial() {
            Completion::Partial
        } else {
            Completion::Full
        }
    }
}

/// Process-local state of the collection trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    Idle,
    Running {
        run_id: RunId,
        started_at: DateTime<Utc>,
    },
    Completed(RunReport),
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

/// Why a record was not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    MissingCompanyName,
    NotRelevant,
}

/// Result of pushing one raw record through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Inserted(SupplierId),
    /// Identity already stored
    Skipped,
    Invalid(InvalidReason),
}

#[derive(Debug, Default)]
struct Tally {
    normalized: usize,
    rejected: usize,
    irrelevant: usize,
    inserted: usize,
    duplicates: usize,
    storage_errors: usize,
}

struct Pipeline {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    orchestrator: FetchOrchestrator,
    normalizer: Normalizer,
    validator: RelevanceValidator,
    persister: DeduplicatingPersister,
    state: watch::Sender<RunState>,
}

impl Pipeline {
    fn ingest(&self, raw: &RawRecord) -> StorageResult<IngestOutcome> {
        let record = self.normalizer.clean(raw);
        if !record.has_company_name() {
            return Ok(IngestOutcome::Invalid(InvalidReason::MissingCompanyName));
        }
        if !self.validator.is_relevant(&record) {
            debug!(company = %record.company_name, "not relevant");
            return Ok(IngestOutcome::Invalid(InvalidReason::NotRelevant));
        }
        Ok(match self.persister.save_if_new(&record)? {
            SaveOutcome::Inserted(id) => IngestOutcome::Inserted(id),
            SaveOutcome::Duplicate => IngestOutcome::Skipped,
        })
    }

    fn ingest_all(&self, records: &[RawRecord]) -> Tally {
        let mut tally = Tally::default();
        for raw in records {
            tally.normalized += 1;
            let outcome = match panic::catch_unwind(AssertUnwindSafe(|| self.ingest(raw))) {
                Ok(outcome) => outcome,
                Err(_) => {
                    error!(source = raw.source_id(), "record processing panicked");
                    tally.storage_errors += 1;
                    continue;
                }
            };
            match outcome {
                Ok(IngestOutcome::Inserted(_)) => tally.inserted += 1,
                Ok(IngestOutcome::Skipped) => tally.duplicates += 1,
                Ok(IngestOutcome::Invalid(InvalidReason::MissingCompanyName)) => {
                    warn!(source = raw.source_id(), "record without company name rejected");
                    tally.rejected += 1;
                }
                Ok(IngestOutcome::Invalid(InvalidReason::NotRelevant)) => tally.irrelevant += 1,
                Err(e) => {
                    warn!(source = raw.source_id(), error = %e, "failed to store record");
                    tally.storage_errors += 1;
                }
            }
        }
        tally
    }

    async fn run(self: Arc<Self>, run_id: RunId, started_at: DateTime<Utc>) -> RunReport {
        info!(%run_id, sources = self.adapters.len(), "collection started");
        let fetched = self.orchestrator.run_all(&self.adapters).await;

        let records = fetched.records;
        let pipeline = Arc::clone(&self);
        let tally = match tokio::task::spawn_blocking(move || pipeline.ingest_all(&records)).await {
            Ok(tally) => tally,
            Err(e) => {
                error!(%run_id, error = %e, "record processing aborted");
                Tally::default()
            }
        };

        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            fetch: fetched.result,
            normalized: tally.normalized,
            rejected: tally.rejected,
            irrelevant: tally.irrelevant,
            inserted: tally.inserted,
            duplicates: tally.duplicates,
            storage_errors: tally.storage_errors,
        };
        info!(
            %run_id,
            collected = report.fetch.total_collected,
            failed_sources = report.fetch.total_failed,
            inserted = report.inserted,
            duplicates = report.duplicates,
            rejected = report.rejected,
            irrelevant = report.irrelevant,
            storage_errors = report.storage_errors,
            "collection finished"
        );
        report
    }
}

/// Entry point for triggering collection runs and ingesting single records.
#[derive(Clone)]
pub struct CollectionService {
    pipeline: Arc<Pipeline>,
}

impl CollectionService {
    /// Service over `adapters` with a default guard, normalizer and
    /// keyword set. Adapter ids must be unique.
    pub fn new(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        store: Arc<dyn SupplierStore>,
    ) -> Result<Self, ConfigError> {
        let guard = Arc::new(RateGuard::new(&Default::default()));
        Self::with_parts(
            adapters,
            FetchOrchestrator::new(guard),
            RelevanceValidator::new(),
            store,
        )
    }

    pub fn with_parts(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        orchestrator: FetchOrchestrator,
        validator: RelevanceValidator,
        store: Arc<dyn SupplierStore>,
    ) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for adapter in &adapters {
            if !seen.insert(adapter.id()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate source id '{}'",
                    adapter.id()
                )));
            }
        }
        let (state, _) = watch::channel(RunState::Idle);
        Ok(Self {
            pipeline: Arc::new(Pipeline {
                adapters,
                orchestrator,
                normalizer: Normalizer::new(),
                validator,
                persister: DeduplicatingPersister::new(store),
                state,
            }),
        })
    }

    /// Build adapters, guard, orchestrator and validator from configuration.
    pub fn from_config(
        config: &CollectionConfig,
        fetcher: Arc<dyn HttpFetcher>,
        store: Arc<dyn SupplierStore>,
    ) -> Result<Self, ConfigError> {
        let adapters = build_adapters(config, fetcher)?;
        let guard = Arc::new(RateGuard::new(&config.crawler));
        let orchestrator =
            FetchOrchestrator::new(guard).with_timeout(config.orchestrator.adapter_timeout());
        let validator = match &config.relevance.keywords {
            Some(keywords) => RelevanceValidator::with_keywords(keywords.iter().cloned()),
            None => RelevanceValidator::new(),
        };
        Self::with_parts(adapters, orchestrator, validator, store)
    }

    /// Start a run in the background and return immediately.
    ///
    /// Must be called within a tokio runtime. At most one run is in flight;
    /// a second call while one runs reports the running one.
    pub fn start_collection(&self) -> StartAck {
        let run_id = RunId::new();
        let started_at = Utc::now();
        let mut running = None;

        let started = self.pipeline.state.send_if_modified(|state| match state {
            RunState::Running { run_id, .. } => {
                running = Some(*run_id);
                false
            }
            _ => {
                *state = RunState::Running { run_id, started_at };
                true
            }
        });
        if !started {
            let run_id = running.unwrap_or(run_id);
            debug!(%run_id, "collection already running");
            return StartAck::AlreadyRunning { run_id };
        }

        let pipeline = Arc::clone(&self.pipeline);
        tokio::spawn(async move {
            let report = Arc::clone(&pipeline).run(run_id, started_at).await;
            pipeline.state.send_replace(RunState::Completed(report));
        });
        StartAck::Started { run_id }
    }

    /// Current run state.
    pub fn status(&self) -> RunState {
        self.pipeline.state.borrow().clone()
    }

    /// Wait until no run is in flight and return the resulting state.
    pub async fn wait_idle(&self) -> RunState {
        let mut rx = self.pipeline.state.subscribe();
        let state = match rx.wait_for(|state| !state.is_running()).await {
            Ok(state) => state.clone(),
            // The sender lives in `self`, so the channel cannot close here
            Err(_) => self.status(),
        };
        state
    }

    /// Run one record through normalize, relevance and deduplicating
    /// persist, synchronously.
    pub fn ingest_manual(&self, raw: RawRecord) -> StorageResult<IngestOutcome> {
        let outcome = self.pipeline.ingest(&raw)?;
        info!(source = raw.source_id(), ?outcome, "manual ingestion");
        Ok(outcome)
    }

    /// Catalog of registered sources.
    pub fn sources(&self) -> Vec<SourceDescriptor> {
        self.pipeline.adapters.iter().map(|a| a.describe()).collect()
    }

    pub fn store(&self) -> &Arc<dyn SupplierStore> {
        self.pipeline.persister.store()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{AdapterError, SourceKind};
    use crate::record::RawFields;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::Notify;

    struct Gated {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl SourceAdapter for Gated {
        fn id(&self) -> &str {
            "gated"
        }

        fn kind(&self) -> SourceKind {
            SourceKind::ExhibitionDirectory
        }

        async fn fetch(&self, _guard: &RateGuard) -> Result<Vec<RawRecord>, AdapterError> {
            self.gate.notified().await;
            let raw = |name: &str, products: &str| {
                RawRecord::new(
                    "gated",
                    Utc::now(),
                    RawFields {
                        company_name: Some(name.to_string()),
                        country: Some("china".to_string()),
                        main_products: Some(json!(products)),
                        ..Default::default()
                    },
                )
            };
            Ok(vec![
                raw("Wuxi Wafer Co", "wafer"),
                raw("WUXI  wafer co", "wafer"),
                raw("Garden Furniture Ltd", "chairs"),
                raw("", "chip"),
            ])
        }
    }

    fn manual(value: serde_json::Value) -> RawRecord {
        RawRecord::from_json("manual", Utc::now(), value).unwrap()
    }

    #[tokio::test]
    async fn run_lifecycle_and_report() {
        let gate = Arc::new(Notify::new());
        let service = CollectionService::new(
            vec![Arc::new(Gated { gate: gate.clone() })],
            Arc::new(MemoryStore::new()),
        )
        .unwrap();
        assert_eq!(service.status(), RunState::Idle);

        let ack = service.start_collection();
        assert!(matches!(ack, StartAck::Started { .. }));
        assert!(service.status().is_running());
        assert_eq!(
            service.start_collection(),
            StartAck::AlreadyRunning { run_id: ack.run_id() }
        );

        gate.notify_one();
        let RunState::Completed(report) = service.wait_idle().await else {
            panic!("run did not complete");
        };
        assert_eq!(report.run_id, ack.run_id());
        assert_eq!(report.fetch.total_collected, 4);
        assert_eq!(report.normalized, 4);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.irrelevant, 1);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.completion(), Completion::Full);
        assert_eq!(service.store().count().unwrap(), 1);
    }

    #[tokio::test]
    async fn run_without_sources() {
        let service = CollectionService::new(Vec::new(), Arc::new(MemoryStore::new())).unwrap();
        service.start_collection();
        let state = tokio::time::timeout(Duration::from_secs(5), service.wait_idle())
            .await
            .unwrap();
        match state {
            RunState::Completed(report) => {
                assert_eq!(report.completion(), Completion::NoSourcesAttempted)
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn manual_ingestion_outcomes() {
        let service = CollectionService::new(Vec::new(), Arc::new(MemoryStore::new())).unwrap();

        let first = service
            .ingest_manual(manual(json!({"company_name": "Foo Semi Co", "main_products": "chips"})))
            .unwrap();
        assert!(matches!(first, IngestOutcome::Inserted(_)));

        assert_eq!(
            service
                .ingest_manual(manual(json!({
                    "company_name": "foo semi co",
                    "main_products": "chips"
                })))
                .unwrap(),
            IngestOutcome::Skipped
        );
        assert_eq!(
            service.ingest_manual(manual(json!({"company_name": "  "}))).unwrap(),
            IngestOutcome::Invalid(InvalidReason::MissingCompanyName)
        );
        assert_eq!(
            service
                .ingest_manual(manual(json!({
                    "company_name": "Bakery Inc",
                    "main_products": "bread"
                })))
                .unwrap(),
            IngestOutcome::Invalid(InvalidReason::NotRelevant)
        );
    }

    #[test]
    fn catalog_lists_registered_sources() {
        let service = CollectionService::new(
            vec![Arc::new(Gated { gate: Arc::new(Notify::new()) })],
            Arc::new(MemoryStore::new()),
        )
        .unwrap();
        let sources = service.sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].id, "gated");
        assert_eq!(sources[0].kind, SourceKind::ExhibitionDirectory);
    }
}
