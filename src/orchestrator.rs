//! Fetch orchestrator: runs every adapter concurrently and keeps the books
//!
//! Each adapter runs in its own tokio task under a timeout. A failure, a
//! timeout or a panic is recorded against that source only; siblings always
//! run to completion. No normalization or persistence happens here.

use crate::adapter::{AdapterError, SourceAdapter};
use crate::guard::RateGuard;
use crate::record::RawRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default upper bound on one adapter's fetch.
pub const DEFAULT_ADAPTER_TIMEOUT: Duration = Duration::from_secs(30);

/// Terminal state of one source in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Succeeded,
    Failed,
    TimedOut,
}

/// Accounting for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    /// Raw records the source produced
    pub collected: usize,
    /// 1 if the source failed or timed out, else 0
    pub failed: usize,
    pub status: SourceStatus,
    pub error: Option<String>,
}

impl SourceReport {
    fn succeeded(collected: usize) -> Self {
        Self {
            collected,
            failed: 0,
            status: SourceStatus::Succeeded,
            error: None,
        }
    }

    fn failed(status: SourceStatus, error: String) -> Self {
        Self {
            collected: 0,
            failed: 1,
            status,
            error: Some(error),
        }
    }
}

/// Per-source accounting plus totals for one orchestrator invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionResult {
    pub per_source: BTreeMap<String, SourceReport>,
    pub total_collected: usize,
    pub total_failed: usize,
}

impl CollectionResult {
    fn record(&mut self, source_id: String, report: SourceReport) {
        self.total_collected += report.collected;
        self.total_failed += report.failed;
        self.per_source.insert(source_id, report);
    }

    /// Whether at least one source failed.
    pub fn is_partial(&self) -> bool {
        self.total_failed > 0
    }
}

/// Accounting together with the gathered raw records.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub result: CollectionResult,
    pub records: Vec<RawRecord>,
}

/// Runs a set of adapters against a shared guard.
#[derive(Debug, Clone)]
pub struct FetchOrchestrator {
    guard: Arc<RateGuard>,
    adapter_timeout: Duration,
}

impl FetchOrchestrator {
    pub fn new(guard: Arc<RateGuard>) -> Self {
        Self {
            guard,
            adapter_timeout: DEFAULT_ADAPTER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.adapter_timeout = timeout;
        self
    }

    /// Run every adapter concurrently and wait for all of them.
    ///
    /// Never fails: every adapter outcome, including a panic, ends up in the
    /// returned [`CollectionResult`].
    pub async fn run_all(&self, adapters: &[Arc<dyn SourceAdapter>]) -> FetchOutcome {
        let handles: Vec<_> = adapters
            .iter()
            .map(|adapter| {
                let adapter = Arc::clone(adapter);
                let guard = Arc::clone(&self.guard);
                let timeout = self.adapter_timeout;
                let id = adapter.id().to_string();
                let handle = tokio::spawn(async move {
                    match tokio::time::timeout(timeout, adapter.fetch(&guard)).await {
                        Ok(result) => result,
                        Err(_) => Err(AdapterError::Timeout(timeout)),
                    }
                });
                (id, handle)
            })
            .collect();

        let mut outcome = FetchOutcome::default();
        for (id, handle) in handles {
            let report = match handle.await {
                Ok(Ok(records)) => {
                    info!(source = %id, collected = records.len(), "source finished");
                    let report = SourceReport::succeeded(records.len());
                    outcome.records.extend(records);
                    report
                }
                Ok(Err(e)) => {
                    let status = match e {
                        AdapterError::Timeout(_) => SourceStatus::TimedOut,
                        _ => SourceStatus::Failed,
                    };
                    warn!(source = %id, error = %e, "source failed");
                    SourceReport::failed(status, e.to_string())
                }
                Err(join_error) => {
                    warn!(source = %id, error = %join_error, "source task aborted");
                    SourceReport::failed(
                        SourceStatus::Failed,
                        format!("adapter task aborted: {}", join_error),
                    )
                }
            };
            outcome.result.record(id, report);
        }

        info!(
            sources = outcome.result.per_source.len(),
            collected = outcome.result.total_collected,
            failed = outcome.result.total_failed,
            "fetch complete"
        );
        outcome
    }
}
