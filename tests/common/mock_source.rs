//! Scripted source adapters

use async_trait::async_trait;
use chrono::Utc;
use semisupply::{AdapterError, RateGuard, RawRecord, SourceAdapter, SourceKind};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// What a [`MockSource`] does when fetched.
#[derive(Debug, Clone)]
pub enum SourceScript {
    /// Return these records
    Records(Vec<Value>),
    /// Fail as an unreachable source
    Unavailable,
    /// Sleep, then return nothing
    Stall(Duration),
}

/// Adapter that follows a script and counts its invocations.
pub struct MockSource {
    id: String,
    script: SourceScript,
    calls: AtomicUsize,
}

impl MockSource {
    pub fn new(id: &str, script: SourceScript) -> Self {
        Self {
            id: id.to_string(),
            script,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceAdapter for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> SourceKind {
        SourceKind::AssociationDirectory
    }

    async fn fetch(&self, _guard: &RateGuard) -> Result<Vec<RawRecord>, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            SourceScript::Records(values) => {
                Ok(values.iter().map(|v| raw(&self.id, v.clone())).collect())
            }
            SourceScript::Unavailable => {
                Err(AdapterError::Unavailable(format!("{} is down", self.id)))
            }
            SourceScript::Stall(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(Vec::new())
            }
        }
    }
}

/// Raw record from a JSON object literal.
pub fn raw(source_id: &str, value: Value) -> RawRecord {
    RawRecord::from_json(source_id, Utc::now(), value).expect("test record must be a JSON object")
}
