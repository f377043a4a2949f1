//! SourceAdapter trait: the contract every external source implements
//!
//! An adapter knows one source's access path and page structure. Given the
//! shared rate guard it produces raw, source-tagged records or reports a
//! source-level failure.

use super::error::AdapterError;
use crate::guard::RateGuard;
use crate::record::RawRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad category of an external source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    AssociationDirectory,
    ExhibitionDirectory,
    B2bPlatform,
    EnterpriseApi,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssociationDirectory => "association_directory",
            Self::ExhibitionDirectory => "exhibition_directory",
            Self::B2bPlatform => "b2b_platform",
            Self::EnterpriseApi => "enterprise_api",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog entry describing a registered source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub id: String,
    pub kind: SourceKind,
    pub display_name: String,
    pub description: String,
}

/// The contract source adapters implement.
///
/// Rules every implementation follows:
/// - admit every outbound request through the guard first; a policy denial
///   aborts the whole source
/// - catch per-page parse errors, skip the page and carry on
/// - zero records is `Ok(vec![])`, never an error
/// - return `Err` only for connectivity, auth or policy failures
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Unique identifier, also the key in per-source accounting
    fn id(&self) -> &str;

    fn kind(&self) -> SourceKind;

    fn describe(&self) -> SourceDescriptor {
        SourceDescriptor {
            id: self.id().to_string(),
            kind: self.kind(),
            display_name: self.id().to_string(),
            description: String::new(),
        }
    }

    /// Fetch everything this source currently offers.
    async fn fetch(&self, guard: &RateGuard) -> Result<Vec<RawRecord>, AdapterError>;
}
