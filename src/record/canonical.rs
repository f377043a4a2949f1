//! Canonical supplier records and their classification enums

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of business the supplier runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplierType {
    Manufacturer,
    Distributor,
    Trader,
    ServiceProvider,
}

impl SupplierType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manufacturer => "manufacturer",
            Self::Distributor => "distributor",
            Self::Trader => "trader",
            Self::ServiceProvider => "service_provider",
        }
    }
}

impl fmt::Display for SupplierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Company size bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplierScale {
    Large,
    Medium,
    Small,
    Startup,
}

impl SupplierScale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Large => "large",
            Self::Medium => "medium",
            Self::Small => "small",
            Self::Startup => "startup",
        }
    }
}

impl fmt::Display for SupplierScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform certification tier. Collected records always start unverified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificationLevel {
    Premium,
    Verified,
    Basic,
    #[default]
    Unverified,
}

impl CertificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Premium => "premium",
            Self::Verified => "verified",
            Self::Basic => "basic",
            Self::Unverified => "unverified",
        }
    }
}

/// A non-fatal problem found while cleaning one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A validated, schema-conformant supplier.
///
/// Built by the normalizer from exactly one raw record. A corrected record
/// is a new value; nothing in the pipeline mutates one after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSupplierRecord {
    pub company_name: String,
    pub company_name_en: Option<String>,
    /// Canonical country name, empty when the source gave none
    pub country: String,
    pub province: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,

    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,

    pub supplier_type: SupplierType,
    pub scale: SupplierScale,
    pub certification_level: CertificationLevel,

    pub established_year: Option<i32>,
    pub employee_count: Option<u32>,
    /// In the source's revenue unit (10k USD)
    pub annual_revenue: Option<f64>,

    pub products: Vec<String>,
    pub description: Option<String>,

    pub source_id: String,
    pub source_url: Option<String>,
    pub collected_at: DateTime<Utc>,

    pub warnings: Vec<ValidationWarning>,
}

impl CanonicalSupplierRecord {
    /// The single rejection condition: no usable company name.
    pub fn has_company_name(&self) -> bool {
        !self.company_name.is_empty()
    }

    /// Warnings attached to a given field.
    pub fn warnings_for<'a>(
        &'a self,
        field: &'a str,
    ) -> impl Iterator<Item = &'a ValidationWarning> + 'a {
        self.warnings.iter().filter(move |w| w.field == field)
    }
}
