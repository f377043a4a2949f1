//! Raw supplier records as produced by source adapters
//!
//! A raw record is whatever a source handed us, tagged with where and when
//! it was collected. The known field set is typed loosely: text fields accept
//! strings or numbers, numeric and product fields keep their JSON value.
//! Nothing here is trusted; the normalizer validates every field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors building a raw record from untyped input.
#[derive(Debug, Error)]
pub enum RawRecordError {
    #[error("raw record must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("invalid raw record: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// The field set a source may populate.
///
/// Fields a source sends that are not listed here are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFields {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub company_name_en: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub supplier_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub company_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// Head count: number or numeric string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_count: Option<Value>,
    /// Annual revenue in the source's unit (10k USD for the directories we know)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_revenue: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub established_year: Option<Value>,
    /// List, JSON-encoded list, or comma-separated string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_products: Option<Value>,

    /// Source-specific fields with no canonical counterpart
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Accept strings, numbers and booleans as text; anything else is absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// An unvalidated supplier record tagged with its source.
///
/// Produced once by an adapter (or the manual ingestion path) and only read
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    source_id: String,
    collected_at: DateTime<Utc>,
    fields: RawFields,
}

impl RawRecord {
    pub fn new(
        source_id: impl Into<String>,
        collected_at: DateTime<Utc>,
        fields: RawFields,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            collected_at,
            fields,
        }
    }

    /// Build a record from a JSON object, e.g. an API response item or a
    /// manually submitted record.
    pub fn from_json(
        source_id: impl Into<String>,
        collected_at: DateTime<Utc>,
        value: Value,
    ) -> Result<Self, RawRecordError> {
        match &value {
            Value::Object(_) => {}
            Value::Array(_) => return Err(RawRecordError::NotAnObject("array")),
            Value::String(_) => return Err(RawRecordError::NotAnObject("string")),
            Value::Number(_) => return Err(RawRecordError::NotAnObject("number")),
            Value::Bool(_) => return Err(RawRecordError::NotAnObject("boolean")),
            Value::Null => return Err(RawRecordError::NotAnObject("null")),
        }
        let fields: RawFields = serde_json::from_value(value)?;
        Ok(Self::new(source_id, collected_at, fields))
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn collected_at(&self) -> DateTime<Utc> {
        self.collected_at
    }

    pub fn fields(&self) -> &RawFields {
        &self.fields
    }
}
