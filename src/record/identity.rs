//! Identity keys used for supplier deduplication

use super::canonical::CanonicalSupplierRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the name and country parts in the storage form.
/// A unit separator cannot appear in cleaned text.
const KEY_SEPARATOR: char = '\u{1f}';

/// `(normalized company name, normalized country)`.
///
/// Both parts are lower-cased, trimmed and whitespace-collapsed, so
/// `" Foo  Semi "` and `"foo semi"` produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityKey {
    name: String,
    country: String,
}

impl IdentityKey {
    pub fn new(name: &str, country: &str) -> Self {
        Self {
            name: fold(name),
            country: fold(country),
        }
    }

    pub fn for_record(record: &CanonicalSupplierRecord) -> Self {
        Self::new(&record.company_name, &record.country)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    /// Single-string form stored in a uniquely indexed column.
    pub fn storage_key(&self) -> String {
        format!("{}{}{}", self.name, KEY_SEPARATOR, self.country)
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.country)
    }
}

fn fold(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
