//! Coarse domain-relevance filter
//!
//! Keeps off-domain noise out of the store. It is a keyword match over the
//! record's descriptive text, not a classifier: false negatives are expected.

use crate::record::CanonicalSupplierRecord;

/// Default keyword set, English and Chinese.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "semiconductor",
    "chip",
    "ic",
    "wafer",
    "pcb",
    "led",
    "sensor",
    "半导体",
    "芯片",
    "集成电路",
    "晶圆",
    "传感器",
    "电子",
    "电路板",
];

/// Accepts records whose name, English name, products or description
/// mention one of the configured keywords.
#[derive(Debug, Clone)]
pub struct RelevanceValidator {
    /// Lower-cased keywords
    keywords: Vec<String>,
}

impl Default for RelevanceValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl RelevanceValidator {
    pub fn new() -> Self {
        Self::with_keywords(DEFAULT_KEYWORDS.iter().copied())
    }

    /// Use a custom keyword set. Blank keywords are ignored.
    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_relevant(&self, record: &CanonicalSupplierRecord) -> bool {
        let mut text = String::with_capacity(128);
        text.push_str(&record.company_name);
        for part in [&record.company_name_en, &record.description].into_iter().flatten() {
            text.push(' ');
            text.push_str(part);
        }
        for product in &record.products {
            text.push(' ');
            text.push_str(product);
        }
        let text = text.to_lowercase();

        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}
