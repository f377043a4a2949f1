//! Keyword search against a B2B platform's JSON endpoint

use super::error::AdapterError;
use super::http::{Page, PageClient};
use super::json::parse_records;
use super::traits::{SourceAdapter, SourceDescriptor, SourceKind};
use crate::config::{ConfigError, KeywordSearchSource};
use crate::guard::RateGuard;
use crate::record::RawRecord;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::form_urlencoded;

/// Key under which the matching keyword is kept in `RawFields::extra`.
pub const SEARCH_KEYWORD: &str = "search_keyword";

const PLACEHOLDER: &str = "{keyword}";

/// Runs one search per configured keyword.
///
/// Only endpoints reachable without scraping around access controls are
/// used: a source without a `search_url` has no compliant access path and
/// produces nothing.
#[derive(Debug, Clone)]
pub struct KeywordSearchAdapter {
    source: KeywordSearchSource,
    client: PageClient,
}

impl KeywordSearchAdapter {
    pub fn new(source: KeywordSearchSource, client: PageClient) -> Result<Self, ConfigError> {
        if let Some(template) = &source.search_url {
            if !template.contains(PLACEHOLDER) {
                return Err(ConfigError::Invalid(format!(
                    "source '{}': search_url must contain {}",
                    source.id, PLACEHOLDER
                )));
            }
        }
        Ok(Self { source, client })
    }

    fn search_url(template: &str, keyword: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(keyword.as_bytes()).collect();
        template.replace(PLACEHOLDER, &encoded)
    }

    fn headers(&self) -> Vec<(String, String)> {
        self.source
            .api_key
            .iter()
            .map(|key| (self.source.api_key_header.clone(), key.clone()))
            .collect()
    }
}

#[async_trait]
impl SourceAdapter for KeywordSearchAdapter {
    fn id(&self) -> &str {
        &self.source.id
    }

    fn kind(&self) -> SourceKind {
        SourceKind::B2bPlatform
    }

    fn describe(&self) -> SourceDescriptor {
        SourceDescriptor {
            id: self.source.id.clone(),
            kind: self.kind(),
            display_name: self
                .source
                .display_name
                .clone()
                .unwrap_or_else(|| self.source.id.clone()),
            description: match self.source.search_url {
                Some(_) => format!("keyword search ({} keywords)", self.source.keywords.len()),
                None => "keyword search (no access path configured)".to_string(),
            },
        }
    }

    async fn fetch(&self, guard: &RateGuard) -> Result<Vec<RawRecord>, AdapterError> {
        let Some(template) = &self.source.search_url else {
            info!(source = %self.source.id, "no search endpoint configured, nothing to collect");
            return Ok(Vec::new());
        };

        let headers = self.headers();
        let mut records = Vec::new();
        for keyword in &self.source.keywords {
            let url = Self::search_url(template, keyword);
            let body = match self.client.get(guard, &url, &headers).await? {
                Page::Body(body) => body,
                Page::Missing(status) => {
                    warn!(source = %self.source.id, %keyword, status, "search endpoint not found");
                    continue;
                }
            };

            let parsed = parse_records(
                &body,
                self.source.records_field.as_deref(),
                &self.source.id,
                Utc::now(),
            );
            match parsed {
                Ok(found) => {
                    debug!(
                        source = %self.source.id,
                        %keyword,
                        count = found.len(),
                        "search results"
                    );
                    records.extend(found.into_iter().map(|r| tag_keyword(r, keyword)));
                }
                Err(e) => {
                    warn!(
                        source = %self.source.id,
                        %keyword,
                        error = %e,
                        "skipping unparsable search results"
                    );
                }
            }
        }
        Ok(records)
    }
}

fn tag_keyword(record: RawRecord, keyword: &str) -> RawRecord {
    let mut fields = record.fields().clone();
    fields
        .extra
        .insert(SEARCH_KEYWORD.to_string(), Value::String(keyword.to_string()));
    RawRecord::new(record.source_id(), record.collected_at(), fields)
}
