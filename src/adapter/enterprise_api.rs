//! Third-party enterprise-information API (paid, token authenticated)

use super::error::AdapterError;
use super::http::{Page, PageClient};
use super::json::parse_records;
use super::traits::{SourceAdapter, SourceDescriptor, SourceKind};
use crate::config::{ConfigError, EnterpriseApiSource};
use crate::guard::RateGuard;
use crate::record::RawRecord;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone)]
pub struct EnterpriseApiAdapter {
    source: EnterpriseApiSource,
    client: PageClient,
}

impl EnterpriseApiAdapter {
    pub fn new(source: EnterpriseApiSource, client: PageClient) -> Result<Self, ConfigError> {
        Url::parse(&source.base_url).map_err(|e| {
            ConfigError::Invalid(format!("source '{}': base_url: {}", source.id, e))
        })?;
        Ok(Self { source, client })
    }

    fn query_url(&self, keyword: &str, page: u32) -> Result<String, AdapterError> {
        let mut url = Url::parse(&self.source.base_url)
            .map_err(|e| AdapterError::Internal(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("keyword", keyword)
            .append_pair("page", &page.to_string());
        Ok(url.to_string())
    }
}

#[async_trait]
impl SourceAdapter for EnterpriseApiAdapter {
    fn id(&self) -> &str {
        &self.source.id
    }

    fn kind(&self) -> SourceKind {
        SourceKind::EnterpriseApi
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
            description: format!(
                "enterprise information API, up to {} pages per keyword",
                self.source.max_pages
            ),
        }
    }

    /// Query every keyword, page by page, until an empty page or `max_pages`.
    async fn fetch(&self, guard: &RateGuard) -> Result<Vec<RawRecord>, AdapterError> {
        let Some(token) = self.source.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
            return Err(AdapterError::Unauthorized(format!(
                "source '{}' has no API key configured",
                self.source.id
            )));
        };
        let headers = vec![("Authorization".to_string(), format!("Bearer {}", token))];

        let mut records = Vec::new();
        for keyword in &self.source.keywords {
            for page in 1..=self.source.max_pages.max(1) {
                let url = self.query_url(keyword, page)?;
                let body = match self.client.get(guard, &url, &headers).await? {
                    Page::Body(body) => body,
                    Page::Missing(status) => {
                        warn!(source = %self.source.id, %keyword, page, status, "page not found");
                        break;
                    }
                };

                let parsed = parse_records(
                    &body,
                    self.source.records_field.as_deref(),
                    &self.source.id,
                    Utc::now(),
                );
                match parsed {
                    Ok(found) if found.is_empty() => break,
                    Ok(found) => {
                        debug!(
                            source = %self.source.id,
                            %keyword,
                            page,
                            count = found.len(),
                            "api page"
                        );
                        records.extend(found);
                    }
                    Err(e) => {
                        warn!(
                            source = %self.source.id,
                            %keyword,
                            page,
                            error = %e,
                            "skipping unparsable page"
                        );
                    }
                }
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::http::{FetchError, HttpFetcher, HttpResponse};
    use crate::config::CrawlerConfig;
    use std::sync::{Arc, Mutex};

    /// Serves two pages of results per keyword, then an empty list.
    #[derive(Default)]
    struct TwoPages {
        seen: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    #[async_trait]
    impl HttpFetcher for TwoPages {
        async fn get(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> Result<HttpResponse, FetchError> {
            self.seen.lock().unwrap().push((url.to_string(), headers.to_vec()));
            let body = if url.ends_with("page=1") || url.ends_with("page=2") {
                r#"{"data": [{"company_name": "Hefei Crystal", "established_year": 2009}]}"#
            } else {
                r#"{"data": []}"#
            };
            Ok(HttpResponse::ok(body))
        }
    }

    fn adapter(
        api_key: Option<&str>,
        max_pages: u32,
        fetcher: Arc<TwoPages>,
    ) -> EnterpriseApiAdapter {
        let source = EnterpriseApiSource {
            id: "qcc".to_string(),
            display_name: Some("Enterprise registry".to_string()),
            base_url: "https://api.example.com/v1/search".to_string(),
            api_key: api_key.map(str::to_string),
            keywords: vec!["wafer".to_string()],
            max_pages,
            records_field: None,
        };
        let client = PageClient::new(CrawlerConfig::default().without_delay(), fetcher);
        EnterpriseApiAdapter::new(source, client).unwrap()
    }

    fn guard() -> RateGuard {
        RateGuard::new(&CrawlerConfig::default().without_delay())
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let fetcher = Arc::new(TwoPages::default());
        let err = adapter(None, 3, fetcher.clone()).fetch(&guard()).await.unwrap_err();
        assert!(matches!(err, AdapterError::Unauthorized(_)));
        assert!(fetcher.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn pages_until_empty_with_bearer_token() {
        let fetcher = Arc::new(TwoPages::default());
        let records = adapter(Some("tok"), 10, fetcher.clone()).fetch(&guard()).await.unwrap();
        assert_eq!(records.len(), 2);

        let seen = fetcher.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].0, "https://api.example.com/v1/search?keyword=wafer&page=1");
        assert!(seen[0].1.contains(&("Authorization".to_string(), "Bearer tok".to_string())));
    }

    #[tokio::test]
    async fn stops_at_max_pages() {
        let fetcher = Arc::new(TwoPages::default());
        let records = adapter(Some("tok"), 1, fetcher.clone()).fetch(&guard()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(fetcher.seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let source = EnterpriseApiSource {
            id: "qcc".to_string(),
            display_name: None,
            base_url: "not a url".to_string(),
            api_key: None,
            keywords: vec![],
            max_pages: 1,
            records_field: None,
        };
        let client = PageClient::new(CrawlerConfig::default(), Arc::new(TwoPages::default()));
        assert!(matches!(
            EnterpriseApiAdapter::new(source, client),
            Err(ConfigError::Invalid(_))
        ));
    }
}
