//! Trade-show exhibitor lists (SEMICON and similar)

use super::directory::{compile, crawl_listing, first_text, Listing};
use super::error::{AdapterError, ParseError};
use super::http::PageClient;
use super::traits::{SourceAdapter, SourceDescriptor, SourceKind};
use crate::config::{ConfigError, ExhibitionSource, ExhibitorSelectors};
use crate::guard::RateGuard;
use crate::record::{RawFields, RawRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use serde_json::Value;

/// Key under which the booth number is kept in [`RawFields::extra`].
pub const BOOTH_NUMBER: &str = "booth_number";
/// Key under which the exhibition name is kept in [`RawFields::extra`].
pub const EXHIBITION: &str = "exhibition";

#[derive(Debug, Clone)]
struct CompiledSelectors {
    item: Selector,
    name: Selector,
    booth: Selector,
    country: Selector,
}

#[derive(Debug, Clone)]
pub struct ExhibitionDirectoryAdapter {
    source: ExhibitionSource,
    selectors: CompiledSelectors,
    client: PageClient,
}

impl ExhibitionDirectoryAdapter {
    pub fn new(source: ExhibitionSource, client: PageClient) -> Result<Self, ConfigError> {
        let ExhibitorSelectors {
            item,
            name,
            booth,
            country,
        } = &source.selectors;
        let selectors = CompiledSelectors {
            item: compile(&source.id, item)?,
            name: compile(&source.id, name)?,
            booth: compile(&source.id, booth)?,
            country: compile(&source.id, country)?,
        };
        Ok(Self {
            source,
            selectors,
            client,
        })
    }

    fn label(&self) -> &str {
        self.source.label.as_deref().unwrap_or(&self.source.id)
    }

    /// Parse one exhibitor list page.
    pub fn parse_page(
        &self,
        body: &str,
        page_url: &str,
        collected_at: DateTime<Utc>,
    ) -> Result<Vec<RawRecord>, ParseError> {
        if body.trim().is_empty() {
            return Err(ParseError::EmptyPage);
        }
        let s = &self.selectors;
        let document = Html::parse_document(body);

        let mut items = 0;
        let mut records = Vec::new();
        for item in document.select(&s.item) {
            items += 1;
            let Some(name) = first_text(item, &s.name) else {
                continue;
            };

            let mut fields = RawFields {
                company_name: Some(name),
                country: first_text(item, &s.country),
                source_url: Some(page_url.to_string()),
                ..Default::default()
            };
            if let Some(booth) = first_text(item, &s.booth) {
                fields.extra.insert(BOOTH_NUMBER.to_string(), Value::String(booth));
            }
            fields
                .extra
                .insert(EXHIBITION.to_string(), Value::String(self.label().to_string()));

            records.push(RawRecord::new(&self.source.id, collected_at, fields));
        }

        if items > 0 && records.is_empty() {
            return Err(ParseError::MissingField {
                selector: self.source.selectors.name.clone(),
                items,
            });
        }
        Ok(records)
    }
}

#[async_trait]
impl SourceAdapter for ExhibitionDirectoryAdapter {
    fn id(&self) -> &str {
        &self.source.id
    }

    fn kind(&self) -> SourceKind {
        SourceKind::ExhibitionDirectory
    }

    fn describe(&self) -> SourceDescriptor {
        SourceDescriptor {
            id: self.source.id.clone(),
            kind: self.kind(),
            display_name: self.label().to_string(),
            description: "exhibitor list".to_string(),
        }
    }

    async fn fetch(&self, guard: &RateGuard) -> Result<Vec<RawRecord>, AdapterError> {
        let listing = Listing {
            source_id: &self.source.id,
            urls: &self.source.urls,
            page_param: self.source.page_param.as_deref(),
            max_pages: self.source.max_pages,
        };
        crawl_listing(&self.client, guard, listing, |body, url, at| {
            self.parse_page(body, url, at)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::http::{FetchError, HttpFetcher, HttpResponse};
    use crate::config::CrawlerConfig;
    use std::sync::Arc;

    struct Unreachable;

    #[async_trait]
    impl HttpFetcher for Unreachable {
        async fn get(&self, url: &str, _: &[(String, String)]) -> Result<HttpResponse, FetchError> {
            Err(FetchError::Timeout(url.to_string()))
        }
    }

    fn adapter(label: Option<&str>) -> ExhibitionDirectoryAdapter {
        let source = ExhibitionSource {
            id: "semicon-china".to_string(),
            label: label.map(str::to_string),
            urls: vec!["https://expo.example.cn/exhibitors".to_string()],
            page_param: None,
            max_pages: 1,
            selectors: ExhibitorSelectors::default(),
        };
        let client =
            PageClient::new(CrawlerConfig::default().without_delay(), Arc::new(Unreachable));
        ExhibitionDirectoryAdapter::new(source, client).unwrap()
    }

    #[test]
    fn parses_exhibitors_with_booth_and_country() {
        let page = r#"
            <div class="exhibitor-item">
              <h4 class="exhibitor-name">Shanghai Micro Materials</h4>
              <span class="booth-number">N2-2101</span>
              <span class="exhibitor-country">China</span>
            </div>
            <div class="exhibitor-item">
              <h4 class="exhibitor-name">Lam Research</h4>
            </div>
        "#;
        let records = adapter(Some("SEMICON China 2024"))
            .parse_page(page, "https://expo.example.cn/exhibitors", Utc::now())
            .unwrap();
        assert_eq!(records.len(), 2);

        let first = records[0].fields();
        assert_eq!(first.company_name.as_deref(), Some("Shanghai Micro Materials"));
        assert_eq!(first.country.as_deref(), Some("China"));
        assert_eq!(first.extra[BOOTH_NUMBER], Value::String("N2-2101".into()));
        assert_eq!(first.extra[EXHIBITION], Value::String("SEMICON China 2024".into()));

        let second = records[1].fields();
        assert!(second.country.is_none());
        assert!(!second.extra.contains_key(BOOTH_NUMBER));
    }

    #[test]
    fn label_defaults_to_source_id() {
        let page = r#"<div class="exhibitor-item"><h4 class="exhibitor-name">X Corp</h4></div>"#;
        let records = adapter(None)
            .parse_page(page, "https://expo.example.cn/", Utc::now())
            .unwrap();
        assert_eq!(records[0].fields().extra[EXHIBITION], Value::String("semicon-china".into()));
    }

    #[test]
    fn blank_body_is_a_parse_error() {
        assert!(matches!(
            adapter(None).parse_page("  \n", "https://expo.example.cn/", Utc::now()),
            Err(ParseError::EmptyPage)
        ));
    }

    #[test]
    fn invalid_booth_selector_is_rejected_at_construction() {
        let source = ExhibitionSource {
            id: "semicon-china".to_string(),
            label: None,
            urls: vec!["https://expo.example.cn/exhibitors".to_string()],
            page_param: None,
            max_pages: 1,
            selectors: ExhibitorSelectors {
                booth: "span[[".to_string(),
                ..ExhibitorSelectors::default()
            },
        };
        let client =
            PageClient::new(CrawlerConfig::default().without_delay(), Arc::new(Unreachable));
        match ExhibitionDirectoryAdapter::new(source, client) {
            Err(ConfigError::Selector { source_id, selector, .. }) => {
                assert_eq!(source_id, "semicon-china");
                assert_eq!(selector, "span[[");
            }
            other => panic!("expected selector error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn one_adapter_parses_many_pages() {
        let adapter = adapter(None);
        for name in ["Alpha Semi", "Beta Semi", "Gamma Semi"] {
            let page = format!(
                r#"<div class="exhibitor-item"><h4 class="exhibitor-name">{name}</h4></div>"#
            );
            let records = adapter
                .parse_page(&page, "https://expo.example.cn/", Utc::now())
                .unwrap();
            assert_eq!(records[0].fields().company_name.as_deref(), Some(name));
        }
    }

    #[tokio::test]
    async fn timeout_fails_the_source() {
        let guard = RateGuard::new(&CrawlerConfig::default().without_delay());
        assert!(matches!(
            adapter(None).fetch(&guard).await,
            Err(AdapterError::Unavailable(_))
        ));
    }
}
