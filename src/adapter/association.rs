//! Industry-association member directories (SEMI, JEDEC, ...)

use super::directory::{compile, crawl_listing, first_attr, first_text, Listing};
use super::error::{AdapterError, ParseError};
use super::http::{resolve_link, PageClient};
use super::traits::{SourceAdapter, SourceDescriptor, SourceKind};
use crate::config::{AssociationSource, ConfigError, MemberSelectors};
use crate::guard::RateGuard;
use crate::record::{RawFields, RawRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};

#[derive(Debug, Clone)]
struct CompiledSelectors {
    item: Selector,
    name: Selector,
    contact: Selector,
    email: Selector,
    website: Selector,
}

impl CompiledSelectors {
    fn compile(source_id: &str, s: &MemberSelectors) -> Result<Self, ConfigError> {
        Ok(Self {
            item: compile(source_id, &s.item)?,
            name: compile(source_id, &s.name)?,
            contact: compile(source_id, &s.contact)?,
            email: compile(source_id, &s.email)?,
            website: compile(source_id, &s.website)?,
        })
    }
}

/// Scrapes member entries from association directory pages.
///
/// Each member item yields a record with the company name, and when the
/// item has a contact block, the `mailto:` address and website link.
#[derive(Debug, Clone)]
pub struct AssociationDirectoryAdapter {
    source: AssociationSource,
    selectors: CompiledSelectors,
    client: PageClient,
}

impl AssociationDirectoryAdapter {
    pub fn new(source: AssociationSource, client: PageClient) -> Result<Self, ConfigError> {
        let selectors = CompiledSelectors::compile(&source.id, &source.selectors)?;
        Ok(Self {
            source,
            selectors,
            client,
        })
    }

    /// Parse one directory page into raw records.
    pub fn parse_page(
        &self,
        body: &str,
        page_url: &str,
        collected_at: DateTime<Utc>,
    ) -> Result<Vec<RawRecord>, ParseError> {
        if body.trim().is_empty() {
            return Err(ParseError::EmptyPage);
        }
        let selectors = &self.selectors;
        let document = Html::parse_document(body);

        let mut items = 0;
        let mut records = Vec::new();
        for item in document.select(&selectors.item) {
            items += 1;
            let Some(name) = first_text(item, &selectors.name) else {
                continue;
            };

            let mut fields = RawFields {
                company_name: Some(name),
                ..Default::default()
            };
            if let Some(contact) = item.select(&selectors.contact).next() {
                fields.email =
                    first_attr(contact, &selectors.email, "href").map(|href| mailto_address(&href));
                fields.website = first_attr(contact, &selectors.website, "href")
                    .map(|href| resolve_link(page_url, &href));
            }
            fields.source_url = Some(
                item.value()
                    .attr(&self.source.selectors.url_attribute)
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .map(|u| resolve_link(page_url, u))
                    .unwrap_or_else(|| page_url.to_string()),
            );

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

fn mailto_address(href: &str) -> String {
    let address = href
        .trim()
        .strip_prefix("mailto:")
        .unwrap_or(href.trim());
    address.split('?').next().unwrap_or(address).to_string()
}

#[async_trait]
impl SourceAdapter for AssociationDirectoryAdapter {
    fn id(&self) -> &str {
        &self.source.id
    }

    fn kind(&self) -> SourceKind {
        SourceKind::AssociationDirectory
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
            description: format!("association member directory ({} pages)", self.source.urls.len()),
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
    use std::collections::HashMap;
    use std::sync::Arc;

    struct CannedFetcher {
        pages: HashMap<String, HttpResponse>,
    }

    #[async_trait]
    impl HttpFetcher for CannedFetcher {
        async fn get(
            &self,
            url: &str,
            _headers: &[(String, String)],
        ) -> Result<HttpResponse, FetchError> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Transport {
                    url: url.to_string(),
                    message: "connection refused".to_string(),
                })
        }
    }

    const PAGE: &str = r#"
        <html><body>
          <div class="member-item" data-url="/members/acme">
            <h3 class="company-name">  Acme   Semiconductor </h3>
            <div class="contact-info">
              <a href="mailto:Sales@Acme-Semi.com?subject=hello">Email</a>
              <a class="website" href="https://acme-semi.com">Web</a>
            </div>
          </div>
          <div class="member-item">
            <h3 class="company-name">Wafer Works Ltd</h3>
          </div>
          <div class="member-item"><p>no name here</p></div>
        </body></html>
    "#;

    fn adapter(
        urls: &[&str],
        pages: Vec<(&str, HttpResponse)>,
        page_param: Option<&str>,
        max_pages: u32,
    ) -> AssociationDirectoryAdapter {
        let fetcher = CannedFetcher {
            pages: pages.into_iter().map(|(u, r)| (u.to_string(), r)).collect(),
        };
        let client = PageClient::new(CrawlerConfig::default().without_delay(), Arc::new(fetcher));
        let source = AssociationSource {
            id: "semi".to_string(),
            display_name: None,
            urls: urls.iter().map(|u| u.to_string()).collect(),
            page_param: page_param.map(str::to_string),
            max_pages,
            selectors: MemberSelectors::default(),
        };
        AssociationDirectoryAdapter::new(source, client).unwrap()
    }

    fn guard() -> RateGuard {
        RateGuard::new(&CrawlerConfig::default().without_delay())
    }

    #[test]
    fn parses_member_items() {
        let a = adapter(&[], vec![], None, 1);
        let records = a.parse_page(PAGE, "https://dir.example.org/list", Utc::now()).unwrap();
        assert_eq!(records.len(), 2);

        let acme = records[0].fields();
        assert_eq!(acme.company_name.as_deref(), Some("Acme Semiconductor"));
        assert_eq!(acme.email.as_deref(), Some("Sales@Acme-Semi.com"));
        assert_eq!(acme.website.as_deref(), Some("https://acme-semi.com/"));
        assert_eq!(acme.source_url.as_deref(), Some("https://dir.example.org/members/acme"));

        let wafer = records[1].fields();
        assert!(wafer.email.is_none());
        assert_eq!(wafer.source_url.as_deref(), Some("https://dir.example.org/list"));
        assert_eq!(records[1].source_id(), "semi");
    }

    #[test]
    fn changed_structure_is_a_parse_error() {
        let a = adapter(&[], vec![], None, 1);
        let page = r#"<div class="member-item"><h2>Renamed heading</h2></div>"#;
        assert!(matches!(
            a.parse_page(page, "https://dir.example.org/", Utc::now()),
            Err(ParseError::MissingField { items: 1, .. })
        ));
        let empty = a.parse_page("<html></html>", "https://dir.example.org/", Utc::now());
        assert!(empty.unwrap().is_empty());
    }

    #[test]
    fn invalid_selector_is_a_config_error() {
        let client = PageClient::new(
            CrawlerConfig::default(),
            Arc::new(CannedFetcher { pages: HashMap::new() }),
        );
        let source = AssociationSource {
            id: "broken".to_string(),
            display_name: None,
            urls: vec![],
            page_param: None,
            max_pages: 1,
            selectors: MemberSelectors {
                item: "div[".to_string(),
                ..MemberSelectors::default()
            },
        };
        assert!(matches!(
            AssociationDirectoryAdapter::new(source, client),
            Err(ConfigError::Selector { .. })
        ));
    }

    #[tokio::test]
    async fn bad_page_is_skipped_and_fetch_continues() {
        let a = adapter(
            &["https://a.example.org/members", "https://b.example.org/members"],
            vec![
                (
                    "https://a.example.org/members",
                    HttpResponse::ok(r#"<div class="member-item"><b>?</b></div>"#),
                ),
                ("https://b.example.org/members", HttpResponse::ok(PAGE)),
            ],
            None,
            1,
        );
        let records = a.fetch(&guard()).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn pagination_stops_at_first_empty_page() {
        let a = adapter(
            &["https://dir.example.org/members"],
            vec![
                ("https://dir.example.org/members?page=1", HttpResponse::ok(PAGE)),
                ("https://dir.example.org/members?page=2", HttpResponse::ok(PAGE)),
                (
                    "https://dir.example.org/members?page=3",
                    HttpResponse::ok("<html><body></body></html>"),
                ),
            ],
            Some("page"),
            10,
        );
        let records = a.fetch(&guard()).await.unwrap();
        assert_eq!(records.len(), 4);
    }

    #[tokio::test]
    async fn missing_page_is_not_a_failure() {
        let a = adapter(
            &["https://dir.example.org/gone"],
            vec![("https://dir.example.org/gone", HttpResponse::status(404))],
            None,
            1,
        );
        assert!(a.fetch(&guard()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn connectivity_failure_fails_the_source() {
        let a = adapter(&["https://down.example.org/"], vec![], None, 1);
        assert!(matches!(a.fetch(&guard()).await, Err(AdapterError::Unavailable(_))));
    }

    #[tokio::test]
    async fn forbidden_fails_the_source() {
        let a = adapter(
            &["https://dir.example.org/members"],
            vec![("https://dir.example.org/members", HttpResponse::status(403))],
            None,
            1,
        );
        assert!(matches!(a.fetch(&guard()).await, Err(AdapterError::Unauthorized(_))));
    }
}
