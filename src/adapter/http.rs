//! Outbound HTTP for adapters
//!
//! `HttpFetcher` is the transport seam: `ReqwestFetcher` in production, a
//! canned-response fetcher in tests. `PageClient` sits on top of it, carries
//! the crawler configuration, runs every request through the rate guard and
//! maps HTTP statuses onto the adapter error taxonomy.

use super::error::AdapterError;
use crate::config::CrawlerConfig;
use crate::guard::RateGuard;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("request to {0} timed out")]
    Timeout(String),

    #[error("HTTP client configuration error: {0}")]
    Client(String),
}

/// A fully read response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }
}

/// Minimal GET transport.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<HttpResponse, FetchError>;
}

/// `reqwest`-backed fetcher configured from [`CrawlerConfig`].
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, header_value(&config.accept)?);
        headers.insert(ACCEPT_LANGUAGE, header_value(&config.accept_language)?);

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

fn header_value(value: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(value)
        .map_err(|e| FetchError::Client(format!("header value '{}': {}", value, e)))
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<HttpResponse, FetchError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| FetchError::Client(format!("header name '{}': {}", name, e)))?;
            request = request.header(name, header_value(value)?);
        }

        let to_fetch_error = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        };

        let response = request.send().await.map_err(to_fetch_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(to_fetch_error)?;
        Ok(HttpResponse { status, body })
    }
}

/// Outcome of fetching one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Body(String),
    /// 404/410: the page is gone, the source is not
    Missing(u16),
}

/// Guarded page access shared by all adapters built from one configuration.
#[derive(Clone)]
pub struct PageClient {
    config: Arc<CrawlerConfig>,
    fetcher: Arc<dyn HttpFetcher>,
}

impl std::fmt::Debug for PageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageClient").field("config", &self.config).finish()
    }
}

impl PageClient {
    pub fn new(config: CrawlerConfig, fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
        }
    }

    /// Admit `url` through the guard, fetch it and classify the response.
    ///
    /// 401/403 abort as `Unauthorized`; 404/410 come back as
    /// [`Page::Missing`]; any other non-success status is `Unavailable`.
    pub async fn get(
        &self,
        guard: &RateGuard,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<Page, AdapterError> {
        let _permit = guard.admit(url).await?;

        let mut all_headers: Vec<(String, String)> = self
            .config
            .extra_headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        all_headers.extend(headers.iter().cloned());

        let response = self.fetcher.get(url, &all_headers).await?;
        debug!(url, status = response.status, bytes = response.body.len(), "fetched page");

        match response.status {
            200..=299 => Ok(Page::Body(response.body)),
            401 | 403 => Err(AdapterError::Unauthorized(format!(
                "{} returned HTTP {}",
                url, response.status
            ))),
            404 | 410 => Ok(Page::Missing(response.status)),
            status => Err(AdapterError::Unavailable(format!(
                "{} returned HTTP {}",
                url, status
            ))),
        }
    }
}

/// URL for page `page` of a paginated listing. Page 1 without a page
/// parameter is the base URL itself.
pub(crate) fn page_url(
    base: &str,
    page_param: Option<&str>,
    page: u32,
) -> Result<String, AdapterError> {
    let Some(param) = page_param else {
        return Ok(base.to_string());
    };
    let mut url = Url::parse(base)
        .map_err(|e| AdapterError::Unavailable(format!("invalid URL '{}': {}", base, e)))?;
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != param)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(param, &page.to_string());
    Ok(url.to_string())
}

/// Resolve a possibly relative link against the page it appeared on.
pub(crate) fn resolve_link(page: &str, href: &str) -> String {
    Url::parse(page)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}
