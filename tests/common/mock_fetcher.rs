//! Canned-response HTTP fetcher

use async_trait::async_trait;
use semisupply::adapter::{FetchError, HttpFetcher, HttpResponse};
use std::collections::HashMap;
use std::sync::Mutex;

/// Serves registered responses by exact URL; any other URL is a
/// connection failure. Records every requested URL.
#[derive(Default)]
pub struct MockFetcher {
    responses: HashMap<String, HttpResponse>,
    requested: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.responses.insert(url.to_string(), HttpResponse::ok(body));
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.responses.insert(url.to_string(), HttpResponse::status(status));
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpFetcher for MockFetcher {
    async fn get(
        &self,
        url: &str,
        _headers: &[(String, String)],
    ) -> Result<HttpResponse, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        self.responses.get(url).cloned().ok_or_else(|| FetchError::Transport {
            url: url.to_string(),
            message: "connection refused".to_string(),
        })
    }
}
