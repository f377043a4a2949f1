//! Collection configuration
//!
//! Everything a collection run needs is an explicit value loaded from YAML
//! and passed into constructors; there is no process-wide mutable default.
//! Every section has defaults, so an empty file is a valid configuration
//! (with no sources).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("source '{source_id}': invalid selector '{selector}': {message}")]
    Selector {
        source_id: String,
        selector: String,
        message: String,
    },
}

/// Shared HTTP and politeness settings for every adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    /// Additional headers sent with every request
    pub extra_headers: BTreeMap<String, String>,
    pub request_timeout_secs: u64,
    /// Randomized delay before each request, lower bound
    pub delay_min_ms: u64,
    /// Randomized delay before each request, upper bound
    pub delay_max_ms: u64,
    /// Simultaneous connections per host
    pub per_host_limit: usize,
    /// Simultaneous connections overall
    pub total_limit: usize,
    /// Hosts (and their subdomains) adapters must not contact
    pub denied_hosts: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("semisupply/{} (+supplier directory collector)", crate::VERSION),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,application/json;q=0.9,*/*;q=0.8"
                .to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
            extra_headers: BTreeMap::new(),
            request_timeout_secs: 30,
            delay_min_ms: 1_000,
            delay_max_ms: 3_000,
            per_host_limit: 5,
            total_limit: 10,
            denied_hosts: Vec::new(),
        }
    }
}

impl CrawlerConfig {
    /// Same settings with the inter-request delay switched off.
    pub fn without_delay(mut self) -> Self {
        self.delay_min_ms = 0;
        self.delay_max_ms = 0;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.delay_min_ms > self.delay_max_ms {
            return Err(ConfigError::Invalid(format!(
                "crawler.delay_min_ms ({}) exceeds crawler.delay_max_ms ({})",
                self.delay_min_ms, self.delay_max_ms
            )));
        }
        if self.per_host_limit == 0 || self.total_limit == 0 {
            return Err(ConfigError::Invalid(
                "crawler connection limits must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "crawler.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Upper bound on one adapter's whole fetch
    pub adapter_timeout_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            adapter_timeout_secs: 30,
        }
    }
}

impl OrchestratorConfig {
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.adapter_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelevanceConfig {
    /// Replaces the built-in keyword set when present
    pub keywords: Option<Vec<String>>,
}

/// CSS selectors for an association member directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberSelectors {
    pub item: String,
    pub name: String,
    pub contact: String,
    pub email: String,
    pub website: String,
    /// Item attribute holding the member's detail URL
    pub url_attribute: String,
}

impl Default for MemberSelectors {
    fn default() -> Self {
        Self {
            item: "div.member-item".to_string(),
            name: "h3.company-name".to_string(),
            contact: "div.contact-info".to_string(),
            email: r#"a[href^="mailto:"]"#.to_string(),
            website: "a.website".to_string(),
            url_attribute: "data-url".to_string(),
        }
    }
}

/// CSS selectors for an exhibition exhibitor list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExhibitorSelectors {
    pub item: String,
    pub name: String,
    pub booth: String,
    pub country: String,
}

impl Default for ExhibitorSelectors {
    fn default() -> Self {
        Self {
            item: "div.exhibitor-item".to_string(),
            name: "h4.exhibitor-name".to_string(),
            booth: "span.booth-number".to_string(),
            country: "span.exhibitor-country".to_string(),
        }
    }
}

fn one() -> u32 {
    1
}

fn default_api_key_header() -> String {
    "X-Api-Key".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationSource {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub urls: Vec<String>,
    /// Query parameter used for pagination; single page when absent
    #[serde(default)]
    pub page_param: Option<String>,
    #[serde(default = "one")]
    pub max_pages: u32,
    #[serde(default)]
    pub selectors: MemberSelectors,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExhibitionSource {
    pub id: String,
    /// Exhibition name recorded with every exhibitor, e.g. "SEMICON China"
    #[serde(default)]
    pub label: Option<String>,
    pub urls: Vec<String>,
    #[serde(default)]
    pub page_param: Option<String>,
    #[serde(default = "one")]
    pub max_pages: u32,
    #[serde(default)]
    pub selectors: ExhibitorSelectors,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordSearchSource {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// JSON search endpoint with a `{keyword}` placeholder. Without one the
    /// source has no compliant access path and yields nothing.
    #[serde(default)]
    pub search_url: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
    /// Field of the response object holding the record list
    #[serde(default)]
    pub records_field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnterpriseApiSource {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Search endpoint; `keyword` and `page` are added as query parameters
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "one")]
    pub max_pages: u32,
    #[serde(default)]
    pub records_field: Option<String>,
}

/// One configured external source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Association(AssociationSource),
    Exhibition(ExhibitionSource),
    KeywordSearch(KeywordSearchSource),
    EnterpriseApi(EnterpriseApiSource),
}

impl SourceConfig {
    pub fn id(&self) -> &str {
        match self {
            Self::Association(s) => &s.id,
            Self::Exhibition(s) => &s.id,
            Self::KeywordSearch(s) => &s.id,
            Self::EnterpriseApi(s) => &s.id,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    pub crawler: CrawlerConfig,
    pub orchestrator: OrchestratorConfig,
    pub relevance: RelevanceConfig,
    pub sources: Vec<SourceConfig>,
}

impl CollectionConfig {
    /// Default location: `<config dir>/semisupply/config.yaml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".config"))
            .join("semisupply")
            .join("config.yaml")
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Load from `path` when given, otherwise from the default location if a
    /// file exists there, otherwise defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default = Self::default_path();
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.crawler.validate()?;
        if self.orchestrator.adapter_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "orchestrator.adapter_timeout_secs must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            let id = source.id();
            if id.trim().is_empty() {
                return Err(ConfigError::Invalid("source id must not be empty".to_string()));
            }
            if !seen.insert(id) {
                return Err(ConfigError::Invalid(format!("duplicate source id '{}'", id)));
            }
        }
        Ok(())
    }
}
