//! Source adapter layer
//!
//! One adapter per external source. Adapters turn a source's pages or API
//! responses into source-tagged [`RawRecord`](crate::record::RawRecord)s,
//! sending every request through the shared [`RateGuard`](crate::guard::RateGuard).

mod association;
mod directory;
mod enterprise_api;
mod error;
mod exhibition;
pub mod http;
mod json;
mod keyword_search;
mod traits;

pub use association::AssociationDirectoryAdapter;
pub use enterprise_api::EnterpriseApiAdapter;
pub use error::{AdapterError, ParseError};
pub use exhibition::{ExhibitionDirectoryAdapter, BOOTH_NUMBER, EXHIBITION};
pub use http::{FetchError, HttpFetcher, HttpResponse, Page, PageClient, ReqwestFetcher};
pub use keyword_search::{KeywordSearchAdapter, SEARCH_KEYWORD};
pub use traits::{SourceAdapter, SourceDescriptor, SourceKind};

use crate::config::{CollectionConfig, ConfigError, SourceConfig};
use std::sync::Arc;

/// Build one adapter per configured source, in configuration order.
///
/// All adapters share a single [`PageClient`] over `fetcher`.
pub fn build_adapters(
    config: &CollectionConfig,
    fetcher: Arc<dyn HttpFetcher>,
) -> Result<Vec<Arc<dyn SourceAdapter>>, ConfigError> {
    config.validate()?;
    let client = PageClient::new(config.crawler.clone(), fetcher);

    config
        .sources
        .iter()
        .map(|source| -> Result<Arc<dyn SourceAdapter>, ConfigError> {
            Ok(match source {
                SourceConfig::Association(s) => {
                    Arc::new(AssociationDirectoryAdapter::new(s.clone(), client.clone())?)
                }
                SourceConfig::Exhibition(s) => {
                    Arc::new(ExhibitionDirectoryAdapter::new(s.clone(), client.clone())?)
                }
                SourceConfig::KeywordSearch(s) => {
                    Arc::new(KeywordSearchAdapter::new(s.clone(), client.clone())?)
                }
                SourceConfig::EnterpriseApi(s) => {
                    Arc::new(EnterpriseApiAdapter::new(s.clone(), client.clone())?)
                }
            })
        })
        .collect()
}
