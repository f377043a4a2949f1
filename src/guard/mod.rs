//! Rate/politeness guard
//!
//! Every outbound request goes through [`RateGuard::admit`]: the policy hook
//! must allow the URL, the caller sleeps a randomized interval, then takes a
//! slot from the per-host and global connection limits. The guard is the
//! only state shared between concurrently running adapters.

mod policy;

pub use policy::{AllowAllPolicy, HostDenyList, PolicyHook};

use crate::config::CrawlerConfig;
use dashmap::DashMap;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("access policy denies {0}")]
    PolicyViolation(String),

    #[error("invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("connection limiter closed")]
    Closed,
}

/// A held connection slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct HostPermit {
    host: String,
    _host_slot: OwnedSemaphorePermit,
    _total_slot: OwnedSemaphorePermit,
}

impl HostPermit {
    pub fn host(&self) -> &str {
        &self.host
    }
}

/// Politeness guard shared by all adapters of a run.
pub struct RateGuard {
    policy: Arc<dyn PolicyHook>,
    delay_min_ms: u64,
    delay_max_ms: u64,
    per_host_limit: usize,
    total_limit: usize,
    total: Arc<Semaphore>,
    hosts: DashMap<String, Arc<Semaphore>>,
}

impl std::fmt::Debug for RateGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateGuard")
            .field("delay_min_ms", &self.delay_min_ms)
            .field("delay_max_ms", &self.delay_max_ms)
            .field("per_host_limit", &self.per_host_limit)
            .field("total_limit", &self.total_limit)
            .field("hosts", &self.hosts.len())
            .finish()
    }
}

impl RateGuard {
    /// Build a guard from crawler settings. Configured `denied_hosts` become
    /// a [`HostDenyList`]; otherwise the allow-all stub is used.
    pub fn new(config: &CrawlerConfig) -> Self {
        let policy: Arc<dyn PolicyHook> = if config.denied_hosts.is_empty() {
            Arc::new(AllowAllPolicy)
        } else {
            Arc::new(HostDenyList::new(&config.denied_hosts))
        };
        let per_host_limit = config.per_host_limit.max(1);
        let total_limit = config.total_limit.max(1);
        Self {
            policy,
            delay_min_ms: config.delay_min_ms,
            delay_max_ms: config.delay_max_ms.max(config.delay_min_ms),
            per_host_limit,
            total_limit,
            total: Arc::new(Semaphore::new(total_limit)),
            hosts: DashMap::new(),
        }
    }

    /// Replace the access policy.
    pub fn with_policy(mut self, policy: Arc<dyn PolicyHook>) -> Self {
        self.policy = policy;
        self
    }

    /// Whether the policy hook allows fetching `url`. Unparsable URLs are
    /// never allowed.
    pub fn allowed(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => self.policy.allowed(&parsed),
            Err(_) => false,
        }
    }

    /// Sleep for a random interval within the configured delay range.
    pub async fn wait(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        debug!(delay_ms = delay.as_millis() as u64, "politeness delay");
        tokio::time::sleep(delay).await;
    }

    fn next_delay(&self) -> Duration {
        let ms = if self.delay_max_ms > self.delay_min_ms {
            rand::thread_rng().gen_range(self.delay_min_ms..=self.delay_max_ms)
        } else {
            self.delay_min_ms
        };
        Duration::from_millis(ms)
    }

    /// Take a connection slot for the URL's host, waiting while the host or
    /// global limit is saturated.
    pub async fn acquire(&self, url: &str) -> Result<HostPermit, GuardError> {
        let host = host_of(url)?;
        let host_semaphore = self
            .hosts
            .entry(host.clone())
            .or_insert_with(|| Arc::new(Semaphore::new(self.per_host_limit)))
            .clone();

        let host_slot = host_semaphore
            .acquire_owned()
            .await
            .map_err(|_| GuardError::Closed)?;
        let total_slot = self
            .total
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| GuardError::Closed)?;

        Ok(HostPermit {
            host,
            _host_slot: host_slot,
            _total_slot: total_slot,
        })
    }

    /// Policy check, politeness delay and slot acquisition, in that order.
    /// Adapters call this before every request.
    pub async fn admit(&self, url: &str) -> Result<HostPermit, GuardError> {
        if !self.allowed(url) {
            return Err(GuardError::PolicyViolation(url.to_string()));
        }
        self.wait().await;
        self.acquire(url).await
    }

    /// Connections currently held against `host`.
    pub fn in_flight(&self, host: &str) -> usize {
        self.hosts
            .get(host)
            .map(|s| self.per_host_limit - s.available_permits())
            .unwrap_or(0)
    }

    /// Connections currently held across all hosts.
    pub fn total_in_flight(&self) -> usize {
        self.total_limit - self.total.available_permits()
    }
}

fn host_of(url: &str) -> Result<String, GuardError> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        .filter(|h| !h.is_empty())
        .ok_or_else(|| GuardError::InvalidUrl(url.to_string()))
}
