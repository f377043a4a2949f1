//! Access policy hooks consulted before every outbound request

use std::collections::HashSet;
use url::Url;

/// Decides whether a URL may be fetched at all.
///
/// Adapters never call this directly; they go through
/// [`RateGuard::admit`](super::RateGuard::admit).
pub trait PolicyHook: Send + Sync {
    fn allowed(&self, url: &Url) -> bool;
}

/// Allows every URL.
///
/// This is a placeholder, not a robots.txt implementation. Plug in a real
/// robots.txt-aware policy before pointing the collector at production
/// sites.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllPolicy;

impl PolicyHook for AllowAllPolicy {
    fn allowed(&self, _url: &Url) -> bool {
        true
    }
}

/// Denies listed hosts and their subdomains; allows everything else.
#[derive(Debug, Clone, Default)]
pub struct HostDenyList {
    hosts: HashSet<String>,
}

impl HostDenyList {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hosts: hosts
                .into_iter()
                .map(|h| h.as_ref().trim().trim_end_matches('.').to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }
}

impl PolicyHook for HostDenyList {
    fn allowed(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        !self.hosts.iter().any(|denied| {
            host == *denied
                || host
                    .strip_suffix(denied.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}
