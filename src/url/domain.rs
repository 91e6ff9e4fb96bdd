use crate::{UrlError, UrlResult};
use url::Url;

/// Strips a single leading `www.` from a host
pub fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Extracts the scoping domain from a URL
///
/// The host is lowercased and a leading `www.` is removed, so that
/// `https://www.example.com/` and `https://example.com/` scope identically.
/// Ports are not part of the domain.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use page_atlas::url::base_domain_of;
///
/// let url = Url::parse("https://WWW.Example.com:8080/path").unwrap();
/// assert_eq!(base_domain_of(&url), Some("example.com".to_string()));
/// ```
pub fn base_domain_of(url: &Url) -> Option<String> {
    url.host_str()
        .map(|h| strip_www(&h.to_lowercase()).to_string())
}

/// The domain a crawl is restricted to
///
/// Derived from the start URL. It may be rebased exactly once, right after the
/// first navigation, when the server forwards the start URL to another domain.
#[derive(Debug, Clone)]
pub struct DomainScope {
    base: String,
    rebase_checked: bool,
}

impl DomainScope {
    /// Creates a scope from the crawl's start URL
    pub fn new(start: &Url) -> UrlResult<Self> {
        let base = base_domain_of(start).ok_or(UrlError::MissingDomain)?;
        Ok(Self {
            base,
            rebase_checked: false,
        })
    }

    /// The current base domain
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Returns true if the URL's www-stripped host equals the base domain
    pub fn in_scope(&self, url: &Url) -> bool {
        base_domain_of(url).is_some_and(|domain| domain == self.base)
    }

    /// Rebases the scope onto the final URL of the first navigation
    ///
    /// Only the first call can change anything; later calls are no-ops.
    ///
    /// # Returns
    ///
    /// * `Some(String)` - The new base domain, if it changed
    /// * `None` - No change
    pub fn rebase_once(&mut self, final_url: &Url) -> Option<String> {
        if self.rebase_checked {
            return None;
        }
        self.rebase_checked = true;

        let final_domain = base_domain_of(final_url)?;
        if final_domain == self.base {
            return None;
        }

        self.base = final_domain.clone();
        Some(final_domain)
    }
}
