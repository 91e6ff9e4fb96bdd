//! Per-scan crawl state and the records it accumulates
//!
//! One `CrawlState` is owned by exactly one running scan. Pages are unique by
//! URL and links are unique by their full `(source, target, text, context)`
//! tuple; both invariants are enforced here rather than by callers.

use crate::state::ScanStatus;
use crate::storage::SnapshotUpdate;
use crate::AtlasError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Whether a recorded page was fetched or is a leaf document reference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    #[default]
    Page,
    Document,
}

/// A page discovered during the crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: PageKind,
}

impl Page {
    /// A page that was fetched successfully
    pub fn fetched(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            kind: PageKind::Page,
        }
    }

    /// A document referenced by a crawled page; titled after its file name
    pub fn document(url: impl Into<String>, file_name: &str) -> Self {
        Self {
            url: url.into(),
            title: format!("[DOC] {}", file_name),
            kind: PageKind::Document,
        }
    }
}

/// Where on the referring page a link was placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkContext {
    Nav,
    Footer,
    Content,
}

impl fmt::Display for LinkContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nav => "nav",
            Self::Footer => "footer",
            Self::Content => "content",
        })
    }
}

/// A link between two in-scope pages
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    pub text: String,
    pub context: LinkContext,
}

/// Failure status of a broken link
///
/// Serializes as a bare number for HTTP statuses and as a string otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkStatus {
    Code(u16),
    Message(String),
}

impl LinkStatus {
    /// Sentinel used when navigation returned no response at all
    pub fn no_response() -> Self {
        Self::Message("No Response".to_string())
    }

    /// A fetch-level failure (timeout, connection error, ...)
    pub fn error(message: impl fmt::Display) -> Self {
        Self::Message(format!("Error: {}", message))
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{}", code),
            Self::Message(message) => f.write_str(message),
        }
    }
}

/// A target that failed to load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenLink {
    pub url: String,
    pub source: Option<String>,
    pub status: LinkStatus,
}

/// Mutable state of one running scan
#[derive(Debug)]
pub struct CrawlState {
    status: ScanStatus,
    base_domain: String,
    pages: Vec<Page>,
    links: Vec<Link>,
    broken_links: Vec<BrokenLink>,
    error: Option<String>,
    page_urls: HashSet<String>,
    link_keys: HashSet<Link>,
}

impl CrawlState {
    /// Creates the state for a scan that has not started yet
    pub fn new(base_domain: impl Into<String>) -> Self {
        Self {
            status: ScanStatus::Pending,
            base_domain: base_domain.into(),
            pages: Vec::new(),
            links: Vec::new(),
            broken_links: Vec::new(),
            error: None,
            page_urls: HashSet::new(),
            link_keys: HashSet::new(),
        }
    }

    pub fn status(&self) -> ScanStatus {
        self.status
    }

    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    pub fn set_base_domain(&mut self, base_domain: impl Into<String>) {
        self.base_domain = base_domain.into();
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn broken_links(&self) -> &[BrokenLink] {
        &self.broken_links
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Moves the scan to a new status, rejecting backward or skipping moves
    pub fn transition(&mut self, next: ScanStatus) -> Result<(), AtlasError> {
        if !self.status.can_transition_to(next) {
            return Err(AtlasError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Marks the scan failed with a human-readable message
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), AtlasError> {
        self.transition(ScanStatus::Failed)?;
        self.error = Some(message.into());
        Ok(())
    }

    /// Returns true if a page with this URL is already recorded
    pub fn has_page(&self, url: &str) -> bool {
        self.page_urls.contains(url)
    }

    /// Records a page; returns false if its URL is already present
    pub fn add_page(&mut self, page: Page) -> bool {
        if !self.page_urls.insert(page.url.clone()) {
            return false;
        }
        self.pages.push(page);
        true
    }

    /// Records a link; returns false if the exact tuple is already present
    pub fn add_link(&mut self, link: Link) -> bool {
        if !self.link_keys.insert(link.clone()) {
            return false;
        }
        self.links.push(link);
        true
    }

    pub fn add_broken_link(&mut self, broken: BrokenLink) {
        self.broken_links.push(broken);
    }

    /// Snapshot of the accumulated results, without a status change
    pub fn progress_update(&self) -> SnapshotUpdate {
        SnapshotUpdate::new()
            .with_base_domain(self.base_domain.clone())
            .with_pages(self.pages.clone())
            .with_links(self.links.clone())
            .with_broken_links(self.broken_links.clone())
    }

    /// Snapshot carrying the current status and, when failed, the error
    pub fn terminal_update(&self) -> SnapshotUpdate {
        match self.status {
            ScanStatus::Failed => SnapshotUpdate::new()
                .with_status(ScanStatus::Failed)
                .with_error(self.error.clone().unwrap_or_default()),
            status => self.progress_update().with_status(status),
        }
    }
}
