//! Page Atlas: an internal page-graph auditor
//!
//! This crate crawls a single website breadth-first, records every reachable
//! page, every link between pages (classified by where it sits on the page),
//! and every broken link, persisting snapshots of the growing result set.

pub mod config;
pub mod crawler;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Page Atlas operations
#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::ScanStatus,
        to: state::ScanStatus,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Relative URL without a base: {0}")]
    RelativeWithoutBase(String),
}

/// Errors raised by a page fetch surface
///
/// `Timeout` and `Network` are per-page failures and end up as broken links.
/// `Launch` and `Crashed` mean the surface itself is unusable and abort the scan.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Navigation timeout after {0}ms")]
    Timeout(u64),

    #[error("{0}")]
    Network(String),

    #[error("Failed to launch fetch surface: {0}")]
    Launch(String),

    #[error("Fetch surface crashed: {0}")]
    Crashed(String),
}

impl FetchError {
    /// Returns true if the error means no further pages can be fetched
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Launch(_) | Self::Crashed(_))
    }
}

/// Result type alias for Page Atlas operations
pub type Result<T> = std::result::Result<T, AtlasError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{start_scan, ScanEngine, ScanSettings};
pub use state::{BrokenLink, CrawlState, Link, LinkContext, Page, PageKind, ScanStatus};
pub use url::{base_domain_of, normalize_url, DomainScope};
