//! Crawler module for scanning one site
//!
//! This module contains the core crawling logic, including:
//! - The fetch surface (trait plus HTTP implementation)
//! - HTML parsing, link text derivation and placement classification
//! - The breadth-first frontier and visited set
//! - The scan engine that ties them together

mod engine;
mod fetcher;
mod frontier;
mod parser;

pub use engine::{start_scan, ScanEngine, ScanSettings};
pub use fetcher::{
    build_http_client, FetcherLauncher, HttpFetcher, HttpLauncher, Navigation, PageFetcher,
    MAX_REDIRECTS,
};
pub use frontier::{Frontier, FrontierEntry};
pub use parser::{parse_page, ExtractedLink, LoadedPage, MAX_LINK_TEXT};
