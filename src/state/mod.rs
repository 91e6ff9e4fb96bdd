//! State module for tracking crawl progress
//!
//! This module provides the per-scan state and the records a scan produces.
//!
//! # Components
//!
//! - `ScanStatus`: Lifecycle of a project's scan (pending, scanning, completed, failed)
//! - `CrawlState`: Pages, links and broken links accumulated by one running scan
//! - `Page`, `Link`, `BrokenLink`: The persisted records

mod crawl_state;
mod scan_status;

// Re-export main types
pub use crawl_state::{BrokenLink, CrawlState, Link, LinkContext, LinkStatus, Page, PageKind};
pub use scan_status::ScanStatus;
