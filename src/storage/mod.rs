//! Storage module for persisting scan results
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Project creation, lookup and deletion
//! - Partial snapshot updates written by running scans

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{SnapshotSink, Store, StorageError, StorageResult};

use crate::state::{BrokenLink, Link, Page, ScanStatus};
use crate::AtlasError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Store handle shared between concurrently running scans
pub type SharedStore<S> = Arc<Mutex<S>>;

/// Initializes or opens a project database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully initialized storage
/// * `Err(AtlasError)` - Failed to initialize storage
pub fn open_store(path: &Path) -> Result<SqliteStore, AtlasError> {
    SqliteStore::new(path)
}

/// A partial project update: only the fields that are `Some` are written
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotUpdate {
    pub status: Option<ScanStatus>,
    pub base_domain: Option<String>,
    pub pages: Option<Vec<Page>>,
    pub links: Option<Vec<Link>>,
    pub broken_links: Option<Vec<BrokenLink>>,
    pub error: Option<String>,
}

impl SnapshotUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: ScanStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_base_domain(mut self, base_domain: String) -> Self {
        self.base_domain = Some(base_domain);
        self
    }

    pub fn with_pages(mut self, pages: Vec<Page>) -> Self {
        self.pages = Some(pages);
        self
    }

    pub fn with_links(mut self, links: Vec<Link>) -> Self {
        self.links = Some(links);
        self
    }

    pub fn with_broken_links(mut self, broken_links: Vec<BrokenLink>) -> Self {
        self.broken_links = Some(broken_links);
        self
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }

    /// Returns true if the update would not change anything
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The JSON shape polled by clients
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSnapshot {
    pub status: ScanStatus,
    pub base_domain: Option<String>,
    pub pages: Vec<Page>,
    pub links: Vec<Link>,
    pub broken_links: Vec<BrokenLink>,
    pub error: Option<String>,
}

/// Represents a project in the database
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: String,
    pub url: String,
    pub domain: String,
    pub config_hash: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub snapshot: CrawlSnapshot,
}
