//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{ProjectRecord, SnapshotUpdate};
use thiserror::Error;
use url::Url;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Destination for the snapshots a running scan writes
///
/// This is the only storage capability the crawl engine needs. Writes for
/// different projects must not interfere with each other.
pub trait SnapshotSink: Send {
    /// Applies a partial update to a project
    ///
    /// Fields left as `None` in the update keep their stored value.
    fn update(&mut self, project_id: &str, update: &SnapshotUpdate) -> StorageResult<()>;
}

/// Full project store used by the command-line front end
pub trait Store: SnapshotSink {
    // ===== Project Management =====

    /// Creates a new project in `pending` status
    ///
    /// # Arguments
    ///
    /// * `url` - The normalized start URL
    /// * `config_hash` - Hash of the configuration the scan will run with
    ///
    /// # Returns
    ///
    /// The newly created project
    fn create_project(&mut self, url: &Url, config_hash: &str) -> StorageResult<ProjectRecord>;

    /// Gets a project by ID
    fn get_project(&self, project_id: &str) -> StorageResult<Option<ProjectRecord>>;

    /// Lists all projects, newest first
    fn list_projects(&self) -> StorageResult<Vec<ProjectRecord>>;

    /// Deletes a project; returns false if it did not exist
    fn delete_project(&mut self, project_id: &str) -> StorageResult<bool>;
}
