//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Store trait.

use crate::state::ScanStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{SnapshotSink, Store, StorageError, StorageResult};
use crate::storage::{CrawlSnapshot, ProjectRecord, SnapshotUpdate};
use crate::AtlasError;
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use url::Url;

const PROJECT_COLUMNS: &str = "id, url, domain, status, base_domain, pages, links, broken_links, \
     error, config_hash, created_at, updated_at";

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(AtlasError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, AtlasError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for tests and throwaway scans)
    pub fn new_in_memory() -> Result<Self, AtlasError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn query_projects(&self, sql: &str) -> StorageResult<Vec<ProjectRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], RawProject::from_row)?;

        let mut projects = Vec::new();
        for row in rows {
            projects.push(row?.into_record()?);
        }
        Ok(projects)
    }
}

impl SnapshotSink for SqliteStore {
    fn update(&mut self, project_id: &str, update: &SnapshotUpdate) -> StorageResult<()> {
        let mut assignments: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(status) = update.status {
            assignments.push("status = ?");
            values.push(Value::Text(status.to_db_string().to_string()));
        }
        if let Some(base_domain) = &update.base_domain {
            assignments.push("base_domain = ?");
            values.push(Value::Text(base_domain.clone()));
        }
        if let Some(pages) = &update.pages {
            assignments.push("pages = ?");
            values.push(Value::Text(serde_json::to_string(pages)?));
        }
        if let Some(links) = &update.links {
            assignments.push("links = ?");
            values.push(Value::Text(serde_json::to_string(links)?));
        }
        if let Some(broken_links) = &update.broken_links {
            assignments.push("broken_links = ?");
            values.push(Value::Text(serde_json::to_string(broken_links)?));
        }
        if let Some(error) = &update.error {
            assignments.push("error = ?");
            values.push(Value::Text(error.clone()));
        }

        assignments.push("updated_at = ?");
        values.push(Value::Text(Utc::now().to_rfc3339()));
        values.push(Value::Text(project_id.to_string()));

        let sql = format!(
            "UPDATE projects SET {} WHERE id = ?",
            assignments.join(", ")
        );
        let changed = self.conn.execute(&sql, params_from_iter(values))?;

        if changed == 0 {
            return Err(StorageError::ProjectNotFound(project_id.to_string()));
        }
        Ok(())
    }
}

impl Store for SqliteStore {
    fn create_project(&mut self, url: &Url, config_hash: &str) -> StorageResult<ProjectRecord> {
        let id = uuid::Uuid::new_v4().to_string();
        let domain = url
            .host_str()
            .map(|h| h.to_lowercase())
            .ok_or_else(|| StorageError::Corrupt(format!("URL without host: {}", url)))?;
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO projects (id, url, domain, status, config_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                id,
                url.as_str(),
                domain,
                ScanStatus::Pending.to_db_string(),
                config_hash,
                now
            ],
        )?;

        self.get_project(&id)?
            .ok_or(StorageError::ProjectNotFound(id))
    }

    fn get_project(&self, project_id: &str) -> StorageResult<Option<ProjectRecord>> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS),
                params![project_id],
                RawProject::from_row,
            )
            .optional()?;

        raw.map(RawProject::into_record).transpose()
    }

    fn list_projects(&self) -> StorageResult<Vec<ProjectRecord>> {
        self.query_projects(&format!(
            "SELECT {} FROM projects ORDER BY created_at DESC, rowid DESC",
            PROJECT_COLUMNS
        ))
    }

    fn delete_project(&mut self, project_id: &str) -> StorageResult<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1", params![project_id])?;
        Ok(deleted > 0)
    }
}

/// A project row before its JSON columns are decoded
struct RawProject {
    id: String,
    url: String,
    domain: String,
    status: String,
    base_domain: Option<String>,
    pages: String,
    links: String,
    broken_links: String,
    error: Option<String>,
    config_hash: String,
    created_at: String,
    updated_at: String,
}

impl RawProject {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            url: row.get(1)?,
            domain: row.get(2)?,
            status: row.get(3)?,
            base_domain: row.get(4)?,
            pages: row.get(5)?,
            links: row.get(6)?,
            broken_links: row.get(7)?,
            error: row.get(8)?,
            config_hash: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    fn into_record(self) -> StorageResult<ProjectRecord> {
        let status = ScanStatus::from_db_string(&self.status).ok_or_else(|| {
            StorageError::Corrupt(format!("unknown status '{}' for {}", self.status, self.id))
        })?;

        Ok(ProjectRecord {
            snapshot: CrawlSnapshot {
                status,
                base_domain: self.base_domain,
                pages: serde_json::from_str(&self.pages)?,
                links: serde_json::from_str(&self.links)?,
                broken_links: serde_json::from_str(&self.broken_links)?,
                error: self.error,
            },
            id: self.id,
            url: self.url,
            domain: self.domain,
            config_hash: self.config_hash,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{BrokenLink, Link, LinkContext, LinkStatus, Page};

    fn start_url() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn test_create_project_is_pending() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let project = store.create_project(&start_url(), "abc123").unwrap();

        assert_eq!(project.url, "https://example.com/");
        assert_eq!(project.domain, "example.com");
        assert_eq!(project.config_hash, "abc123");
        assert_eq!(project.snapshot.status, ScanStatus::Pending);
        assert!(project.snapshot.pages.is_empty());
        assert!(project.snapshot.error.is_none());
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let project = store.create_project(&start_url(), "h").unwrap();

        let pages = vec![Page::fetched("https://example.com/", "Home")];
        let update = SnapshotUpdate::new()
            .with_status(ScanStatus::Scanning)
            .with_pages(pages.clone());
        store.update(&project.id, &update).unwrap();

        let links = vec![Link {
            source: "https://example.com/".to_string(),
            target: "https://example.com/a".to_string(),
            text: "A".to_string(),
            context: LinkContext::Content,
        }];
        store
            .update(&project.id, &SnapshotUpdate::new().with_links(links.clone()))
            .unwrap();

        let loaded = store.get_project(&project.id).unwrap().unwrap();
        assert_eq!(loaded.snapshot.status, ScanStatus::Scanning);
        assert_eq!(loaded.snapshot.pages, pages);
        assert_eq!(loaded.snapshot.links, links);
    }

    #[test]
    fn test_broken_link_status_roundtrips() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let project = store.create_project(&start_url(), "h").unwrap();

        let broken = vec![
            BrokenLink {
                url: "https://example.com/a".to_string(),
                source: Some("https://example.com/".to_string()),
                status: LinkStatus::Code(404),
            },
            BrokenLink {
                url: "https://example.com/b".to_string(),
                source: None,
                status: LinkStatus::no_response(),
            },
        ];
        store
            .update(
                &project.id,
                &SnapshotUpdate::new().with_broken_links(broken.clone()),
            )
            .unwrap();

        let loaded = store.get_project(&project.id).unwrap().unwrap();
        assert_eq!(loaded.snapshot.broken_links, broken);
    }

    #[test]
    fn test_update_unknown_project() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let result = store.update(
            "missing",
            &SnapshotUpdate::new().with_status(ScanStatus::Scanning),
        );
        assert!(matches!(result, Err(StorageError::ProjectNotFound(_))));
    }

    #[test]
    fn test_list_and_delete() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let first = store.create_project(&start_url(), "h").unwrap();
        let second = store
            .create_project(&Url::parse("https://example.org/").unwrap(), "h")
            .unwrap();

        let listed = store.list_projects().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);

        assert!(store.delete_project(&first.id).unwrap());
        assert!(!store.delete_project(&first.id).unwrap());
        assert!(store.get_project(&first.id).unwrap().is_none());
        assert_eq!(store.list_projects().unwrap().len(), 1);
    }

    #[test]
    fn test_file_backed_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlas.db");

        let id = {
            let mut store = SqliteStore::new(&path).unwrap();
            store.create_project(&start_url(), "h").unwrap().id
        };

        let store = SqliteStore::new(&path).unwrap();
        assert!(store.get_project(&id).unwrap().is_some());
    }
}
