use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use log::{debug, warn};
use rusqlite::{params, Connection};

use crate::record::JobApplicationRecord;

/// Fixed key under which the single in-flight draft lives.
pub const DRAFT_KEY: &str = "job-application-draft";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS drafts (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Draft persistence. Storage trouble must never take the form down, so a
/// store that fails to open degrades to an in-memory-only session: every
/// operation becomes a logged no-op instead of an error.
pub struct DraftStore {
    conn: Option<Connection>,
    path: PathBuf,
}

impl DraftStore {
    pub fn open() -> Self {
        Self::open_at(&Self::default_path())
    }

    pub fn open_at(path: &Path) -> Self {
        match Self::connect(path) {
            Ok(conn) => Self { conn: Some(conn), path: path.to_path_buf() },
            Err(err) => {
                warn!("draft store unavailable, edits will not persist: {err:#}");
                Self { conn: None, path: path.to_path_buf() }
            }
        }
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        let conn = Connection::open_in_memory().and_then(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        });
        match conn {
            Ok(conn) => Self { conn: Some(conn), path: PathBuf::from(":memory:") },
            Err(err) => {
                warn!("in-memory draft store unavailable: {err}");
                Self { conn: None, path: PathBuf::from(":memory:") }
            }
        }
    }

    fn default_path() -> PathBuf {
        if let Some(dirs) = ProjectDirs::from("", "", "apply") {
            dirs.data_dir().join("apply.db")
        } else {
            PathBuf::from("apply.db")
        }
    }

    fn connect(path: &Path) -> Result<Connection> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open draft store at {}", path.display()))?;
        conn.execute_batch(SCHEMA).context("Failed to initialize draft store schema")?;
        Ok(conn)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The saved draft, if one exists and still parses. A row that no
    /// longer decodes is deleted so the next save starts clean.
    pub fn load(&self) -> Option<JobApplicationRecord> {
        let Some(conn) = self.conn.as_ref() else {
            return None;
        };
        let raw = match conn.query_row(
            "SELECT value FROM drafts WHERE key = ?1",
            [DRAFT_KEY],
            |row| row.get::<_, String>(0),
        ) {
            Ok(raw) => raw,
            Err(rusqlite::Error::QueryReturnedNoRows) => return None,
            Err(err) => {
                warn!("failed to read draft: {err}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("discarding draft that no longer parses: {err}");
                if let Err(err) = conn.execute("DELETE FROM drafts WHERE key = ?1", [DRAFT_KEY]) {
                    warn!("failed to delete corrupted draft: {err}");
                }
                None
            }
        }
    }

    /// Write the draft snapshot. Failures are logged and absorbed; the
    /// caller keeps its in-memory state either way.
    pub fn save(&self, record: &JobApplicationRecord) {
        let Some(conn) = self.conn.as_ref() else {
            debug!("draft store disabled; edit kept in memory only");
            return;
        };
        let value = match serde_json::to_string(record) {
            Ok(value) => value,
            Err(err) => {
                warn!("failed to encode draft: {err}");
                return;
            }
        };
        if let Err(err) = conn.execute(
            "INSERT OR REPLACE INTO drafts (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
            params![DRAFT_KEY, value],
        ) {
            warn!("failed to save draft: {err}");
        }
    }

    pub fn clear(&self) {
        let Some(conn) = self.conn.as_ref() else {
            return;
        };
        if let Err(err) = conn.execute("DELETE FROM drafts WHERE key = ?1", [DRAFT_KEY]) {
            warn!("failed to clear draft: {err}");
        }
    }
}
