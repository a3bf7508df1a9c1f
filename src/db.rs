use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Mutex;

use crate::model::User;

/// Key of the single persisted analysis record
pub const STORAGE_KEY: &str = "follow-data";

/// Persisted analysis
///
/// Holds the two canonical sequences plus whatever derived lists are known.
/// Local snapshots carry no derived lists and are recomputed on load. The
/// remote path stores all three because those came from the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredData {
    /// Snapshot identity (UUID) - new for every save
    #[serde(default = "default_uuid")]
    pub id: String,

    pub followers: Vec<User>,
    pub following: Vec<User>,

    /// Remote `not_followed_back`, absent for local snapshots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_mutual: Option<Vec<User>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_following: Option<Vec<User>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutuals: Option<Vec<User>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// SHA-256 of the raw exports this snapshot was built from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,

    /// Capture time, epoch milliseconds on the wire
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

fn default_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl StoredData {
    pub fn new(followers: Vec<User>, following: Vec<User>) -> Self {
        StoredData {
            id: default_uuid(),
            followers,
            following,
            not_mutual: None,
            not_following: None,
            mutuals: None,
            username: None,
            fingerprint: None,
            timestamp: Utc::now(),
        }
    }

    /// Builder pattern: attach derived lists trusted from a remote source
    pub fn with_remote_lists(
        mut self,
        not_mutual: Vec<User>,
        not_following: Vec<User>,
        mutuals: Vec<User>,
    ) -> Self {
        self.not_mutual = Some(not_mutual);
        self.not_following = Some(not_following);
        self.mutuals = Some(mutuals);
        self
    }

    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: String) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }
}

/// Fingerprint of a pair of raw exports, used to spot re-uploads
pub fn compute_fingerprint(followers_raw: &str, following_raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(followers_raw.as_bytes());
    hasher.update([0u8]);
    hasher.update(following_raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// STORE INTERFACE
// ============================================================================

/// Persistence for the single analysis record
pub trait FollowStore {
    /// Stored record, or None if nothing was saved
    fn load(&self) -> Result<Option<StoredData>>;

    /// Replace the stored record
    fn save(&self, data: &StoredData) -> Result<()>;

    /// Remove the stored record (no-op if absent)
    fn clear(&self) -> Result<()>;
}

// ============================================================================
// SQLITE STORE
// ============================================================================

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {:?}", path))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteStore { conn })
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS follow_snapshots (
            storage_key TEXT PRIMARY KEY,
            snapshot_id TEXT NOT NULL,
            data TEXT NOT NULL,
            saved_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

impl FollowStore for SqliteStore {
    fn load(&self) -> Result<Option<StoredData>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM follow_snapshots WHERE storage_key = ?1",
                params![STORAGE_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(json) => {
                let data = serde_json::from_str(&json).context("Failed to decode stored snapshot")?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    fn save(&self, data: &StoredData) -> Result<()> {
        let json = serde_json::to_string(data).context("Failed to encode snapshot")?;

        self.conn.execute(
            "INSERT OR REPLACE INTO follow_snapshots (storage_key, snapshot_id, data, saved_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![STORAGE_KEY, data.id, json, data.timestamp.to_rfc3339()],
        )?;

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.conn.execute(
            "DELETE FROM follow_snapshots WHERE storage_key = ?1",
            params![STORAGE_KEY],
        )?;
        Ok(())
    }
}

// ============================================================================
// MEMORY STORE
// ============================================================================

/// In-process store, for tests and throwaway sessions
#[derive(Default)]
pub struct MemoryStore {
    slot: Mutex<Option<StoredData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FollowStore for MemoryStore {
    fn load(&self) -> Result<Option<StoredData>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(slot.clone())
    }

    fn save(&self, data: &StoredData) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        *slot = Some(data.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        *slot = None;
        Ok(())
    }
}
