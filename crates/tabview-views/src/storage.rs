//! Saved view storage using SQLite
//!
//! Snapshots are serialized to JSON inside the row, so the table schema
//! stays stable as the snapshot shape evolves.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use uuid::Uuid;

use tabview_core::{Result, TabViewError};

use crate::model::{SavedView, ViewSnapshot};
use crate::store::{ViewStore, validate_view_name};

fn db_err(e: rusqlite::Error) -> TabViewError {
    TabViewError::Storage(e.to_string())
}

/// Handle for database connections - either owned or shared
enum ConnectionHandle {
    Owned(Connection),
    Shared(Arc<Mutex<Connection>>),
}

impl ConnectionHandle {
    fn with_conn<T, F: FnOnce(&Connection) -> Result<T>>(&self, f: F) -> Result<T> {
        match self {
            ConnectionHandle::Owned(conn) => f(conn),
            ConnectionHandle::Shared(arc) => {
                let guard = arc
                    .lock()
                    .map_err(|e| TabViewError::Storage(format!("lock poisoned: {}", e)))?;
                f(&guard)
            }
        }
    }
}

/// SQLite-backed view store
pub struct SqliteViewStore {
    db_path: PathBuf,
    /// Holds the connection for in-memory databases (where each open
    /// creates a new db)
    memory_conn: Option<Arc<Mutex<Connection>>>,
}

impl SqliteViewStore {
    /// Open or create storage at the given path
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self {
            db_path,
            memory_conn: None,
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory store for testing
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        let store = Self {
            db_path: PathBuf::from(":memory:"),
            memory_conn: Some(Arc::new(Mutex::new(conn))),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn connect(&self) -> Result<ConnectionHandle> {
        if let Some(ref conn) = self.memory_conn {
            Ok(ConnectionHandle::Shared(conn.clone()))
        } else {
            let conn = Connection::open(&self.db_path).map_err(|e| {
                TabViewError::Storage(format!(
                    "failed to open database at {:?}: {}",
                    self.db_path, e
                ))
            })?;
            Ok(ConnectionHandle::Owned(conn))
        }
    }

    fn initialize_schema(&self) -> Result<()> {
        let handle = self.connect()?;
        handle.with_conn(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS saved_views (
                    id TEXT PRIMARY KEY,
                    scope TEXT NOT NULL,
                    name TEXT NOT NULL,
                    description TEXT,
                    snapshot_json TEXT NOT NULL DEFAULT '{}',
                    created_at TEXT NOT NULL
                )",
                [],
            )
            .map_err(db_err)?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_saved_views_scope
                 ON saved_views(scope)",
                [],
            )
            .map_err(db_err)?;
            Ok(())
        })
    }

    fn row_to_view(
        id_str: String,
        name: String,
        description: Option<String>,
        snapshot_json: String,
        created_at: String,
    ) -> Result<SavedView> {
        let id = Uuid::parse_str(&id_str)
            .map_err(|e| TabViewError::Storage(format!("bad view id '{}': {}", id_str, e)))?;
        let snapshot: ViewSnapshot = serde_json::from_str(&snapshot_json)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                TabViewError::Storage(format!("bad created_at '{}': {}", created_at, e))
            })?;
        Ok(SavedView {
            id,
            name,
            description,
            snapshot,
            created_at,
        })
    }
}

impl ViewStore for SqliteViewStore {
    fn list(&self, scope: &str) -> Result<Vec<SavedView>> {
        let handle = self.connect()?;
        let scope = scope.to_string();
        handle.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, name, description, snapshot_json, created_at
                     FROM saved_views WHERE scope = ?1 ORDER BY name ASC",
                )
                .map_err(db_err)?;

            let rows = stmt
                .query_map(params![scope], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                })
                .map_err(db_err)?;

            let mut result = Vec::new();
            for row in rows {
                let (id, name, description, snapshot_json, created_at) = row.map_err(db_err)?;
                result.push(Self::row_to_view(
                    id,
                    name,
                    description,
                    snapshot_json,
                    created_at,
                )?);
            }
            Ok(result)
        })
    }

    fn get(&self, id: &Uuid) -> Result<Option<SavedView>> {
        let handle = self.connect()?;
        let id_str = id.to_string();
        handle.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, name, description, snapshot_json, created_at
                     FROM saved_views WHERE id = ?1",
                )
                .map_err(db_err)?;

            let result = stmt.query_row(params![id_str], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            });

            match result {
                Ok((id, name, description, snapshot_json, created_at)) => Ok(Some(
                    Self::row_to_view(id, name, description, snapshot_json, created_at)?,
                )),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(db_err(e)),
            }
        })
    }

    fn create(
        &self,
        scope: &str,
        name: &str,
        description: Option<&str>,
        snapshot: ViewSnapshot,
    ) -> Result<SavedView> {
        let existing: Vec<String> = self.list(scope)?.into_iter().map(|v| v.name).collect();
        validate_view_name(name, &existing)?;

        let view = SavedView {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.map(|d| d.to_string()),
            snapshot,
            created_at: Utc::now(),
        };
        let snapshot_json = serde_json::to_string(&view.snapshot)?;

        let handle = self.connect()?;
        handle.with_conn(|conn| {
            conn.execute(
                "INSERT INTO saved_views (id, scope, name, description, snapshot_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    view.id.to_string(),
                    scope,
                    view.name,
                    view.description,
                    snapshot_json,
                    view.created_at.to_rfc3339(),
                ],
            )
            .map_err(db_err)?;
            Ok(())
        })?;

        tracing::info!("Saved view '{}' in scope '{}'", name, scope);
        Ok(view)
    }

    fn delete(&self, id: &Uuid) -> Result<bool> {
        let handle = self.connect()?;
        let id_str = id.to_string();
        let deleted = handle.with_conn(|conn| {
            let rows = conn
                .execute("DELETE FROM saved_views WHERE id = ?1", params![id_str])
                .map_err(db_err)?;
            Ok(rows > 0)
        })?;
        if deleted {
            tracing::info!("Deleted saved view {}", id);
        }
        Ok(deleted)
    }
}
