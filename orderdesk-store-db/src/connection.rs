// SPDX-FileCopyrightText: 2025 orderdesk contributors
// SPDX-License-Identifier: MIT

//! Database handle and per-call connection management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::error::{Error, IoContext, Result};

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the SQLite database holding the entity tables.
///
/// The handle only owns the database location. Each operation opens its own
/// connection and drops it before returning, so no connection outlives a
/// single request.
#[derive(Debug, Clone)]
pub struct StoreDb {
    path: PathBuf,
}

impl StoreDb {
    /// Create a handle for the database file at `path`.
    ///
    /// The parent directory is created if it doesn't exist. The database file
    /// itself is created lazily by the first connection.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_owned();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).io_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }
        Ok(Self { path })
    }

    /// Location of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a fresh connection.
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| Error::DatabaseOpen {
            path: self.path.clone(),
            source: e,
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::configure_pragmas(&conn)?;
        debug!("Opened database at {}", self.path.display());
        Ok(conn)
    }

    /// WAL lets lookups keep reading the old table while an import commits.
    fn configure_pragmas(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            "#,
        )?;
        Ok(())
    }
}

/// Quote an SQL identifier. Table and column names come from snapshot files
/// and must never be spliced in raw.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
