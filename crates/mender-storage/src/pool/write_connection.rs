//! The single connection every document operation goes through.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tokio::sync::Mutex;

use mender_core::errors::{MenderResult, StoreError};

use super::pragmas::apply_pragmas;
use crate::to_storage_err;

/// Serialized access to one SQLite connection.
///
/// The slot is `None` after `close()`; calls then fail with a connectivity
/// error until `reopen()`.
pub struct WriteConnection {
    slot: Mutex<Option<Connection>>,
    path: Option<PathBuf>,
    busy_timeout_ms: u32,
}

impl WriteConnection {
    pub fn open(path: &Path, busy_timeout_ms: u32) -> MenderResult<Self> {
        let conn = Self::connect(Some(path), busy_timeout_ms)?;
        Ok(Self {
            slot: Mutex::new(Some(conn)),
            path: Some(path.to_path_buf()),
            busy_timeout_ms,
        })
    }

    /// In-memory database. Closing it discards the data.
    pub fn open_in_memory(busy_timeout_ms: u32) -> MenderResult<Self> {
        let conn = Self::connect(None, busy_timeout_ms)?;
        Ok(Self {
            slot: Mutex::new(Some(conn)),
            path: None,
            busy_timeout_ms,
        })
    }

    fn connect(path: Option<&Path>, busy_timeout_ms: u32) -> MenderResult<Connection> {
        let conn = match path {
            Some(p) => Connection::open(p),
            None => Connection::open_in_memory(),
        }
        .map_err(|e| {
            StoreError::Connectivity {
                reason: e.to_string(),
            }
        })?;
        apply_pragmas(&conn, busy_timeout_ms)?;
        Ok(conn)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` with exclusive access to the connection.
    pub async fn with_conn<F, T>(&self, f: F) -> MenderResult<T>
    where
        F: FnOnce(&mut Connection) -> MenderResult<T>,
    {
        let mut guard = self.slot.lock().await;
        match guard.as_mut() {
            Some(conn) => f(conn),
            None => Err(StoreError::Connectivity {
                reason: "database connection is closed".to_string(),
            }
            .into()),
        }
    }

    /// Blocking variant for construction-time work outside a runtime.
    pub fn with_conn_sync<F, T>(&self, f: F) -> MenderResult<T>
    where
        F: FnOnce(&mut Connection) -> MenderResult<T>,
    {
        let mut guard = self
            .slot
            .try_lock()
            .map_err(|e| to_storage_err(format!("write connection busy: {e}")))?;
        match guard.as_mut() {
            Some(conn) => f(conn),
            None => Err(StoreError::Connectivity {
                reason: "database connection is closed".to_string(),
            }
            .into()),
        }
    }

    pub async fn close(&self) {
        self.slot.lock().await.take();
    }

    /// Reconnect if closed. Returns true when a new connection was made.
    pub async fn reopen(&self) -> MenderResult<bool> {
        let mut guard = self.slot.lock().await;
        if guard.is_some() {
            return Ok(false);
        }
        *guard = Some(Self::connect(self.path.as_deref(), self.busy_timeout_ms)?);
        Ok(true)
    }
}
