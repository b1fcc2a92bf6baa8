pub mod conversations;
pub mod error;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod notifications;
pub mod prefs;
pub mod users;

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;
use tracing::info;

pub use error::StoreError;

const READER_POOL_SIZE: usize = 4;

/// Messaging core database with a reader/writer split: one writer
/// connection (behind a mutex, so write transactions serialize) plus a
/// small pool of read-only connections rotated round-robin.
pub struct Database {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    reader_idx: AtomicUsize,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let writer = Connection::open(path)?;

        // WAL mode for concurrent reads
        writer.pragma_update(None, "journal_mode", "WAL")?;
        writer.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&writer)?;

        let mut readers = Vec::with_capacity(READER_POOL_SIZE);
        for _ in 0..READER_POOL_SIZE {
            let conn = Connection::open_with_flags(
                path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            conn.pragma_update(None, "journal_mode", "WAL")?;
            readers.push(Mutex::new(conn));
        }

        info!(
            "Database opened at {} (1 writer + {} readers)",
            path.display(),
            READER_POOL_SIZE
        );
        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            reader_idx: AtomicUsize::new(0),
        })
    }

    /// Run a read-only query on one of the pooled reader connections.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let idx = self.reader_idx.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[idx]
            .lock()
            .map_err(|e| StoreError::Db(anyhow::anyhow!("Reader lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Run write work on the single writer connection. The closure gets a
    /// `&mut Connection` so it can open a real transaction when the write
    /// spans multiple statements.
    pub fn with_writer<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        let mut conn = self
            .writer
            .lock()
            .map_err(|e| StoreError::Db(anyhow::anyhow!("Writer lock poisoned: {}", e)))?;
        f(&mut conn)
    }
}

/// Timestamps are stored as RFC 3339 UTC text with microsecond precision,
/// so lexicographic column order matches chronological order.
pub(crate) fn now_ts() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
