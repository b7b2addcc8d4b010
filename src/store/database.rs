//! SQLite-backed record store.
//!
//! # Schema
//!
//! ```sql
//! TABLE files  (path TEXT NOT NULL UNIQUE, hash TEXT NOT NULL, size INTEGER NOT NULL)
//! INDEX hash_i ON files(hash)
//! TABLE result (groupId TEXT NOT NULL, path TEXT NOT NULL, size INTEGER NOT NULL)
//! ```
//!
//! An extra unique index on `result(groupId, path)` makes group membership
//! writes idempotent without changing the table layout.
//!
//! # Example
//!
//! ```
//! use drydupe::store::RecordStore;
//!
//! let mut store = RecordStore::new();
//! store.open_in_memory().unwrap();
//!
//! store.record_file("/a/1.txt", "H1", 10).unwrap();
//! store.record_file("/a/2.txt", "H1", 10).unwrap();
//! store.record_file("/a/3.txt", "H2", 5).unwrap();
//!
//! assert_eq!(store.duplicate_hashes().unwrap(), vec!["H1".to_string()]);
//! assert_eq!(store.files_for_hash("H1").unwrap().len(), 2);
//!
//! store.close().unwrap();
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{ffi, params, Connection, OptionalExtension, Row};
use thiserror::Error;

use super::record::{FileRecord, ResultRecord};

/// Schema statements. Every statement is guarded so the setup can be replayed
/// against an existing store.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS files (
        path TEXT NOT NULL UNIQUE,
        hash TEXT NOT NULL,
        size INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS hash_i ON files (hash);
    CREATE TABLE IF NOT EXISTS result (
        groupId TEXT NOT NULL,
        path TEXT NOT NULL,
        size INTEGER NOT NULL
    );
    CREATE UNIQUE INDEX IF NOT EXISTS result_member_i ON result (groupId, path);
";

/// Errors produced by the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An operation was attempted before the store was opened.
    #[error("record store is not open")]
    NotOpen,

    /// The backing database could not be created or opened.
    #[error("failed to open record store at {path}: {source}")]
    Open {
        /// Location of the backing database
        path: PathBuf,
        /// The underlying SQLite error
        #[source]
        source: rusqlite::Error,
    },

    /// A file record with the same path was already stored.
    #[error("path already recorded: {0}")]
    DuplicatePath(String),

    /// A group membership referenced a path that was never recorded.
    #[error("path was never recorded: {0}")]
    UnknownPath(String),

    /// A group membership referenced a file whose hash differs from the group's.
    #[error("file {path} has hash {hash}, not group {group_id}")]
    GroupMismatch {
        /// Group the caller tried to add the file to
        group_id: String,
        /// Path of the file
        path: String,
        /// Hash stored for the file
        hash: String,
    },

    /// A group membership carried a size different from the recorded file's.
    #[error("file {path} was recorded with size {recorded}, not {given}")]
    SizeMismatch {
        /// Path of the file
        path: String,
        /// Size stored in `files`
        recorded: u64,
        /// Size the caller passed
        given: u64,
    },

    /// A size does not fit in an SQLite integer.
    #[error("size {0} is out of range for the record store")]
    SizeOutOfRange(u64),

    /// I/O error while preparing an export target.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other SQLite failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result alias for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Relational bookkeeping of scanned files and duplicate group memberships.
///
/// A freshly constructed store is closed; every operation other than
/// [`close`](Self::close) fails with [`StoreError::NotOpen`] until
/// [`open`](Self::open) or [`open_in_memory`](Self::open_in_memory) succeeds.
#[derive(Debug, Default)]
pub struct RecordStore {
    conn: Option<Connection>,
    path: Option<PathBuf>,
}

impl RecordStore {
    /// Create a closed store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store and open it at `path` in one step.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] if the database cannot be created or opened.
    pub fn with_path(path: impl AsRef<Path>) -> StoreResult<Self> {
        let mut store = Self::new();
        store.open(path)?;
        Ok(store)
    }

    /// Open or create the backing database at `path` and establish the schema.
    ///
    /// A store that is already open is closed first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] when the file cannot be created (missing
    /// directory, permissions) or is not a usable SQLite database.
    pub fn open(&mut self, path: impl AsRef<Path>) -> StoreResult<()> {
        let path = path.as_ref();
        self.close()?;

        let conn = Connection::open(path)
            .and_then(|conn| prepare_connection(&conn).map(|()| conn))
            .map_err(|source| StoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        log::debug!("Record store opened at {}", path.display());
        self.conn = Some(conn);
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] if SQLite cannot allocate the database.
    pub fn open_in_memory(&mut self) -> StoreResult<()> {
        self.close()?;

        let conn = Connection::open_in_memory()
            .and_then(|conn| prepare_connection(&conn).map(|()| conn))
            .map_err(|source| StoreError::Open {
                path: PathBuf::from(":memory:"),
                source,
            })?;

        log::debug!("Record store opened in memory");
        self.conn = Some(conn);
        Ok(())
    }

    /// Whether the store currently holds an open connection.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Location of the backing database, if it is file-backed and open.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Create the `files` and `result` tables and their indexes.
    ///
    /// [`open`](Self::open) already does this; calling it again is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotOpen`] or the underlying database error.
    pub fn ensure_schema(&self) -> StoreResult<()> {
        let conn = self.connection()?;
        create_schema(conn)?;
        Ok(())
    }

    /// Insert one file record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicatePath`] if `path` is already stored. The
    /// failed insert leaves no row behind.
    pub fn record_file(&self, path: &str, hash: &str, size: u64) -> StoreResult<()> {
        let conn = self.connection()?;
        insert_file(conn, path, hash, size)
    }

    /// Insert a batch of file records in a single transaction.
    ///
    /// Either every record is stored or none is.
    ///
    /// # Errors
    ///
    /// Same as [`record_file`](Self::record_file); the first failure rolls
    /// back the whole batch.
    pub fn record_files<'a, I>(&mut self, records: I) -> StoreResult<usize>
    where
        I: IntoIterator<Item = &'a FileRecord>,
    {
        let conn = self.connection_mut()?;
        let tx = conn.transaction()?;
        let mut count = 0;
        for record in records {
            insert_file(&tx, &record.path, &record.hash, record.size)?;
            count += 1;
        }
        tx.commit()?;
        log::debug!("Recorded {} files", count);
        Ok(count)
    }

    /// Hashes shared by two or more file records.
    ///
    /// Callers must not rely on the order of the returned hashes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotOpen`] or the underlying database error.
    pub fn duplicate_hashes(&self) -> StoreResult<Vec<String>> {
        let conn = self.connection()?;
        let mut stmt =
            conn.prepare("SELECT hash FROM files GROUP BY hash HAVING COUNT(*) > 1 ORDER BY hash")?;
        let hashes = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(hashes)
    }

    /// Every file record carrying `hash`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotOpen`] or the underlying database error.
    pub fn files_for_hash(&self, hash: &str) -> StoreResult<Vec<FileRecord>> {
        let conn = self.connection()?;
        let mut stmt =
            conn.prepare("SELECT path, hash, size FROM files WHERE hash = ?1 ORDER BY path")?;
        let files = stmt
            .query_map(params![hash], |row| {
                Ok(FileRecord {
                    path: row.get(0)?,
                    hash: row.get(1)?,
                    size: size_column(row, 2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(files)
    }

    /// Append one group membership.
    ///
    /// Returns `false` when the `(group_id, path)` pair was already stored;
    /// repeated calls never duplicate a row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownPath`] if `path` was never recorded,
    /// [`StoreError::GroupMismatch`] if its hash is not `group_id` and
    /// [`StoreError::SizeMismatch`] if `size` differs from the recorded one.
    pub fn record_group(&self, group_id: &str, path: &str, size: u64) -> StoreResult<bool> {
        let conn = self.connection()?;
        insert_result(conn, group_id, path, size)
    }

    /// Append several group memberships in a single transaction.
    ///
    /// Returns the records that were newly inserted, in input order.
    ///
    /// # Errors
    ///
    /// Same as [`record_group`](Self::record_group); the first failure rolls
    /// back the whole batch.
    pub fn record_groups<'a, I>(&mut self, records: I) -> StoreResult<Vec<ResultRecord>>
    where
        I: IntoIterator<Item = &'a ResultRecord>,
    {
        let conn = self.connection_mut()?;
        let tx = conn.transaction()?;
        let mut inserted = Vec::new();
        for record in records {
            if insert_result(&tx, &record.group_id, &record.path, record.size)? {
                inserted.push(record.clone());
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// All group memberships, ordered by group then path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotOpen`] or the underlying database error.
    pub fn results(&self) -> StoreResult<Vec<ResultRecord>> {
        let conn = self.connection()?;
        let mut stmt =
            conn.prepare("SELECT groupId, path, size FROM result ORDER BY groupId, path")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ResultRecord {
                    group_id: row.get(0)?,
                    path: row.get(1)?,
                    size: size_column(row, 2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Number of stored file records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotOpen`] or the underlying database error.
    pub fn file_count(&self) -> StoreResult<u64> {
        let conn = self.connection()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Write a compacted copy of the whole store to `dest`.
    ///
    /// An existing file at `dest` is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotOpen`], an I/O error removing the old file, or
    /// the database error from the copy.
    pub fn export_to(&self, dest: impl AsRef<Path>) -> StoreResult<()> {
        let conn = self.connection()?;
        let dest = dest.as_ref();
        if dest.exists() {
            log::debug!("Replacing existing export at {}", dest.display());
            fs::remove_file(dest)?;
        }
        conn.execute("VACUUM INTO ?1", params![dest.to_string_lossy().into_owned()])?;
        log::debug!("Record store exported to {}", dest.display());
        Ok(())
    }

    /// Release the connection.
    ///
    /// Closing a store that is not open, or closing twice, is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the SQLite error if the connection failed to close cleanly. The
    /// connection is released either way.
    pub fn close(&mut self) -> StoreResult<()> {
        self.path = None;
        match self.conn.take() {
            Some(conn) => conn.close().map_err(|(_, e)| StoreError::Database(e)),
            None => Ok(()),
        }
    }

    fn connection(&self) -> StoreResult<&Connection> {
        self.conn.as_ref().ok_or(StoreError::NotOpen)
    }

    fn connection_mut(&mut self) -> StoreResult<&mut Connection> {
        self.conn.as_mut().ok_or(StoreError::NotOpen)
    }
}

impl Drop for RecordStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Failed to close record store: {}", e);
        }
    }
}

fn prepare_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA synchronous = NORMAL;
         PRAGMA temp_store = MEMORY;",
    )?;
    create_schema(conn)
}

fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(SCHEMA)?;
    tx.commit()?;
    log::trace!("Record store schema ensured");
    Ok(())
}

fn insert_file(conn: &Connection, path: &str, hash: &str, size: u64) -> StoreResult<()> {
    let size = sql_size(size)?;
    match conn.execute(
        "INSERT INTO files (path, hash, size) VALUES (?1, ?2, ?3)",
        params![path, hash, size],
    ) {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Err(StoreError::DuplicatePath(path.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

fn insert_result(conn: &Connection, group_id: &str, path: &str, size: u64) -> StoreResult<bool> {
    let db_size = sql_size(size)?;
    let recorded: Option<(String, i64)> = conn
        .query_row(
            "SELECT hash, size FROM files WHERE path = ?1",
            params![path],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match recorded {
        None => return Err(StoreError::UnknownPath(path.to_string())),
        Some((hash, _)) if hash != group_id => {
            return Err(StoreError::GroupMismatch {
                group_id: group_id.to_string(),
                path: path.to_string(),
                hash,
            })
        }
        Some((_, recorded)) if recorded != db_size => {
            return Err(StoreError::SizeMismatch {
                path: path.to_string(),
                recorded: u64::try_from(recorded).unwrap_or_default(),
                given: size,
            })
        }
        Some(_) => {}
    }

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO result (groupId, path, size) VALUES (?1, ?2, ?3)",
        params![group_id, path, db_size],
    )?;
    if inserted == 0 {
        log::trace!("Group membership already recorded: {} in {}", path, group_id);
    }
    Ok(inserted == 1)
}

fn sql_size(size: u64) -> StoreResult<i64> {
    i64::try_from(size).map_err(|_| StoreError::SizeOutOfRange(size))
}

fn size_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let value: i64 = row.get(idx)?;
    u64::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, value))
}
