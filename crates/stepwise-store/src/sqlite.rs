use std::path::Path;

use rusqlite::{Connection, OptionalExtension};
use stepwise_core::{Database, DatabaseError, VersionStore};

use crate::sql::{DatabaseBackend, VersionTable};

fn backend_error(err: rusqlite::Error) -> DatabaseError {
    DatabaseError::Backend(err.to_string())
}

/// SQLite connection acting both as the database units migrate and as the
/// version store.
///
/// Every statement runs in autocommit mode, so a version written by `set` is
/// committed before the call returns.
pub struct SqliteBackend {
    conn: Connection,
    table: VersionTable,
}

impl SqliteBackend {
    pub fn open(path: impl AsRef<Path>, version_table: &str) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(backend_error)?;
        Self::from_connection(conn, version_table)
    }

    pub fn open_in_memory(version_table: &str) -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(backend_error)?;
        Self::from_connection(conn, version_table)
    }

    /// Wrap `conn`, creating the version table with version 0 if it is missing.
    pub fn from_connection(conn: Connection, version_table: &str) -> Result<Self, DatabaseError> {
        let backend = Self {
            conn,
            table: VersionTable::new(version_table),
        };
        backend.ensure_version_table()?;
        Ok(backend)
    }

    fn ensure_version_table(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(&self.table.create(DatabaseBackend::Sqlite))
            .map_err(backend_error)?;

        if self.read_version()?.is_none() {
            tracing::debug!(table = self.table.name(), "initializing schema version table");
            self.conn
                .execute_batch(&self.table.insert(0, DatabaseBackend::Sqlite))
                .map_err(backend_error)?;
        }
        Ok(())
    }

    fn read_version(&self) -> Result<Option<i64>, DatabaseError> {
        self.conn
            .query_row(&self.table.select(DatabaseBackend::Sqlite), [], |row| {
                row.get::<_, i64>(0)
            })
            .optional()
            .map_err(backend_error)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

impl Database for SqliteBackend {
    fn execute_batch(&mut self, sql: &str) -> Result<(), DatabaseError> {
        self.conn.execute_batch(sql).map_err(backend_error)
    }
}

impl VersionStore for SqliteBackend {
    fn get(&mut self) -> Result<u32, DatabaseError> {
        match self.read_version()? {
            Some(raw) => u32::try_from(raw).map_err(|_| DatabaseError::InvalidVersion(raw)),
            None => Ok(0),
        }
    }

    fn set(&mut self, version: u32) -> Result<(), DatabaseError> {
        tracing::debug!(table = self.table.name(), version, "storing schema version");
        let sql = if self.read_version()?.is_some() {
            self.table.update(version, DatabaseBackend::Sqlite)
        } else {
            self.table.insert(version, DatabaseBackend::Sqlite)
        };
        self.conn.execute_batch(&sql).map_err(backend_error)
    }
}
