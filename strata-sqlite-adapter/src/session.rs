use crate::error::{to_strata_error, SqliteAdapterError};
use crate::store::{read_user_version, write_user_version};
use parking_lot::{ArcMutexGuard, RawMutex};
use rusqlite::{params, Connection, Params};
use std::path::Path;
use strata::errors::StrataResult;
use strata::store::StoreSession;

/// A `BEGIN IMMEDIATE` transaction on a [`crate::SqliteStore`].
///
/// The session owns the store's connection lock, so nothing else in the
/// process can touch the database until it is committed, rolled back or
/// dropped. Dropping an open session rolls it back.
pub struct SqliteSession {
    guard: ArcMutexGuard<RawMutex, Option<Connection>>,
}

impl SqliteSession {
    pub(crate) fn new(guard: ArcMutexGuard<RawMutex, Option<Connection>>) -> SqliteSession {
        SqliteSession { guard }
    }

    fn connection(&self) -> StrataResult<&Connection> {
        self.guard
            .as_ref()
            .ok_or(SqliteAdapterError::Closed)
            .map_err(to_strata_error)
    }

    pub fn execute_batch(&self, sql: &str) -> StrataResult<()> {
        self.connection()?
            .execute_batch(sql)
            .map_err(to_strata_error)
    }

    /// Runs one statement and returns the number of changed rows.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> StrataResult<usize> {
        self.connection()?
            .execute(sql, params)
            .map_err(to_strata_error)
    }

    pub fn with_connection<R>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<R>,
    ) -> StrataResult<R> {
        f(self.connection()?).map_err(to_strata_error)
    }

    pub fn has_table(&self, name: &str) -> StrataResult<bool> {
        let count: i64 = self.with_connection(|conn| {
            conn.query_row(
                "SELECT count(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
                params![name],
                |row| row.get(0),
            )
        })?;
        Ok(count > 0)
    }

    pub fn has_column(&self, table: &str, column: &str) -> StrataResult<bool> {
        let count: i64 = self.with_connection(|conn| {
            conn.query_row(
                "SELECT count(*) FROM pragma_table_info(?1) WHERE name = ?2",
                params![table, column],
                |row| row.get(0),
            )
        })?;
        Ok(count > 0)
    }
}

impl StoreSession for SqliteSession {
    fn schema_version(&self) -> StrataResult<u32> {
        read_user_version(self.connection()?).map_err(to_strata_error)
    }

    fn set_schema_version(&mut self, version: u32) -> StrataResult<()> {
        write_user_version(self.connection()?, version).map_err(to_strata_error)
    }

    fn schedule_removal(&mut self, path: &Path) -> StrataResult<()> {
        let path = path.to_string_lossy().into_owned();
        self.execute(
            "INSERT OR IGNORE INTO strata_pending_removals (path) VALUES (?1)",
            params![path],
        )?;
        Ok(())
    }

    fn commit(self) -> StrataResult<()> {
        self.execute_batch("COMMIT")
    }

    fn rollback(self) -> StrataResult<()> {
        self.execute_batch("ROLLBACK")
    }
}

impl Drop for SqliteSession {
    fn drop(&mut self) {
        if let Some(conn) = self.guard.as_ref() {
            if !conn.is_autocommit() {
                if let Err(e) = conn.execute_batch("ROLLBACK") {
                    log::error!("Failed to roll back abandoned session: {}", e);
                }
            }
        }
    }
}
