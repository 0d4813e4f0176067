use crate::config::SqliteConfig;
use crate::error::{to_strata_error, SqliteAdapterError, SqliteAdapterResult};
use crate::session::SqliteSession;
use dashmap::DashSet;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use secure_string::SecureString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};
use strata::errors::StrataResult;
use strata::store::{PendingRemoval, SchemaStore};

/// Database files currently held open by a [`SqliteStore`] in this process.
static OPEN_DATABASES: LazyLock<DashSet<String>> = LazyLock::new(DashSet::new);

static MEMORY_STORE_COUNTER: AtomicU64 = AtomicU64::new(0);

const BOOKKEEPING_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS strata_meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS strata_pending_removals (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        path TEXT NOT NULL UNIQUE
    );";

/// SQLite implementation of [`SchemaStore`].
///
/// The schema version lives in `PRAGMA user_version`, so it is written in the
/// same transaction as the migration it records. The slot is a signed 32-bit
/// integer, so versions above `i32::MAX` are rejected. Strata bookkeeping is
/// kept in the `strata_meta` and `strata_pending_removals` tables.
///
/// Only one live store per database file is allowed in a process. The path is
/// resolved once, so different spellings of one file count as the same
/// database. Opening a second one fails with `OpenFailure` until the first is
/// closed.
///
/// An empty database path gives a private in-memory database whose contents
/// are lost on close.
#[derive(Clone)]
pub struct SqliteStore {
    inner: Arc<SqliteStoreInner>,
}

impl SqliteStore {
    pub fn new(config: SqliteConfig) -> SqliteStore {
        SqliteStore {
            inner: Arc::new(SqliteStoreInner::new(config)),
        }
    }

    pub fn config(&self) -> &SqliteConfig {
        &self.inner.config
    }

    /// Runs `f` against the open connection.
    ///
    /// Blocks while a migration session is in progress.
    pub fn with_connection<R>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<R>,
    ) -> StrataResult<R> {
        let guard = self.inner.connection.lock();
        let conn = guard.as_ref().ok_or(SqliteAdapterError::Closed).map_err(to_strata_error)?;
        f(conn).map_err(to_strata_error)
    }
}

impl SchemaStore for SqliteStore {
    type Session = SqliteSession;

    fn open_or_create(&self, secret: &SecureString) -> StrataResult<()> {
        self.inner.open(secret).map_err(to_strata_error)
    }

    fn is_closed(&self) -> StrataResult<bool> {
        Ok(self.inner.connection.lock().is_none())
    }

    fn close(&self) -> StrataResult<()> {
        self.inner.close().map_err(to_strata_error)
    }

    fn store_id(&self) -> String {
        self.inner.id.clone()
    }

    fn schema_version(&self) -> StrataResult<u32> {
        self.with_connection(|conn| Ok(read_user_version(conn)))?
            .map_err(to_strata_error)
    }

    fn read_meta(&self, key: &str) -> StrataResult<Option<String>> {
        self.with_connection(|conn| {
            conn.query_row(
                "SELECT value FROM strata_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
        })
    }

    fn write_meta(&self, key: &str, value: &str) -> StrataResult<()> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO strata_meta (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
        })?;
        Ok(())
    }

    fn begin(&self) -> StrataResult<SqliteSession> {
        let guard = self.inner.connection.lock_arc();
        match guard.as_ref() {
            Some(conn) => conn
                .execute_batch("BEGIN IMMEDIATE")
                .map_err(to_strata_error)?,
            None => return Err(to_strata_error(SqliteAdapterError::Closed)),
        }
        Ok(SqliteSession::new(guard))
    }

    fn pending_removals(&self) -> StrataResult<Vec<PendingRemoval>> {
        self.with_connection(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, path FROM strata_pending_removals ORDER BY id")?;
            let rows = stmt.query_map([], |row| {
                let path: String = row.get(1)?;
                Ok(PendingRemoval::new(row.get(0)?, PathBuf::from(path)))
            })?;
            rows.collect()
        })
    }

    fn clear_removal(&self, id: i64) -> StrataResult<()> {
        self.with_connection(|conn| {
            conn.execute(
                "DELETE FROM strata_pending_removals WHERE id = ?1",
                params![id],
            )
        })?;
        Ok(())
    }
}

struct SqliteStoreInner {
    id: String,
    path: String,
    config: SqliteConfig,
    connection: Arc<Mutex<Option<Connection>>>,
}

impl SqliteStoreInner {
    fn new(config: SqliteConfig) -> SqliteStoreInner {
        let (id, path) = if config.is_in_memory() {
            let id = format!(
                "sqlite-memory:{}",
                MEMORY_STORE_COUNTER.fetch_add(1, Ordering::Relaxed)
            );
            (id, String::new())
        } else {
            let path = canonical_path(config.db_path());
            (path.clone(), path)
        };

        SqliteStoreInner {
            id,
            path,
            config,
            connection: Arc::new(Mutex::new(None)),
        }
    }

    fn open(&self, secret: &SecureString) -> SqliteAdapterResult<()> {
        let mut slot = self.connection.lock();
        if slot.is_some() {
            return Ok(());
        }

        if !self.config.is_in_memory() && !OPEN_DATABASES.insert(self.id.clone()) {
            return Err(SqliteAdapterError::AlreadyOpen(self.id.clone()));
        }

        match self.connect(secret) {
            Ok(conn) => {
                *slot = Some(conn);
                log::debug!("Opened SQLite store {}", self.id);
                Ok(())
            }
            Err(e) => {
                OPEN_DATABASES.remove(&self.id);
                Err(e)
            }
        }
    }

    fn connect(&self, secret: &SecureString) -> SqliteAdapterResult<Connection> {
        let conn = if self.config.is_in_memory() {
            Connection::open_in_memory()?
        } else {
            Connection::open(&self.path)?
        };

        apply_key(&conn, &self.config, secret)?;
        conn.busy_timeout(self.config.busy_timeout())?;
        run_pragma(
            &conn,
            &format!("PRAGMA journal_mode = {}", self.config.journal_mode()),
        )?;
        conn.pragma_update(None, "foreign_keys", self.config.foreign_keys())?;

        // first read of the file, fails here on a wrong key or a corrupt file
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })?;

        conn.execute_batch(BOOKKEEPING_TABLES)?;
        Ok(conn)
    }

    fn close(&self) -> SqliteAdapterResult<()> {
        let conn = self.connection.lock().take();
        if let Some(conn) = conn {
            OPEN_DATABASES.remove(&self.id);
            conn.close().map_err(|(_, err)| SqliteAdapterError::Sqlite(err))?;
            log::debug!("Closed SQLite store {}", self.id);
        }
        Ok(())
    }
}

impl Drop for SqliteStoreInner {
    fn drop(&mut self) {
        if self.connection.lock().take().is_some() {
            OPEN_DATABASES.remove(&self.id);
        }
    }
}

#[cfg(feature = "sqlcipher")]
fn apply_key(
    conn: &Connection,
    config: &SqliteConfig,
    secret: &SecureString,
) -> SqliteAdapterResult<()> {
    let key = secret.unsecure().replace('\'', "''");
    run_pragma(conn, &format!("PRAGMA key = '{}'", key))?;
    run_pragma(
        conn,
        &format!("PRAGMA cipher_page_size = {}", config.cipher_page_size()),
    )?;
    run_pragma(conn, &format!("PRAGMA kdf_iter = {}", config.kdf_iter()))?;
    Ok(())
}

#[cfg(not(feature = "sqlcipher"))]
fn apply_key(
    _conn: &Connection,
    _config: &SqliteConfig,
    _secret: &SecureString,
) -> SqliteAdapterResult<()> {
    Ok(())
}

/// Resolves `path` to one spelling per file, so aliases such as `dir/./m.db`
/// share the open-file registry entry and the store lock. The file itself may
/// not exist yet, in which case only its directory is resolved.
fn canonical_path(path: &str) -> String {
    let raw = Path::new(path);
    if let Ok(resolved) = raw.canonicalize() {
        return resolved.to_string_lossy().into_owned();
    }

    let (Some(parent), Some(name)) = (raw.parent(), raw.file_name()) else {
        return path.to_string();
    };
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    match parent.canonicalize() {
        Ok(dir) => dir.join(name).to_string_lossy().into_owned(),
        Err(err) => {
            log::warn!("Cannot resolve directory of {}: {}", path, err);
            path.to_string()
        }
    }
}

/// Runs a pragma and discards whatever rows it returns.
fn run_pragma(conn: &Connection, sql: &str) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    while rows.next()?.is_some() {}
    Ok(())
}

pub(crate) fn read_user_version(conn: &Connection) -> SqliteAdapterResult<u32> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    u32::try_from(version).map_err(|_| SqliteAdapterError::InvalidVersion(version))
}

pub(crate) fn write_user_version(conn: &Connection, version: u32) -> SqliteAdapterResult<()> {
    // user_version is a signed 32-bit slot, larger values are silently dropped
    if i32::try_from(version).is_err() {
        return Err(SqliteAdapterError::InvalidVersion(i64::from(version)));
    }
    conn.execute_batch(&format!("PRAGMA user_version = {}", version))?;
    Ok(())
}
