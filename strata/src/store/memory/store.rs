use super::MemorySession;
use crate::common::MEMORY_STORE_PREFIX;
use crate::errors::{ErrorKind, StrataError, StrataResult};
use crate::store::{PendingRemoval, SchemaStore};
use im::OrdMap;
use parking_lot::Mutex;
use secure_string::SecureString;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Committed contents of an [`InMemoryStore`].
///
/// Built on persistent maps, so cloning a snapshot for a session is cheap and
/// a commit is a single swap.
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryState {
    pub(crate) schema_version: u32,
    pub(crate) meta: OrdMap<String, String>,
    pub(crate) tables: OrdMap<String, OrdMap<String, String>>,
    pub(crate) removals: OrdMap<i64, PathBuf>,
    pub(crate) next_removal_id: i64,
}

/// In-process implementation of [`SchemaStore`].
///
/// Useful for tests and for stores that do not need to outlive the process.
/// Clones share state, so closing one clone and opening another behaves like
/// reopening the same database.
///
/// # Usage
/// ```text
/// let store = InMemoryStore::new();
/// store.open_or_create(&SecureString::from("secret")).unwrap();
/// let mut session = store.begin().unwrap();
/// session.create_table("contacts").unwrap();
/// session.set_schema_version(1).unwrap();
/// session.commit().unwrap();
/// assert_eq!(store.schema_version().unwrap(), 1);
/// ```
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Arc<InMemoryStoreInner>,
}

impl InMemoryStore {
    pub fn new() -> InMemoryStore {
        InMemoryStore {
            inner: Arc::new(InMemoryStoreInner::new()),
        }
    }

    /// Returns true when the committed state has the given table.
    pub fn has_table(&self, name: &str) -> StrataResult<bool> {
        self.inner.ensure_open()?;
        Ok(self.inner.state.lock().tables.contains_key(name))
    }

    /// Reads one value from a committed table.
    pub fn get(&self, table: &str, key: &str) -> StrataResult<Option<String>> {
        self.inner.ensure_open()?;
        let state = self.inner.state.lock();
        match state.tables.get(table) {
            Some(rows) => Ok(rows.get(key).cloned()),
            None => Err(missing_table(table)),
        }
    }

    /// Lists the keys of a committed table in order.
    pub fn keys(&self, table: &str) -> StrataResult<Vec<String>> {
        self.inner.ensure_open()?;
        let state = self.inner.state.lock();
        match state.tables.get(table) {
            Some(rows) => Ok(rows.keys().cloned().collect()),
            None => Err(missing_table(table)),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaStore for InMemoryStore {
    type Session = MemorySession;

    fn open_or_create(&self, _secret: &SecureString) -> StrataResult<()> {
        self.inner.closed.store(false, Ordering::Release);
        log::debug!("Opened in-memory store {}", self.inner.id);
        Ok(())
    }

    fn is_closed(&self) -> StrataResult<bool> {
        Ok(self.inner.closed.load(Ordering::Acquire))
    }

    fn close(&self) -> StrataResult<()> {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            log::debug!("Closed in-memory store {}", self.inner.id);
        }
        Ok(())
    }

    fn store_id(&self) -> String {
        self.inner.id.clone()
    }

    fn schema_version(&self) -> StrataResult<u32> {
        self.inner.ensure_open()?;
        Ok(self.inner.state.lock().schema_version)
    }

    fn read_meta(&self, key: &str) -> StrataResult<Option<String>> {
        self.inner.ensure_open()?;
        Ok(self.inner.state.lock().meta.get(key).cloned())
    }

    fn write_meta(&self, key: &str, value: &str) -> StrataResult<()> {
        self.inner.ensure_open()?;
        self.inner
            .state
            .lock()
            .meta
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn begin(&self) -> StrataResult<MemorySession> {
        self.inner.ensure_open()?;
        let guard = self.inner.state.lock_arc();
        Ok(MemorySession::new(guard))
    }

    fn pending_removals(&self) -> StrataResult<Vec<PendingRemoval>> {
        self.inner.ensure_open()?;
        let state = self.inner.state.lock();
        Ok(state
            .removals
            .iter()
            .map(|(id, path)| PendingRemoval::new(*id, path.clone()))
            .collect())
    }

    fn clear_removal(&self, id: i64) -> StrataResult<()> {
        self.inner.ensure_open()?;
        self.inner.state.lock().removals.remove(&id);
        Ok(())
    }
}

struct InMemoryStoreInner {
    id: String,
    closed: AtomicBool,
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStoreInner {
    fn new() -> InMemoryStoreInner {
        InMemoryStoreInner {
            id: format!("{}{}", MEMORY_STORE_PREFIX, uuid::Uuid::new_v4()),
            closed: AtomicBool::new(true),
            state: Arc::new(Mutex::new(MemoryState::default())),
        }
    }

    fn ensure_open(&self) -> StrataResult<()> {
        if self.closed.load(Ordering::Acquire) {
            log::error!("In-memory store {} is closed", self.id);
            return Err(StrataError::new(
                "Store is closed",
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        Ok(())
    }
}

pub(crate) fn missing_table(table: &str) -> StrataError {
    log::error!("Table {} does not exist", table);
    StrataError::new(
        &format!("Table {} does not exist", table),
        ErrorKind::NotFound,
    )
}
