use super::store::{missing_table, MemoryState};
use crate::errors::{ErrorKind, StrataError, StrataResult};
use crate::store::StoreSession;
use im::OrdMap;
use parking_lot::{ArcMutexGuard, RawMutex};
use std::path::Path;

/// Session over an [`super::InMemoryStore`].
///
/// Works on a staged copy of the committed state while holding the store's
/// mutex. `commit` swaps the staged copy in, anything else throws it away.
pub struct MemorySession {
    guard: ArcMutexGuard<RawMutex, MemoryState>,
    staged: MemoryState,
}

impl MemorySession {
    pub(crate) fn new(guard: ArcMutexGuard<RawMutex, MemoryState>) -> MemorySession {
        let staged = (*guard).clone();
        MemorySession { guard, staged }
    }

    /// Creates an empty table. Fails when the table already exists.
    pub fn create_table(&mut self, name: &str) -> StrataResult<()> {
        if self.staged.tables.contains_key(name) {
            log::error!("Table {} already exists", name);
            return Err(StrataError::new(
                &format!("Table {} already exists", name),
                ErrorKind::InvalidOperation,
            ));
        }
        self.staged.tables.insert(name.to_string(), OrdMap::new());
        Ok(())
    }

    pub fn drop_table(&mut self, name: &str) -> StrataResult<()> {
        match self.staged.tables.remove(name) {
            Some(_) => Ok(()),
            None => Err(missing_table(name)),
        }
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.staged.tables.contains_key(name)
    }

    /// Inserts or replaces a row, returning the previous value.
    pub fn put(&mut self, table: &str, key: &str, value: &str) -> StrataResult<Option<String>> {
        let rows = self.table_mut(table)?;
        Ok(rows.insert(key.to_string(), value.to_string()))
    }

    pub fn get(&self, table: &str, key: &str) -> StrataResult<Option<String>> {
        match self.staged.tables.get(table) {
            Some(rows) => Ok(rows.get(key).cloned()),
            None => Err(missing_table(table)),
        }
    }

    pub fn remove(&mut self, table: &str, key: &str) -> StrataResult<Option<String>> {
        let rows = self.table_mut(table)?;
        Ok(rows.remove(key))
    }

    pub fn keys(&self, table: &str) -> StrataResult<Vec<String>> {
        match self.staged.tables.get(table) {
            Some(rows) => Ok(rows.keys().cloned().collect()),
            None => Err(missing_table(table)),
        }
    }

    fn table_mut(&mut self, table: &str) -> StrataResult<&mut OrdMap<String, String>> {
        match self.staged.tables.get_mut(table) {
            Some(rows) => Ok(rows),
            None => Err(missing_table(table)),
        }
    }
}

impl StoreSession for MemorySession {
    fn schema_version(&self) -> StrataResult<u32> {
        Ok(self.staged.schema_version)
    }

    fn set_schema_version(&mut self, version: u32) -> StrataResult<()> {
        self.staged.schema_version = version;
        Ok(())
    }

    fn schedule_removal(&mut self, path: &Path) -> StrataResult<()> {
        if self.staged.removals.values().any(|queued| queued == path) {
            return Ok(());
        }
        self.staged.next_removal_id += 1;
        let id = self.staged.next_removal_id;
        self.staged.removals.insert(id, path.to_path_buf());
        Ok(())
    }

    fn commit(mut self) -> StrataResult<()> {
        *self.guard = std::mem::take(&mut self.staged);
        Ok(())
    }

    fn rollback(self) -> StrataResult<()> {
        // the staged copy is dropped together with the guard
        Ok(())
    }
}
