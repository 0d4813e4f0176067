use crate::errors::StrataResult;
use secure_string::SecureString;
use std::path::{Path, PathBuf};

/// A durable store whose schema is versioned and upgraded in place.
///
/// Implementations own three things the migration engine depends on:
///
/// * a single integer schema-version slot, read from durable state on every
///   call to [`SchemaStore::schema_version`] and written only through a
///   [`StoreSession`];
/// * a small key/value metadata area for bookkeeping (credential verifier,
///   creation time, library version);
/// * a queue of filesystem paths scheduled for removal by committed sessions.
///
/// A store is cheap to clone and every clone refers to the same underlying
/// storage.
pub trait SchemaStore: Clone + Send + Sync + 'static {
    /// The unit of work produced by [`SchemaStore::begin`].
    type Session: StoreSession;

    /// Opens the store, creating it when it does not exist yet.
    ///
    /// The secret is handed to the storage engine as is. Stores that are not
    /// encrypted ignore it.
    fn open_or_create(&self, secret: &SecureString) -> StrataResult<()>;

    /// Returns true when the store is not open.
    fn is_closed(&self) -> StrataResult<bool>;

    /// Closes the store. Closing an already closed store is a no-op.
    fn close(&self) -> StrataResult<()>;

    /// Stable identity of the underlying storage. Two handles to the same
    /// database return the same id.
    fn store_id(&self) -> String;

    /// Reads the committed schema version. A store that was never migrated
    /// reports `0`.
    fn schema_version(&self) -> StrataResult<u32>;

    /// Reads a value from the metadata area.
    fn read_meta(&self, key: &str) -> StrataResult<Option<String>>;

    /// Writes a value to the metadata area, outside of any session.
    fn write_meta(&self, key: &str, value: &str) -> StrataResult<()>;

    /// Starts the single atomic unit of work for a migration run.
    ///
    /// The returned session holds the store's write lock until it is
    /// committed, rolled back or dropped. Calling other methods of the same
    /// store from the thread that holds a session blocks.
    fn begin(&self) -> StrataResult<Self::Session>;

    /// Lists the paths queued for removal by committed sessions.
    fn pending_removals(&self) -> StrataResult<Vec<PendingRemoval>>;

    /// Removes one entry from the removal queue.
    fn clear_removal(&self, id: i64) -> StrataResult<()>;
}

/// An open transaction against a [`SchemaStore`].
///
/// Everything done through a session, including the schema version update
/// and scheduled file removals, becomes visible on [`StoreSession::commit`]
/// and is discarded on [`StoreSession::rollback`]. Dropping a session that was
/// neither committed nor rolled back rolls it back.
pub trait StoreSession {
    /// Schema version as seen inside this session.
    fn schema_version(&self) -> StrataResult<u32>;

    /// Sets the schema version that becomes durable on commit.
    fn set_schema_version(&mut self, version: u32) -> StrataResult<()>;

    /// Queues a file for removal once this session has committed.
    fn schedule_removal(&mut self, path: &Path) -> StrataResult<()>;

    fn commit(self) -> StrataResult<()>;

    fn rollback(self) -> StrataResult<()>;
}

/// A file path waiting in the removal queue of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRemoval {
    pub id: i64,
    pub path: PathBuf,
}

impl PendingRemoval {
    pub fn new(id: i64, path: impl Into<PathBuf>) -> Self {
        PendingRemoval {
            id,
            path: path.into(),
        }
    }
}
