use parking_lot::{RwLock, RwLockWriteGuard};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

/// Process-wide registry of store locks, keyed by `SchemaStore::store_id`.
///
/// The open path holds the write lock of a store from the durable version read
/// until the post-migration sweep has finished, so two handles to the same
/// store inside one process never migrate it at the same time. Entries are
/// released when a handle closes its store.
pub(crate) static STORE_LOCKS: LazyLock<LockRegistry> = LazyLock::new(LockRegistry::new);

/// A handle to a read-write lock that can be stored and reused
pub struct LockHandle {
    lock: Arc<RwLock<()>>,
}

impl LockHandle {
    /// Acquires a write lock
    pub fn write(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write()
    }
}

/// Registry for managing named read-write locks.
///
/// Uses `parking_lot`'s poison-free locks. Handles returned for the same name
/// share one underlying lock.
///
/// # Examples
///
/// ```
/// use strata::common::LockRegistry;
/// let lock_registry = LockRegistry::new();
/// let lock = lock_registry.get_lock("/data/messenger.db");
/// {
///     let _write_guard = lock.write();
/// } // Write lock is held while _write_guard is in scope
/// ```
#[derive(Clone)]
pub struct LockRegistry {
    locks: Arc<RwLock<HashMap<String, Arc<RwLock<()>>>>>,
}

impl LockRegistry {
    /// Creates a new empty lock registry.
    pub fn new() -> Self {
        LockRegistry {
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Gets the lock for the given name, creating it on first use.
    pub fn get_lock(&self, name: &str) -> LockHandle {
        let lock = {
            let mut locks = self.locks.write();
            locks
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(RwLock::new(())))
                .clone()
        };
        LockHandle { lock }
    }

    /// Drops the lock for `name` unless a [`LockHandle`] to it is still alive.
    ///
    /// Returns true when the entry was removed. Handles are only given out
    /// under the registry's write lock, so a lock that is pruned here has no
    /// holder and the next `get_lock` starts a fresh one.
    pub fn release(&self, name: &str) -> bool {
        let mut locks = self.locks.write();
        match locks.get(name) {
            Some(lock) if Arc::strong_count(lock) == 1 => locks.remove(name).is_some(),
            _ => false,
        }
    }

    /// Returns the number of locks currently registered.
    pub fn lock_count(&self) -> usize {
        let locks = self.locks.read();
        locks.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.locks.read().contains_key(name)
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
