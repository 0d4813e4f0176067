use crate::common::{atomic, Atomic, CredentialService, ReadExecutor, WriteExecutor, STORE_LOCKS};
use crate::errors::{ErrorKind, StrataError, StrataResult};
use crate::metadata::StoreMetadata;
use crate::migration::{FileSweeper, MigrationReport, Migrator, SweepReport};
use crate::store::SchemaStore;
use crate::strata_builder::StrataBuilder;
use crate::strata_config::StrataConfig;
use secure_string::SecureString;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// An open, authenticated store whose schema is at the configured version.
///
/// `Strata` uses the PIMPL pattern: all clones share the same inner state,
/// and the store is closed when the last clone is dropped.
///
/// # Opening
///
/// ```rust,ignore
/// let db = Strata::builder()
///     .load_module(InMemoryStoreModule::new())
///     .migrations(registry)
///     .open_or_create(&SecureString::from("secret"))?;
///
/// assert_eq!(db.schema_version()?, registry.latest_version());
/// ```
///
/// Opening runs, in order: acquire the store, take the store's process-wide
/// lock, verify (or enroll) the secret, record creation metadata, migrate from
/// the committed version to the target, and sweep files queued for removal.
/// If any of these fails, the store is closed before the error is returned.
pub struct Strata<S: SchemaStore> {
    inner: Arc<StrataInner<S>>,
}

impl<S: SchemaStore> Strata<S> {
    pub fn builder() -> StrataBuilder<S> {
        StrataBuilder::new()
    }

    pub(crate) fn new(strata_config: StrataConfig<S>) -> Self {
        Strata {
            inner: Arc::new(StrataInner::new(strata_config)),
        }
    }

    pub fn config(&self) -> StrataConfig<S> {
        self.inner.strata_config.clone()
    }

    /// The underlying store.
    pub fn store(&self) -> StrataResult<S> {
        self.inner.store()
    }

    /// Committed schema version, read from the store.
    pub fn schema_version(&self) -> StrataResult<u32> {
        self.inner.check_opened()?.schema_version()
    }

    pub fn metadata(&self) -> StrataResult<StoreMetadata> {
        StoreMetadata::load(self.inner.check_opened()?)
    }

    /// Report of the migration run performed while opening.
    pub fn last_migration(&self) -> Option<MigrationReport> {
        self.inner.last_migration.read_with(|it| it.clone())
    }

    /// Deletes files still queued for removal.
    pub fn sweep(&self) -> StrataResult<SweepReport> {
        let store = self.inner.check_opened()?;
        let lock = STORE_LOCKS.get_lock(&store.store_id());
        let _guard = lock.write();
        FileSweeper::new(store).sweep()
    }

    pub fn close(&self) -> StrataResult<()> {
        self.inner.close()
    }

    pub fn is_closed(&self) -> StrataResult<bool> {
        self.inner.is_closed()
    }

    pub(crate) fn initialize(&self, secret: &SecureString) -> StrataResult<()> {
        if self.inner.initialized.swap(true, Ordering::AcqRel) {
            log::error!("Strata is already initialized");
            return Err(StrataError::new(
                "Strata is already initialized",
                ErrorKind::InvalidOperation,
            ));
        }

        self.inner.strata_config.initialize();
        let store = self.inner.acquire_store(secret)?;

        if let Err(err) = self.inner.open(store, secret) {
            if let Err(close_err) = shutdown(store) {
                log::error!("Failed to close store after open failure: {}", close_err);
            }
            return Err(err);
        }
        Ok(())
    }
}

impl<S: SchemaStore> Clone for Strata<S> {
    fn clone(&self) -> Self {
        Strata {
            inner: self.inner.clone(),
        }
    }
}

struct StrataInner<S: SchemaStore> {
    strata_config: StrataConfig<S>,
    store: OnceLock<S>,
    initialized: AtomicBool,
    last_migration: Atomic<Option<MigrationReport>>,
}

impl<S: SchemaStore> StrataInner<S> {
    fn new(strata_config: StrataConfig<S>) -> Self {
        StrataInner {
            strata_config,
            store: OnceLock::new(),
            initialized: AtomicBool::new(false),
            last_migration: atomic(None),
        }
    }

    fn acquire_store(&self, secret: &SecureString) -> StrataResult<&S> {
        let store = self
            .strata_config
            .store()
            .map_err(|err| as_open_failure("Failed to acquire store", err))?;

        store.open_or_create(secret).map_err(|err| {
            log::error!("Failed to open store {}: {}", store.store_id(), err);
            as_open_failure(&format!("Failed to open store {}", store.store_id()), err)
        })?;

        Ok(self.store.get_or_init(|| store))
    }

    fn open(&self, store: &S, secret: &SecureString) -> StrataResult<()> {
        let lock = STORE_LOCKS.get_lock(&store.store_id());
        let _guard = lock.write();

        CredentialService::new(store).authenticate(secret)?;
        StoreMetadata::record_creation(store)?;

        let current = store.schema_version()?;
        let target = self.strata_config.schema_version();
        let migrator = Migrator::new(self.strata_config.migrations());
        let report = migrator.migrate(store, current, target)?;
        self.last_migration.write_with(|it| *it = Some(report));

        if self.strata_config.sweep_on_open() {
            FileSweeper::new(store).sweep()?;
        }
        Ok(())
    }

    fn store(&self) -> StrataResult<S> {
        match self.store.get() {
            Some(store) => Ok(store.clone()),
            None => {
                log::error!("Store is not initialized");
                Err(StrataError::new(
                    "Store is not initialized",
                    ErrorKind::StoreNotInitialized,
                ))
            }
        }
    }

    fn check_opened(&self) -> StrataResult<&S> {
        let store = match self.store.get() {
            Some(store) => store,
            None => {
                log::error!("Store is not initialized");
                return Err(StrataError::new(
                    "Store is not initialized",
                    ErrorKind::StoreNotInitialized,
                ));
            }
        };

        if store.is_closed()? {
            log::error!("Store {} is closed", store.store_id());
            return Err(StrataError::new(
                "Store is closed",
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        Ok(store)
    }

    fn is_closed(&self) -> StrataResult<bool> {
        match self.store.get() {
            Some(store) => store.is_closed(),
            None => Ok(true),
        }
    }

    fn close(&self) -> StrataResult<()> {
        match self.store.get() {
            Some(store) => shutdown(store),
            None => Ok(()),
        }
    }
}

// Closes the store once every clone of the handle is gone.
impl<S: SchemaStore> Drop for StrataInner<S> {
    fn drop(&mut self) {
        if let Some(store) = self.store.get() {
            if let Err(err) = shutdown(store) {
                log::error!("Failed to close store {}: {}", store.store_id(), err);
            }
        }
    }
}

// Closes the store and drops its entry from the lock registry.
fn shutdown<S: SchemaStore>(store: &S) -> StrataResult<()> {
    let result = store.close();
    STORE_LOCKS.release(&store.store_id());
    result
}

fn as_open_failure(message: &str, err: StrataError) -> StrataError {
    if err.kind() == &ErrorKind::OpenFailure {
        err
    } else {
        StrataError::open_failure(message, err)
    }
}
