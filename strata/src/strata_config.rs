use crate::common::{atomic, Atomic, ReadExecutor, WriteExecutor};
use crate::errors::{ErrorKind, StrataError, StrataResult};
use crate::migration::MigrationRegistry;
use crate::store::{SchemaStore, StoreModule};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Configuration of a [`crate::Strata`] handle.
///
/// All clones share the same state. Every setter fails with
/// `InvalidOperation` once the handle has been initialized.
///
/// Defaults:
/// - target schema version: the registry's latest threshold (0 without steps)
/// - migrations: empty registry
/// - `sweep_on_open`: true
pub struct StrataConfig<S: SchemaStore> {
    inner: Arc<StrataConfigInner<S>>,
}

impl<S: SchemaStore> StrataConfig<S> {
    pub fn new() -> Self {
        StrataConfig {
            inner: Arc::new(StrataConfigInner::new()),
        }
    }

    /// Takes the store from `module`. Only one store can be loaded.
    pub fn load_module<M: StoreModule<Store = S>>(&self, module: M) -> StrataResult<()> {
        self.inner.load_module(module)
    }

    /// The store loaded through [`StrataConfig::load_module`].
    pub fn store(&self) -> StrataResult<S> {
        self.inner.store()
    }

    /// Target schema version.
    pub fn schema_version(&self) -> u32 {
        self.inner.schema_version()
    }

    pub fn set_schema_version(&self, version: u32) -> StrataResult<()> {
        self.inner.set_schema_version(version)
    }

    pub fn migrations(&self) -> MigrationRegistry<S> {
        self.inner.migrations()
    }

    pub fn set_migrations(&self, registry: MigrationRegistry<S>) -> StrataResult<()> {
        self.inner.set_migrations(registry)
    }

    pub fn sweep_on_open(&self) -> bool {
        self.inner.sweep_on_open.load(Ordering::Relaxed)
    }

    pub fn set_sweep_on_open(&self, sweep: bool) -> StrataResult<()> {
        self.inner.ensure_not_configured("Sweep policy")?;
        self.inner.sweep_on_open.store(sweep, Ordering::Relaxed);
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.inner.configured.load(Ordering::Relaxed)
    }

    /// Freezes the configuration.
    pub(crate) fn initialize(&self) {
        self.inner.configured.store(true, Ordering::Relaxed);
    }
}

impl<S: SchemaStore> Clone for StrataConfig<S> {
    fn clone(&self) -> Self {
        StrataConfig {
            inner: self.inner.clone(),
        }
    }
}

impl<S: SchemaStore> Default for StrataConfig<S> {
    fn default() -> Self {
        Self::new()
    }
}

struct StrataConfigInner<S: SchemaStore> {
    configured: AtomicBool,
    store: OnceLock<S>,
    schema_version: Atomic<Option<u32>>,
    migrations: Atomic<MigrationRegistry<S>>,
    sweep_on_open: AtomicBool,
}

impl<S: SchemaStore> StrataConfigInner<S> {
    fn new() -> Self {
        StrataConfigInner {
            configured: AtomicBool::new(false),
            store: OnceLock::new(),
            schema_version: atomic(None),
            migrations: atomic(MigrationRegistry::empty()),
            sweep_on_open: AtomicBool::new(true),
        }
    }

    fn ensure_not_configured(&self, what: &str) -> StrataResult<()> {
        if self.configured.load(Ordering::Relaxed) {
            log::error!("{} cannot be changed after initialization", what);
            return Err(StrataError::new(
                &format!("{} cannot be changed after initialization", what),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }

    fn load_module<M: StoreModule<Store = S>>(&self, module: M) -> StrataResult<()> {
        self.ensure_not_configured("Store module")?;
        let store = module.get_store()?;
        if self.store.set(store).is_err() {
            log::error!("A store module is already loaded");
            return Err(StrataError::new(
                "A store module is already loaded",
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }

    fn store(&self) -> StrataResult<S> {
        match self.store.get() {
            Some(store) => Ok(store.clone()),
            None => {
                log::error!("No store module is loaded");
                Err(StrataError::new(
                    "No store module is loaded",
                    ErrorKind::StoreNotInitialized,
                ))
            }
        }
    }

    fn schema_version(&self) -> u32 {
        match self.schema_version.read_with(|it| *it) {
            Some(version) => version,
            None => self.migrations.read_with(|it| it.latest_version()),
        }
    }

    fn set_schema_version(&self, version: u32) -> StrataResult<()> {
        self.ensure_not_configured("Schema version")?;
        self.schema_version.write_with(|it| *it = Some(version));
        Ok(())
    }

    fn migrations(&self) -> MigrationRegistry<S> {
        self.migrations.read_with(|it| it.clone())
    }

    fn set_migrations(&self, registry: MigrationRegistry<S>) -> StrataResult<()> {
        self.ensure_not_configured("Migrations")?;
        self.migrations.write_with(|it| *it = registry);
        Ok(())
    }
}
