use crate::errors::{StrataError, StrataResult};
use crate::migration::MigrationRegistry;
use crate::store::{SchemaStore, StoreModule};
use crate::strata::Strata;
use crate::strata_config::StrataConfig;
use secure_string::SecureString;

/// Builder for opening a [`Strata`] handle.
///
/// Configuration errors are captured as they happen and returned by
/// [`StrataBuilder::open_or_create`], so the fluent chain never has to be
/// interrupted.
///
/// # Examples
///
/// ```rust,ignore
/// let db = Strata::builder()
///     .load_module(SqliteModule::with_config().db_path("/data/messenger.db").build())
///     .migrations(messenger_registry()?)
///     .schema_version(DATABASE_VERSION)
///     .open_or_create(&SecureString::from("passphrase"))?;
/// ```
pub struct StrataBuilder<S: SchemaStore> {
    error: Option<StrataError>,
    strata_config: StrataConfig<S>,
}

impl<S: SchemaStore> StrataBuilder<S> {
    pub fn new() -> Self {
        StrataBuilder {
            error: None,
            strata_config: StrataConfig::new(),
        }
    }

    /// Loads the module that provides the store.
    pub fn load_module<M: StoreModule<Store = S>>(mut self, module: M) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.strata_config.load_module(module) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets the target schema version. Defaults to the latest threshold of
    /// the registry.
    pub fn schema_version(mut self, version: u32) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.strata_config.set_schema_version(version) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn migrations(mut self, registry: MigrationRegistry<S>) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.strata_config.set_migrations(registry) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Like [`StrataBuilder::migrations`], taking the result of building a
    /// registry so a ladder that fails validation surfaces here.
    pub fn try_migrations(mut self, registry: StrataResult<MigrationRegistry<S>>) -> Self {
        match registry {
            Ok(registry) => self.migrations(registry),
            Err(e) => {
                if self.error.is_none() {
                    self.error = Some(e);
                }
                self
            }
        }
    }

    /// Whether to delete files queued by earlier runs when opening.
    pub fn sweep_on_open(mut self, sweep: bool) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.strata_config.set_sweep_on_open(sweep) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Opens the store, verifies `secret`, brings the schema up to the target
    /// version and returns the open handle.
    pub fn open_or_create(self, secret: &SecureString) -> StrataResult<Strata<S>> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let db = Strata::new(self.strata_config);
        db.initialize(secret)?;
        Ok(db)
    }
}

impl<S: SchemaStore> Default for StrataBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
