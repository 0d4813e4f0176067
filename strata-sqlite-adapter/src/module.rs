use crate::config::{JournalMode, SqliteConfig};
use crate::store::SqliteStore;
use std::time::Duration;
use strata::errors::StrataResult;
use strata::store::StoreModule;

/// Strata storage module backed by SQLite.
///
/// When the crate is built with the `sqlcipher` feature the database file is
/// encrypted with the secret passed to `open_or_create`.
///
/// # Examples
///
/// ```rust,ignore
/// use strata::Strata;
/// use strata_sqlite_adapter::{messenger_registry, SqliteModule};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Strata::builder()
///     .load_module(
///         SqliteModule::with_config()
///             .db_path("/data/messenger.db")
///             .legacy_cipher_preset()
///             .build(),
///     )
///     .migrations(messenger_registry()?)
///     .open_or_create(&SecureString::from("passphrase"))?;
/// # Ok(())
/// # }
/// ```
pub struct SqliteModule {
    store_config: SqliteConfig,
}

impl SqliteModule {
    #[inline]
    pub fn with_config() -> SqliteModuleBuilder {
        SqliteModuleBuilder::new()
    }

    pub fn config(&self) -> &SqliteConfig {
        &self.store_config
    }
}

impl StoreModule for SqliteModule {
    type Store = SqliteStore;

    fn get_store(&self) -> StrataResult<SqliteStore> {
        Ok(SqliteStore::new(self.store_config.clone()))
    }
}

/// Builder for a [`SqliteModule`].
pub struct SqliteModuleBuilder {
    store_config: SqliteConfig,
}

impl SqliteModuleBuilder {
    #[inline]
    pub fn new() -> SqliteModuleBuilder {
        SqliteModuleBuilder {
            store_config: SqliteConfig::new(),
        }
    }

    /// Settings that open databases written by the legacy messenger client:
    /// a single key derivation iteration, 4 KiB cipher pages, rollback
    /// journal and foreign keys off.
    pub fn legacy_cipher_preset(self) -> Self {
        self.store_config.set_kdf_iter(1);
        self.store_config.set_cipher_page_size(4096);
        self.store_config.set_journal_mode(JournalMode::Delete);
        self.store_config.set_foreign_keys(false);
        self
    }

    #[inline]
    pub fn db_path(self, db_path: &str) -> Self {
        self.store_config.set_db_path(db_path);
        self
    }

    #[inline]
    pub fn busy_timeout(self, timeout: Duration) -> Self {
        self.store_config.set_busy_timeout(timeout);
        self
    }

    #[inline]
    pub fn cipher_page_size(self, size: u32) -> Self {
        self.store_config.set_cipher_page_size(size);
        self
    }

    #[inline]
    pub fn kdf_iter(self, iterations: u32) -> Self {
        self.store_config.set_kdf_iter(iterations);
        self
    }

    #[inline]
    pub fn journal_mode(self, mode: JournalMode) -> Self {
        self.store_config.set_journal_mode(mode);
        self
    }

    #[inline]
    pub fn foreign_keys(self, enabled: bool) -> Self {
        self.store_config.set_foreign_keys(enabled);
        self
    }

    pub fn build(self) -> SqliteModule {
        SqliteModule {
            store_config: self.store_config,
        }
    }
}

impl Default for SqliteModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}
