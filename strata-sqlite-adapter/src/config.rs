use strata::common::{atomic, Atomic, ReadExecutor, WriteExecutor};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Journal mode applied with `PRAGMA journal_mode` when a store is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JournalMode {
    #[default]
    Delete,
    Truncate,
    Persist,
    Memory,
    Wal,
    Off,
}

impl JournalMode {
    pub fn as_pragma(&self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Persist => "PERSIST",
            JournalMode::Memory => "MEMORY",
            JournalMode::Wal => "WAL",
            JournalMode::Off => "OFF",
        }
    }
}

impl Display for JournalMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_pragma())
    }
}

/// Connection settings of a [`crate::SqliteStore`].
///
/// Shared behind an `Arc`, so every clone of a store sees the same settings.
/// The database path can be set only once; an empty path opens a private
/// in-memory database.
#[derive(Clone)]
pub struct SqliteConfig {
    inner: Arc<SqliteConfigInner>,
}

impl SqliteConfig {
    #[inline]
    pub fn new() -> SqliteConfig {
        SqliteConfig {
            inner: Arc::new(SqliteConfigInner::new()),
        }
    }

    /// Path of the database file, empty for an in-memory database.
    #[inline]
    pub fn db_path(&self) -> &str {
        self.inner.db_path.get().map(String::as_str).unwrap_or("")
    }

    #[inline]
    pub(crate) fn set_db_path(&self, db_path: &str) {
        if self.inner.db_path.set(db_path.to_string()).is_err() {
            log::warn!("Database path is already set to {}, ignoring {}", self.db_path(), db_path);
        }
    }

    #[inline]
    pub fn is_in_memory(&self) -> bool {
        self.db_path().is_empty()
    }

    #[inline]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.inner.busy_timeout_ms.load(Ordering::Relaxed))
    }

    #[inline]
    pub(crate) fn set_busy_timeout(&self, timeout: Duration) {
        self.inner
            .busy_timeout_ms
            .store(timeout.as_millis() as u64, Ordering::Relaxed)
    }

    /// Page size of the encrypted database. Only used by SQLCipher builds.
    #[inline]
    pub fn cipher_page_size(&self) -> u32 {
        self.inner.cipher_page_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_cipher_page_size(&self, size: u32) {
        self.inner.cipher_page_size.store(size, Ordering::Relaxed)
    }

    /// Key derivation iterations. Only used by SQLCipher builds.
    #[inline]
    pub fn kdf_iter(&self) -> u32 {
        self.inner.kdf_iter.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_kdf_iter(&self, iterations: u32) {
        self.inner.kdf_iter.store(iterations, Ordering::Relaxed)
    }

    #[inline]
    pub fn journal_mode(&self) -> JournalMode {
        self.inner.journal_mode.read_with(|mode| *mode)
    }

    #[inline]
    pub(crate) fn set_journal_mode(&self, mode: JournalMode) {
        self.inner.journal_mode.write_with(|it| *it = mode)
    }

    #[inline]
    pub fn foreign_keys(&self) -> bool {
        self.inner.foreign_keys.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_foreign_keys(&self, enabled: bool) {
        self.inner.foreign_keys.store(enabled, Ordering::Relaxed)
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self::new()
    }
}

struct SqliteConfigInner {
    db_path: OnceLock<String>,
    busy_timeout_ms: AtomicU64,
    cipher_page_size: AtomicU32,
    kdf_iter: AtomicU32,
    journal_mode: Atomic<JournalMode>,
    foreign_keys: AtomicBool,
}

impl SqliteConfigInner {
    pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

    pub const DEFAULT_CIPHER_PAGE_SIZE: u32 = 4_096;

    /// The legacy databases were keyed with a single iteration.
    pub const DEFAULT_KDF_ITER: u32 = 1;

    fn new() -> SqliteConfigInner {
        SqliteConfigInner {
            db_path: OnceLock::new(),
            busy_timeout_ms: AtomicU64::new(Self::DEFAULT_BUSY_TIMEOUT_MS),
            cipher_page_size: AtomicU32::new(Self::DEFAULT_CIPHER_PAGE_SIZE),
            kdf_iter: AtomicU32::new(Self::DEFAULT_KDF_ITER),
            journal_mode: atomic(JournalMode::default()),
            // legacy stores carry orphaned rows until the cleanup step runs
            foreign_keys: AtomicBool::new(false),
        }
    }
}
