use rusqlite::params;
use secure_string::SecureString;
use std::backtrace::Backtrace;
use std::path::{Path, PathBuf};
use std::time::Instant;
use std::{env, fs};
use strata::errors::{ErrorKind, StrataError, StrataResult};
use strata::migration::{MigrationRegistry, MigrationStep};
use strata::Strata;
use strata_sqlite_adapter::{
    messenger_registry, SqliteModule, SqliteSession, SqliteStore, DATABASE_NAME,
};

/// Runs `test` between `before` and `after`, reporting the first failure
/// with a backtrace. `after` also runs when the test body returns an error.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> StrataResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> StrataResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> StrataResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let start_time = Instant::now();

    let result = std::panic::catch_unwind(|| {
        let backtrace = Backtrace::capture();
        match before() {
            Ok(ctx) => match test(ctx.clone()) {
                Ok(_) => after(ctx)
                    .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                Err(e) => {
                    let _ = after(ctx);
                    Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                }
            },
            Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
        }
    });

    let (error, backtrace) = match result {
        Ok(Ok(_)) => return,
        Ok(Err((e, bt))) => (e, bt),
        Err(panic_err) => {
            let msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            (format!("Panic: {}", msg), String::new())
        }
    };

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {:?}", start_time.elapsed());
    eprintln!("Error: {}", error);
    if !backtrace.is_empty() && !backtrace.contains("disabled") {
        eprintln!("\nBacktrace:\n{}", backtrace);
    }
    eprintln!("=====================================================\n");

    panic!("Test failed: {}", error);
}

/// A scratch directory holding one messenger database and the attachment
/// files its rows point at.
#[derive(Clone)]
pub struct TestContext {
    dir: PathBuf,
}

impl TestContext {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn db_path(&self) -> String {
        self.dir.join(DATABASE_NAME).to_string_lossy().into_owned()
    }

    pub fn module(&self) -> SqliteModule {
        SqliteModule::with_config()
            .db_path(&self.db_path())
            .legacy_cipher_preset()
            .build()
    }

    /// Opens the messenger database and upgrades it to `version`.
    pub fn open_at(&self, version: u32) -> StrataResult<Strata<SqliteStore>> {
        Strata::builder()
            .load_module(self.module())
            .try_migrations(messenger_registry())
            .schema_version(version)
            .open_or_create(&secret())
    }

    /// Opens the database with a custom ladder.
    pub fn open_with(
        &self,
        registry: MigrationRegistry<SqliteStore>,
        version: u32,
    ) -> StrataResult<Strata<SqliteStore>> {
        Strata::builder()
            .load_module(self.module())
            .migrations(registry)
            .schema_version(version)
            .open_or_create(&secret())
    }

    /// Writes an attachment file into the scratch directory.
    pub fn attachment(&self, name: &str) -> StrataResult<PathBuf> {
        let path = self.dir.join(name);
        fs::write(&path, name.as_bytes())?;
        Ok(path)
    }
}

pub fn secret() -> SecureString {
    SecureString::from("correct horse battery staple")
}

pub fn random_path() -> String {
    let id = uuid::Uuid::new_v4();
    let temp_dir = env::temp_dir();
    temp_dir.join(format!("strata-{}", id)).to_string_lossy().into_owned()
}

pub fn create_test_context() -> StrataResult<TestContext> {
    let dir = PathBuf::from(random_path());
    fs::create_dir_all(&dir)?;
    Ok(TestContext::new(dir))
}

pub fn cleanup(ctx: TestContext) -> StrataResult<()> {
    if ctx.dir().exists() {
        fs::remove_dir_all(ctx.dir())?;
    }
    Ok(())
}

/// The messenger ladder with the step at `threshold` replaced by one that
/// always fails.
pub fn failing_at(threshold: u32) -> StrataResult<MigrationRegistry<SqliteStore>> {
    let steps = messenger_registry()?
        .steps()
        .iter()
        .map(|step| {
            if step.threshold() == threshold {
                MigrationStep::new(threshold, step.name(), move |_: &mut SqliteSession| {
                    Err(StrataError::new(
                        &format!("step {} exploded", threshold),
                        ErrorKind::BackendError,
                    ))
                })
            } else {
                step.clone()
            }
        })
        .collect();
    MigrationRegistry::new(steps)
}

pub fn insert_sms(db: &Strata<SqliteStore>, id: i64, body: &str) -> StrataResult<()> {
    db.store()?.with_connection(|conn| {
        conn.execute(
            "INSERT INTO sms (_id, thread_id, body) VALUES (?1, 1, ?2)",
            params![id, body],
        )
    })?;
    Ok(())
}

pub fn insert_mms(db: &Strata<SqliteStore>, id: i64, body: &str) -> StrataResult<()> {
    db.store()?.with_connection(|conn| {
        conn.execute(
            "INSERT INTO mms (_id, thread_id, body) VALUES (?1, 1, ?2)",
            params![id, body],
        )
    })?;
    Ok(())
}

pub fn insert_part(
    db: &Strata<SqliteStore>,
    id: i64,
    mid: i64,
    content_type: &str,
    data: Option<&Path>,
    thumbnail: Option<&Path>,
) -> StrataResult<()> {
    let data = data.map(|p| p.to_string_lossy().into_owned());
    let thumbnail = thumbnail.map(|p| p.to_string_lossy().into_owned());
    db.store()?.with_connection(|conn| {
        conn.execute(
            "INSERT INTO part (_id, mid, ct, _data, thumbnail, unique_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, mid, content_type, data, thumbnail, id * 100],
        )
    })?;
    Ok(())
}

pub fn insert_group_receipt(db: &Strata<SqliteStore>, mms_id: i64, address: &str) -> StrataResult<()> {
    db.store()?.with_connection(|conn| {
        conn.execute(
            "INSERT INTO group_receipts (mms_id, address, status) VALUES (?1, ?2, 0)",
            params![mms_id, address],
        )
    })?;
    Ok(())
}

pub fn count_rows(db: &Strata<SqliteStore>, sql: &str) -> StrataResult<i64> {
    db.store()?
        .with_connection(|conn| conn.query_row(sql, [], |row| row.get(0)))
}

pub fn has_table(db: &Strata<SqliteStore>, table: &str) -> StrataResult<bool> {
    let count: i64 = db.store()?.with_connection(|conn| {
        conn.query_row(
            "SELECT count(*) FROM sqlite_master WHERE name = ?1",
            params![table],
            |row| row.get(0),
        )
    })?;
    Ok(count > 0)
}

pub fn has_column(db: &Strata<SqliteStore>, table: &str, column: &str) -> StrataResult<bool> {
    let count: i64 = db.store()?.with_connection(|conn| {
        conn.query_row(
            "SELECT count(*) FROM pragma_table_info(?1) WHERE name = ?2",
            params![table, column],
            |row| row.get(0),
        )
    })?;
    Ok(count > 0)
}
