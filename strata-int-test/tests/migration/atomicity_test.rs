use secure_string::SecureString;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use strata::errors::{ErrorKind, StrataError};
use strata::migration::{MigrationRegistry, Migrator};
use strata::store::memory::{InMemoryStore, InMemoryStoreModule, MemorySession};
use strata::store::{SchemaStore, StoreSession};
use strata::Strata;

fn store_at(version: u32) -> InMemoryStore {
    let store = InMemoryStore::new();
    store.open_or_create(&SecureString::from("secret")).unwrap();
    let mut session = store.begin().unwrap();
    session.set_schema_version(version).unwrap();
    session.commit().unwrap();
    store
}

fn boom(threshold: u32) -> StrataError {
    StrataError::new(&format!("step {} failed", threshold), ErrorKind::BackendError)
}

/// Steps 1..=5 each create a table; the step at `failing` creates its table
/// and then fails.
fn ladder_failing_at(failing: u32) -> MigrationRegistry<InMemoryStore> {
    let mut builder = MigrationRegistry::<InMemoryStore>::builder();
    for threshold in 1..=5u32 {
        builder = builder.step(
            threshold,
            &format!("step-{}", threshold),
            move |session: &mut MemorySession| {
                session.create_table(&format!("t{}", threshold))?;
                session.schedule_removal(Path::new(&format!("/tmp/file-{}", threshold)))?;
                if threshold == failing {
                    return Err(boom(threshold));
                }
                Ok(())
            },
        );
    }
    builder.build().unwrap()
}

#[test]
fn test_failed_step_rolls_back_whole_run() {
    let store = store_at(0);
    let migrator = Migrator::new(ladder_failing_at(3));

    let err = migrator.migrate(&store, 0, 5).unwrap_err();

    assert_eq!(err.kind(), &ErrorKind::MigrationFailed { threshold: 3 });
    assert_eq!(err.cause().unwrap().message(), "step 3 failed");
    assert_eq!(store.schema_version().unwrap(), 0);
    for table in ["t1", "t2", "t3", "t4", "t5"] {
        assert!(!store.has_table(table).unwrap(), "{} survived rollback", table);
    }
    assert!(store.pending_removals().unwrap().is_empty());
}

#[test]
fn test_last_step_failure_keeps_previous_version() {
    let store = store_at(4);
    let migrator = Migrator::new(ladder_failing_at(5));

    let err = migrator.migrate(&store, 4, 5).unwrap_err();

    assert_eq!(err.kind(), &ErrorKind::MigrationFailed { threshold: 5 });
    assert_eq!(store.schema_version().unwrap(), 4);
    assert!(!store.has_table("t5").unwrap());
}

#[test]
fn test_retry_after_failure_resumes_from_durable_version() {
    let store = store_at(0);
    let healthy = Arc::new(AtomicBool::new(false));
    let runs = Arc::new(AtomicUsize::new(0));

    let registry = {
        let healthy = healthy.clone();
        let runs = runs.clone();
        MigrationRegistry::<InMemoryStore>::builder()
            .step(1, "one", |session: &mut MemorySession| session.create_table("t1"))
            .step(2, "two", move |session: &mut MemorySession| {
                runs.fetch_add(1, Ordering::SeqCst);
                if !healthy.load(Ordering::SeqCst) {
                    return Err(boom(2));
                }
                session.create_table("t2")
            })
            .build()
            .unwrap()
    };
    let migrator = Migrator::new(registry);

    assert!(migrator.migrate_to(&store, 2).is_err());
    assert_eq!(store.schema_version().unwrap(), 0);

    healthy.store(true, Ordering::SeqCst);
    let report = migrator.migrate_to(&store, 2).unwrap();

    assert_eq!(report.executed_thresholds(), vec![1, 2]);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(store.schema_version().unwrap(), 2);
    assert!(store.has_table("t1").unwrap());
}

#[test]
fn test_failed_open_closes_store_and_reports_step() {
    let store = store_at(2);
    store.close().unwrap();

    let result = Strata::builder()
        .load_module(InMemoryStoreModule::with_config().store(store.clone()).build())
        .migrations(ladder_failing_at(4))
        .open_or_create(&SecureString::from("secret"));

    let err = result.err().unwrap();
    assert_eq!(err.kind(), &ErrorKind::MigrationFailed { threshold: 4 });
    assert!(store.is_closed().unwrap());

    store.open_or_create(&SecureString::from("secret")).unwrap();
    assert_eq!(store.schema_version().unwrap(), 2);
    assert!(!store.has_table("t3").unwrap());
}
