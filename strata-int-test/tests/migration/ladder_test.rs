use secure_string::SecureString;
use std::sync::{Arc, Mutex};
use strata::errors::ErrorKind;
use strata::migration::{MigrationRegistry, MigrationStep, Migrator};
use strata::store::memory::{InMemoryStore, InMemoryStoreModule, MemorySession};
use strata::store::{SchemaStore, StoreSession};
use strata::Strata;

type Calls = Arc<Mutex<Vec<u32>>>;

fn recording_registry(thresholds: &[u32], calls: &Calls) -> MigrationRegistry<InMemoryStore> {
    let steps = thresholds
        .iter()
        .map(|threshold| {
            let threshold = *threshold;
            let calls = calls.clone();
            MigrationStep::<InMemoryStore>::new(
                threshold,
                &format!("step-{}", threshold),
                move |session: &mut MemorySession| {
                    calls.lock().unwrap().push(threshold);
                    session.create_table(&format!("t{}", threshold))
                },
            )
        })
        .collect();
    MigrationRegistry::new(steps).unwrap()
}

fn store_at(version: u32) -> InMemoryStore {
    let store = InMemoryStore::new();
    store.open_or_create(&SecureString::from("secret")).unwrap();
    let mut session = store.begin().unwrap();
    session.set_schema_version(version).unwrap();
    session.commit().unwrap();
    store
}

fn open(store: &InMemoryStore, registry: MigrationRegistry<InMemoryStore>, to: u32) -> Strata<InMemoryStore> {
    Strata::builder()
        .load_module(InMemoryStoreModule::with_config().store(store.clone()).build())
        .migrations(registry)
        .schema_version(to)
        .open_or_create(&SecureString::from("secret"))
        .unwrap()
}

#[test]
fn test_every_range_runs_exactly_the_covered_steps() {
    let thresholds = [1, 2, 5, 9];
    for from in 0..=10u32 {
        for to in from..=10u32 {
            let calls = Calls::default();
            let migrator = Migrator::new(recording_registry(&thresholds, &calls));
            let store = store_at(from);

            let report = migrator.migrate(&store, from, to).unwrap();

            let expected: Vec<u32> = thresholds
                .iter()
                .copied()
                .filter(|t| from < *t && *t <= to)
                .collect();
            assert_eq!(*calls.lock().unwrap(), expected, "range {}..={}", from, to);
            assert_eq!(report.executed_thresholds(), expected);
            assert_eq!(store.schema_version().unwrap(), to);
        }
    }
}

#[test]
fn test_second_run_executes_nothing() {
    let calls = Calls::default();
    let migrator = Migrator::new(recording_registry(&[1, 2, 3, 4, 5], &calls));
    let store = store_at(0);

    migrator.migrate(&store, 0, 5).unwrap();
    let report = migrator.migrate_to(&store, 5).unwrap();

    assert!(report.is_noop());
    assert_eq!(*calls.lock().unwrap(), vec![1, 2, 3, 4, 5]);
    assert_eq!(store.schema_version().unwrap(), 5);
}

#[test]
fn test_downgrade_is_rejected() {
    let calls = Calls::default();
    let migrator = Migrator::new(recording_registry(&[8, 9, 10], &calls));
    let store = store_at(10);

    let err = migrator.migrate(&store, 10, 7).unwrap_err();

    assert_eq!(err.kind(), &ErrorKind::UnsupportedDowngrade { from: 10, to: 7 });
    assert_eq!(store.schema_version().unwrap(), 10);
    assert!(calls.lock().unwrap().is_empty());
}

#[test]
fn test_invalid_ladders_are_rejected_at_registration() {
    let calls = Calls::default();
    let duplicate = MigrationRegistry::<InMemoryStore>::builder()
        .add_step(recording_registry(&[3], &calls).steps()[0].clone())
        .add_step(recording_registry(&[3], &calls).steps()[0].clone())
        .build()
        .unwrap_err();
    assert_eq!(duplicate.kind(), &ErrorKind::ConfigurationError);

    let out_of_order = MigrationRegistry::<InMemoryStore>::builder()
        .step(4, "four", |_: &mut MemorySession| Ok(()))
        .step(2, "two", |_: &mut MemorySession| Ok(()))
        .build()
        .unwrap_err();
    assert_eq!(out_of_order.kind(), &ErrorKind::ConfigurationError);
    assert!(calls.lock().unwrap().is_empty());
}

#[test]
fn test_fresh_store_runs_whole_ladder() {
    let calls = Calls::default();
    let store = InMemoryStore::new();
    let db = open(&store, recording_registry(&[2, 3, 4, 5, 6, 7, 8, 9, 10], &calls), 10);

    assert_eq!(*calls.lock().unwrap(), (2..=10).collect::<Vec<_>>());
    assert_eq!(db.schema_version().unwrap(), 10);
    assert!(store.has_table("t2").unwrap());
    assert!(store.has_table("t10").unwrap());

    let report = db.last_migration().unwrap();
    assert_eq!(report.from_version, 0);
    assert_eq!(report.to_version, 10);
    assert_eq!(report.steps.len(), 9);
}

#[test]
fn test_store_at_seven_runs_last_three_steps() {
    let calls = Calls::default();
    let store = store_at(7);
    store.close().unwrap();

    let db = open(&store, recording_registry(&[2, 3, 4, 5, 6, 7, 8, 9, 10], &calls), 10);

    assert_eq!(*calls.lock().unwrap(), vec![8, 9, 10]);
    assert_eq!(db.schema_version().unwrap(), 10);
    assert!(!store.has_table("t7").unwrap());
}

#[test]
fn test_store_at_target_runs_nothing() {
    let calls = Calls::default();
    let store = store_at(10);
    store.close().unwrap();

    let db = open(&store, recording_registry(&[2, 3, 4, 5, 6, 7, 8, 9, 10], &calls), 10);

    assert!(calls.lock().unwrap().is_empty());
    assert!(db.last_migration().unwrap().is_noop());
    assert_eq!(db.schema_version().unwrap(), 10);
}

#[test]
fn test_reopen_after_upgrade_is_noop() {
    let calls = Calls::default();
    let store = InMemoryStore::new();

    let first = open(&store, recording_registry(&[1, 2, 3], &calls), 3);
    first.close().unwrap();
    drop(first);

    let second = open(&store, recording_registry(&[1, 2, 3], &calls), 3);
    assert!(second.last_migration().unwrap().is_noop());
    assert_eq!(*calls.lock().unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_steps_beyond_target_wait_for_a_later_release() {
    let calls = Calls::default();
    let store = InMemoryStore::new();

    let db = open(&store, recording_registry(&[1, 2, 3, 4], &calls), 2);
    assert_eq!(db.schema_version().unwrap(), 2);
    db.close().unwrap();
    drop(db);

    let db = open(&store, recording_registry(&[1, 2, 3, 4], &calls), 4);
    assert_eq!(db.schema_version().unwrap(), 4);
    assert_eq!(*calls.lock().unwrap(), vec![1, 2, 3, 4]);
}
