use secure_string::SecureString;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use strata::errors::ErrorKind;
use strata::migration::MigrationRegistry;
use strata::store::memory::{InMemoryStore, InMemoryStoreModule, MemorySession};
use strata::Strata;
use strata_int_test::test_util::{cleanup, create_test_context, run_test};
use strata_sqlite_adapter::DATABASE_VERSION;

fn counting_registry(runs: &Arc<[AtomicUsize; 3]>) -> MigrationRegistry<InMemoryStore> {
    let mut builder = MigrationRegistry::<InMemoryStore>::builder();
    for threshold in 1..=3u32 {
        let runs = runs.clone();
        builder = builder.step(
            threshold,
            &format!("step-{}", threshold),
            move |session: &mut MemorySession| {
                runs[threshold as usize - 1].fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(5));
                session.create_table(&format!("t{}", threshold))
            },
        );
    }
    builder.build().unwrap()
}

#[test]
fn test_concurrent_opens_migrate_once() {
    let num_threads = 4;
    let store = InMemoryStore::new();
    let runs: Arc<[AtomicUsize; 3]> = Arc::new(Default::default());
    let registry = counting_registry(&runs);
    let barrier = Arc::new(Barrier::new(num_threads));
    let finished = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let store = store.clone();
            let registry = registry.clone();
            let barrier = barrier.clone();
            let finished = finished.clone();
            thread::spawn(move || {
                barrier.wait();
                let db = Strata::builder()
                    .load_module(InMemoryStoreModule::with_config().store(store).build())
                    .migrations(registry)
                    .open_or_create(&SecureString::from("secret"));
                finished.fetch_add(1, Ordering::SeqCst);
                db
            })
        })
        .collect();

    awaitility::at_most(Duration::from_secs(60))
        .until(|| finished.load(Ordering::SeqCst) == num_threads);

    let handles: Vec<Strata<InMemoryStore>> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap().unwrap())
        .collect();

    for counter in runs.iter() {
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
    let upgrades = handles
        .iter()
        .filter(|db| !db.last_migration().unwrap().is_noop())
        .count();
    assert_eq!(upgrades, 1);
    for db in &handles {
        assert_eq!(db.schema_version().unwrap(), 3);
    }
}

#[test]
fn test_only_one_live_handle_per_database_file() {
    run_test(
        create_test_context,
        |ctx| {
            let num_threads = 4;
            let barrier = Arc::new(Barrier::new(num_threads));
            let finished = Arc::new(AtomicUsize::new(0));

            let handles: Vec<_> = (0..num_threads)
                .map(|_| {
                    let ctx = ctx.clone();
                    let barrier = barrier.clone();
                    let finished = finished.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        let db = ctx.open_at(DATABASE_VERSION);
                        finished.fetch_add(1, Ordering::SeqCst);
                        db
                    })
                })
                .collect();

            awaitility::at_most(Duration::from_secs(60))
                .until(|| finished.load(Ordering::SeqCst) == num_threads);

            let results: Vec<_> = handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect();

            let opened: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
            assert_eq!(opened.len(), 1);
            for err in results.iter().filter_map(|r| r.as_ref().err()) {
                assert_eq!(err.kind(), &ErrorKind::OpenFailure);
            }
            assert_eq!(opened[0].schema_version()?, DATABASE_VERSION);
            opened[0].close()
        },
        cleanup,
    )
}
