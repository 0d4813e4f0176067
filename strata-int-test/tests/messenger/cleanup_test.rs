use std::fs;
use strata::errors::ErrorKind;
use strata::store::SchemaStore;
use strata::Strata;
use strata_int_test::test_util::{
    cleanup, count_rows, create_test_context, failing_at, has_column, has_table,
    insert_group_receipt, insert_mms, insert_part, run_test, secret,
};
use strata_sqlite_adapter::schema::{BAD_IMPORT_CLEANUP, FULL_TEXT_SEARCH, QUOTED_REPLIES};
use strata_sqlite_adapter::{messenger_registry, DATABASE_VERSION};

#[test]
fn test_failed_cleanup_keeps_rows_files_and_version() {
    run_test(
        create_test_context,
        |ctx| {
            let orphan_data = ctx.attachment("orphan.bin")?;

            let db = ctx.open_at(FULL_TEXT_SEARCH)?;
            insert_part(&db, 1, 404, "audio/aac", Some(&orphan_data), None)?;
            insert_group_receipt(&db, 404, "+15550123")?;
            db.close()?;
            drop(db);

            let err = ctx
                .open_with(failing_at(BAD_IMPORT_CLEANUP)?, DATABASE_VERSION)
                .err()
                .unwrap();
            assert_eq!(
                err.kind(),
                &ErrorKind::MigrationFailed {
                    threshold: BAD_IMPORT_CLEANUP
                }
            );
            assert!(err.cause().unwrap().message().contains("exploded"));
            assert!(orphan_data.exists());

            let db = ctx.open_at(FULL_TEXT_SEARCH)?;
            assert_eq!(db.schema_version()?, FULL_TEXT_SEARCH);
            assert!(db.last_migration().unwrap().is_noop());
            assert_eq!(count_rows(&db, "SELECT count(*) FROM part")?, 1);
            assert_eq!(count_rows(&db, "SELECT count(*) FROM group_receipts")?, 1);
            assert!(db.store()?.pending_removals()?.is_empty());
            db.close()
        },
        cleanup,
    )
}

#[test]
fn test_failure_in_last_step_undoes_earlier_steps_of_the_run() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.open_at(QUOTED_REPLIES)?;
            db.close()?;
            drop(db);

            let err = ctx
                .open_with(failing_at(BAD_IMPORT_CLEANUP)?, DATABASE_VERSION)
                .err()
                .unwrap();
            assert_eq!(
                err.kind(),
                &ErrorKind::MigrationFailed {
                    threshold: BAD_IMPORT_CLEANUP
                }
            );

            let db = ctx.open_at(QUOTED_REPLIES)?;
            assert_eq!(db.schema_version()?, QUOTED_REPLIES);
            assert!(!has_column(&db, "mms", "shared_contacts")?);
            assert!(!has_table(&db, "sms_fts")?);
            assert!(!has_table(&db, "mms_fts")?);
            db.close()?;
            drop(db);

            let db = ctx.open_at(DATABASE_VERSION)?;
            assert_eq!(
                db.last_migration().unwrap().executed_thresholds(),
                vec![8, 9, 10]
            );
            db.close()
        },
        cleanup,
    )
}

#[test]
fn test_undeletable_file_stays_queued_until_next_sweep() {
    run_test(
        create_test_context,
        |ctx| {
            let stubborn = ctx.dir().join("stubborn");
            fs::create_dir_all(&stubborn)?;

            let db = ctx.open_at(FULL_TEXT_SEARCH)?;
            insert_part(&db, 1, 9, "image/gif", Some(&stubborn), None)?;
            db.close()?;
            drop(db);

            let db = ctx.open_at(DATABASE_VERSION)?;
            assert_eq!(db.schema_version()?, DATABASE_VERSION);
            assert_eq!(count_rows(&db, "SELECT count(*) FROM part")?, 0);
            assert_eq!(db.store()?.pending_removals()?.len(), 1);

            fs::remove_dir_all(&stubborn)?;
            let report = db.sweep()?;
            assert_eq!(report.already_gone, 1);
            assert!(report.is_clean());
            assert!(db.store()?.pending_removals()?.is_empty());
            db.close()
        },
        cleanup,
    )
}

#[test]
fn test_sweep_can_be_deferred_past_open() {
    run_test(
        create_test_context,
        |ctx| {
            let orphan_data = ctx.attachment("orphan.bin")?;

            let db = ctx.open_at(FULL_TEXT_SEARCH)?;
            insert_mms(&db, 1, "keep me")?;
            insert_part(&db, 1, 2, "image/jpeg", Some(&orphan_data), None)?;
            db.close()?;
            drop(db);

            let db = Strata::builder()
                .load_module(ctx.module())
                .try_migrations(messenger_registry())
                .sweep_on_open(false)
                .open_or_create(&secret())?;
            assert_eq!(db.schema_version()?, DATABASE_VERSION);
            assert!(orphan_data.exists());

            let report = db.sweep()?;
            assert_eq!(report.removed, 1);
            assert!(!orphan_data.exists());

            let report = db.sweep()?;
            assert_eq!(report.removed + report.already_gone + report.failed, 0);
            db.close()
        },
        cleanup,
    )
}
