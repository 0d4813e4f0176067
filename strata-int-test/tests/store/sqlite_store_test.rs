use secure_string::SecureString;
use strata::errors::ErrorKind;
use strata::store::SchemaStore;
use strata::Strata;
use strata_int_test::test_util::{cleanup, create_test_context, run_test, secret};
use strata_sqlite_adapter::{messenger_registry, open_messenger_store, DATABASE_VERSION};

#[test]
fn test_wrong_secret_is_rejected() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.open_at(DATABASE_VERSION)?;
            db.close()?;
            drop(db);

            let err = open_messenger_store(ctx.module(), &SecureString::from("guess"))
                .err()
                .unwrap();
            assert_eq!(err.kind(), &ErrorKind::OpenFailure);

            let db = open_messenger_store(ctx.module(), &secret())?;
            assert_eq!(db.schema_version()?, DATABASE_VERSION);
            db.close()
        },
        cleanup,
    )
}

#[test]
fn test_empty_secret_is_rejected() {
    run_test(
        create_test_context,
        |ctx| {
            let err = open_messenger_store(ctx.module(), &SecureString::from(""))
                .err()
                .unwrap();
            assert_eq!(err.kind(), &ErrorKind::OpenFailure);
            assert_eq!(err.root_cause().kind(), &ErrorKind::SecurityError);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_creation_metadata_survives_reopen() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.open_at(DATABASE_VERSION)?;
            let created = db.metadata()?;
            db.close()?;
            drop(db);

            let db = ctx.open_at(DATABASE_VERSION)?;
            let reopened = db.metadata()?;
            assert_eq!(created.create_time, reopened.create_time);
            assert_eq!(created.strata_version, reopened.strata_version);
            assert_eq!(reopened.schema_version, DATABASE_VERSION);
            db.close()
        },
        cleanup,
    )
}

#[test]
fn test_second_handle_to_open_database_fails() {
    run_test(
        create_test_context,
        |ctx| {
            let first = ctx.open_at(DATABASE_VERSION)?;

            let err = ctx.open_at(DATABASE_VERSION).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::OpenFailure);
            assert!(!first.is_closed()?);
            assert_eq!(first.schema_version()?, DATABASE_VERSION);
            first.close()?;
            drop(first);

            let second = ctx.open_at(DATABASE_VERSION)?;
            second.close()
        },
        cleanup,
    )
}

#[test]
fn test_closed_handle_refuses_reads() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.open_at(DATABASE_VERSION)?;
            let store = db.store()?;
            db.close()?;

            assert!(db.is_closed()?);
            assert_eq!(
                db.schema_version().unwrap_err().kind(),
                &ErrorKind::StoreAlreadyClosed
            );
            assert!(store.begin().is_err());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_target_defaults_to_latest_step() {
    run_test(
        create_test_context,
        |ctx| {
            let db = Strata::builder()
                .load_module(ctx.module())
                .try_migrations(messenger_registry())
                .open_or_create(&secret())?;
            assert_eq!(db.schema_version()?, DATABASE_VERSION);
            assert_eq!(db.config().schema_version(), DATABASE_VERSION);
            db.close()
        },
        cleanup,
    )
}
