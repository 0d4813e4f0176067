use strata::errors::ErrorKind;
use strata::store::SchemaStore;
use strata_int_test::test_util::{
    cleanup, count_rows, create_test_context, has_column, has_table, insert_group_receipt,
    insert_mms, insert_part, insert_sms, run_test,
};
use strata_sqlite_adapter::schema::{
    FULL_TEXT_SEARCH, MIGRATE_SESSIONS_VERSION, QUOTED_REPLIES,
};
use strata_sqlite_adapter::DATABASE_VERSION;

#[test]
fn test_fresh_database_reaches_latest_version() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.open_at(DATABASE_VERSION)?;
            assert_eq!(db.schema_version()?, DATABASE_VERSION);

            let report = db.last_migration().unwrap();
            assert_eq!(report.from_version, 0);
            assert_eq!(report.executed_thresholds(), (1..=10).collect::<Vec<_>>());

            for table in [
                "sms",
                "mms",
                "part",
                "thread",
                "identities",
                "drafts",
                "groups",
                "recipient_preferences",
                "group_receipts",
                "signed_prekeys",
                "one_time_prekeys",
                "sessions",
                "sms_fts",
                "mms_fts",
            ] {
                assert!(has_table(&db, table)?, "missing table {}", table);
            }
            assert!(has_column(&db, "recipient_preferences", "call_ringtone")?);
            assert!(has_column(&db, "part", "width")?);
            assert!(has_column(&db, "mms", "quote_body")?);
            assert!(has_column(&db, "mms", "shared_contacts")?);

            let metadata = db.metadata()?;
            assert!(metadata.create_time.is_some());
            assert_eq!(metadata.schema_version, DATABASE_VERSION);
            db.close()
        },
        cleanup,
    )
}

#[test]
fn test_upgrade_from_quoted_replies_release() {
    run_test(
        create_test_context,
        |ctx| {
            let kept_data = ctx.attachment("kept.bin")?;
            let orphan_data = ctx.attachment("orphan.bin")?;
            let orphan_thumb = ctx.attachment("orphan-thumb.jpg")?;

            let db = ctx.open_at(QUOTED_REPLIES)?;
            assert!(!has_column(&db, "mms", "shared_contacts")?);
            assert!(!has_table(&db, "sms_fts")?);

            insert_sms(&db, 1, "are we still on for the hike")?;
            insert_sms(&db, 2, "bring water")?;
            insert_mms(&db, 10, "hike photos")?;
            insert_part(&db, 1, 10, "image/jpeg", Some(&kept_data), None)?;
            insert_part(&db, 2, 77, "image/jpeg", Some(&orphan_data), Some(&orphan_thumb))?;
            insert_group_receipt(&db, 10, "+15550100")?;
            insert_group_receipt(&db, 77, "+15550101")?;
            db.close()?;
            drop(db);

            let db = ctx.open_at(DATABASE_VERSION)?;
            let report = db.last_migration().unwrap();
            assert_eq!(report.from_version, QUOTED_REPLIES);
            assert_eq!(report.executed_thresholds(), vec![8, 9, 10]);
            assert_eq!(db.schema_version()?, DATABASE_VERSION);

            assert!(has_column(&db, "mms", "shared_contacts")?);
            assert_eq!(
                count_rows(&db, "SELECT count(*) FROM sms_fts WHERE sms_fts MATCH 'hike'")?,
                1
            );
            assert_eq!(
                count_rows(&db, "SELECT count(*) FROM mms_fts WHERE mms_fts MATCH 'hike'")?,
                1
            );

            assert_eq!(count_rows(&db, "SELECT count(*) FROM part")?, 1);
            assert_eq!(count_rows(&db, "SELECT count(*) FROM group_receipts")?, 1);
            assert!(kept_data.exists());
            assert!(!orphan_data.exists());
            assert!(!orphan_thumb.exists());
            assert!(db.store()?.pending_removals()?.is_empty());
            db.close()
        },
        cleanup,
    )
}

#[test]
fn test_image_thumbnails_are_removed_after_commit() {
    run_test(
        create_test_context,
        |ctx| {
            let image_thumb = ctx.attachment("image-thumb.jpg")?;
            let video_thumb = ctx.attachment("video-thumb.jpg")?;

            let db = ctx.open_at(MIGRATE_SESSIONS_VERSION)?;
            insert_mms(&db, 1, "look at this")?;
            insert_part(&db, 1, 1, "image/png", None, Some(&image_thumb))?;
            insert_part(&db, 2, 1, "video/mp4", None, Some(&video_thumb))?;
            db.close()?;
            drop(db);

            let db = ctx.open_at(DATABASE_VERSION)?;
            assert_eq!(
                count_rows(&db, "SELECT count(*) FROM part WHERE thumbnail IS NULL")?,
                1
            );
            assert!(!image_thumb.exists());
            assert!(video_thumb.exists());
            db.close()
        },
        cleanup,
    )
}

#[test]
fn test_new_messages_are_indexed_by_triggers() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.open_at(FULL_TEXT_SEARCH)?;
            insert_sms(&db, 1, "the ferry leaves at noon")?;
            assert_eq!(
                count_rows(&db, "SELECT count(*) FROM sms_fts WHERE sms_fts MATCH 'ferry'")?,
                1
            );
            db.close()
        },
        cleanup,
    )
}

#[test]
fn test_older_code_cannot_open_newer_database() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.open_at(DATABASE_VERSION)?;
            db.close()?;
            drop(db);

            let err = ctx.open_at(QUOTED_REPLIES).err().unwrap();
            assert_eq!(
                err.kind(),
                &ErrorKind::UnsupportedDowngrade {
                    from: DATABASE_VERSION,
                    to: QUOTED_REPLIES
                }
            );

            let db = ctx.open_at(DATABASE_VERSION)?;
            assert_eq!(db.schema_version()?, DATABASE_VERSION);
            assert!(db.last_migration().unwrap().is_noop());
            db.close()
        },
        cleanup,
    )
}
