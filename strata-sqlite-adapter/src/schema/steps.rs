use super::tables::{
    BASELINE_INDEXES, BASELINE_TABLES, ONE_TIME_PREKEYS_TABLE, SEARCH_TABLES, SESSIONS_TABLE,
    SIGNED_PREKEYS_TABLE,
};
use crate::session::SqliteSession;
use rusqlite::params;
use std::path::Path;
use std::time::Instant;
use strata::errors::StrataResult;
use strata::store::StoreSession;

fn execute_all(session: &SqliteSession, statements: &[&str]) -> StrataResult<()> {
    for sql in statements {
        session.execute_batch(sql)?;
    }
    Ok(())
}

pub(crate) fn create_baseline(session: &mut SqliteSession) -> StrataResult<()> {
    execute_all(session, BASELINE_TABLES)?;
    execute_all(session, BASELINE_INDEXES)
}

pub(crate) fn add_call_ringtone(session: &mut SqliteSession) -> StrataResult<()> {
    session.execute_batch(
        "ALTER TABLE recipient_preferences ADD COLUMN call_ringtone TEXT DEFAULT NULL;
         ALTER TABLE recipient_preferences ADD COLUMN call_vibrate INTEGER DEFAULT 0;",
    )
}

pub(crate) fn create_prekey_tables(session: &mut SqliteSession) -> StrataResult<()> {
    execute_all(session, &[SIGNED_PREKEYS_TABLE, ONE_TIME_PREKEYS_TABLE])
}

pub(crate) fn create_sessions_table(session: &mut SqliteSession) -> StrataResult<()> {
    session.execute_batch(SESSIONS_TABLE)
}

/// Image attachments stop carrying thumbnails. Video thumbnails stay.
pub(crate) fn drop_image_thumbnails(session: &mut SqliteSession) -> StrataResult<()> {
    let rows: Vec<(i64, Option<String>, String)> = session.with_connection(|conn| {
        let mut stmt =
            conn.prepare("SELECT _id, ct, thumbnail FROM part WHERE thumbnail IS NOT NULL")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
        rows.collect()
    })?;

    let mut cleared = 0;
    for (id, content_type, thumbnail) in rows {
        match content_type {
            Some(content_type) if !content_type.starts_with("video") => {
                session.execute(
                    "UPDATE part SET thumbnail = NULL, aspect_ratio = NULL, thumbnail_random = NULL WHERE _id = ?1",
                    params![id],
                )?;
                session.schedule_removal(Path::new(&thumbnail))?;
                cleared += 1;
            }
            _ => {}
        }
    }

    log::info!("Cleared {} image thumbnails", cleared);
    Ok(())
}

pub(crate) fn add_attachment_dimensions(session: &mut SqliteSession) -> StrataResult<()> {
    session.execute_batch(
        "ALTER TABLE part ADD COLUMN width INTEGER DEFAULT 0;
         ALTER TABLE part ADD COLUMN height INTEGER DEFAULT 0;",
    )
}

pub(crate) fn add_quoted_replies(session: &mut SqliteSession) -> StrataResult<()> {
    session.execute_batch(
        "ALTER TABLE mms ADD COLUMN quote_id INTEGER DEFAULT 0;
         ALTER TABLE mms ADD COLUMN quote_author TEXT;
         ALTER TABLE mms ADD COLUMN quote_body TEXT;
         ALTER TABLE mms ADD COLUMN quote_attachment INTEGER DEFAULT -1;
         ALTER TABLE part ADD COLUMN quote INTEGER DEFAULT 0;",
    )
}

pub(crate) fn add_shared_contacts(session: &mut SqliteSession) -> StrataResult<()> {
    session.execute_batch("ALTER TABLE mms ADD COLUMN shared_contacts TEXT")
}

pub(crate) fn build_search_index(session: &mut SqliteSession) -> StrataResult<()> {
    execute_all(session, SEARCH_TABLES)?;

    log::info!("Beginning to build search index");
    let start = Instant::now();

    session.execute_batch("INSERT INTO sms_fts (rowid, body) SELECT _id, body FROM sms")?;
    let sms_finished = Instant::now();
    log::info!(
        "Indexing SMS completed in {} ms",
        (sms_finished - start).as_millis()
    );

    session.execute_batch("INSERT INTO mms_fts (rowid, body) SELECT _id, body FROM mms")?;
    let mms_finished = Instant::now();
    log::info!(
        "Indexing MMS completed in {} ms",
        (mms_finished - sms_finished).as_millis()
    );
    log::info!(
        "Indexing finished, total time {} ms",
        (mms_finished - start).as_millis()
    );
    Ok(())
}

/// Removes receipts and attachments left behind by a broken backup import,
/// i.e. rows pointing at a message that does not exist.
pub(crate) fn clean_bad_import(session: &mut SqliteSession) -> StrataResult<()> {
    let receipts =
        session.execute("DELETE FROM group_receipts WHERE mms_id NOT IN (SELECT _id FROM mms)", [])?;

    let orphans: Vec<(i64, i64, Option<String>, Option<String>)> =
        session.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT _id, unique_id, _data, thumbnail FROM part WHERE mid NOT IN (SELECT _id FROM mms)",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?;
            rows.collect()
        })?;

    for (id, unique_id, data, thumbnail) in &orphans {
        session.execute(
            "DELETE FROM part WHERE _id = ?1 AND unique_id = ?2",
            params![id, unique_id],
        )?;

        for file in [data, thumbnail].into_iter().flatten() {
            if !file.is_empty() {
                session.schedule_removal(Path::new(file))?;
            }
        }
    }

    log::info!(
        "Removed {} orphaned receipts and {} orphaned attachments",
        receipts,
        orphans.len()
    );
    Ok(())
}
