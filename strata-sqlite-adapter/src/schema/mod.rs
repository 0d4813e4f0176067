//! Schema of the messenger database and the ladder of steps that upgrades
//! it from any earlier release.
//!
//! | Version | Change |
//! |---------|--------|
//! | 1 | baseline tables and indexes |
//! | 2 | call ringtone and vibration preferences |
//! | 3 | signed and one-time prekey tables |
//! | 4 | sessions table |
//! | 5 | image attachments lose their thumbnails |
//! | 6 | attachment width and height |
//! | 7 | quoted replies |
//! | 8 | shared contacts |
//! | 9 | full-text search over message bodies |
//! | 10 | cleanup of rows orphaned by a broken backup import |
//!
//! Steps 5 and 10 queue the files they make obsolete. The files are removed
//! by the sweep that runs after the upgrade has committed.

mod steps;
pub mod tables;

use crate::module::SqliteModule;
use crate::store::SqliteStore;
use secure_string::SecureString;
use strata::errors::StrataResult;
use strata::migration::MigrationRegistry;
use strata::Strata;

pub const BASELINE_VERSION: u32 = 1;
pub const RECIPIENT_CALL_RINGTONE_VERSION: u32 = 2;
pub const MIGRATE_PREKEYS_VERSION: u32 = 3;
pub const MIGRATE_SESSIONS_VERSION: u32 = 4;
pub const NO_MORE_IMAGE_THUMBNAILS_VERSION: u32 = 5;
pub const ATTACHMENT_DIMENSIONS: u32 = 6;
pub const QUOTED_REPLIES: u32 = 7;
pub const SHARED_CONTACTS: u32 = 8;
pub const FULL_TEXT_SEARCH: u32 = 9;
pub const BAD_IMPORT_CLEANUP: u32 = 10;

pub const DATABASE_VERSION: u32 = 10;
pub const DATABASE_NAME: &str = "messenger.db";

/// Builds the messenger upgrade ladder.
pub fn messenger_registry() -> StrataResult<MigrationRegistry<SqliteStore>> {
    MigrationRegistry::<SqliteStore>::builder()
        .step(BASELINE_VERSION, "baseline", steps::create_baseline)
        .step(
            RECIPIENT_CALL_RINGTONE_VERSION,
            "recipient_call_ringtone",
            steps::add_call_ringtone,
        )
        .step(MIGRATE_PREKEYS_VERSION, "migrate_prekeys", steps::create_prekey_tables)
        .step(MIGRATE_SESSIONS_VERSION, "migrate_sessions", steps::create_sessions_table)
        .step(
            NO_MORE_IMAGE_THUMBNAILS_VERSION,
            "no_more_image_thumbnails",
            steps::drop_image_thumbnails,
        )
        .step(ATTACHMENT_DIMENSIONS, "attachment_dimensions", steps::add_attachment_dimensions)
        .step(QUOTED_REPLIES, "quoted_replies", steps::add_quoted_replies)
        .step(SHARED_CONTACTS, "shared_contacts", steps::add_shared_contacts)
        .step(FULL_TEXT_SEARCH, "full_text_search", steps::build_search_index)
        .step(BAD_IMPORT_CLEANUP, "bad_import_cleanup", steps::clean_bad_import)
        .build()
}

/// Opens the messenger database described by `module` and upgrades it to
/// [`DATABASE_VERSION`].
pub fn open_messenger_store(
    module: SqliteModule,
    secret: &SecureString,
) -> StrataResult<Strata<SqliteStore>> {
    Strata::builder()
        .load_module(module)
        .try_migrations(messenger_registry())
        .schema_version(DATABASE_VERSION)
        .open_or_create(secret)
}
