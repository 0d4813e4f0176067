//! DDL of the messenger database.

/// Tables of the first released schema, before any upgrade step.
pub const BASELINE_TABLES: &[&str] = &[
    "CREATE TABLE sms (
        _id INTEGER PRIMARY KEY,
        thread_id INTEGER,
        address TEXT,
        address_device_id INTEGER DEFAULT 1,
        person INTEGER,
        date INTEGER,
        date_sent INTEGER,
        protocol INTEGER,
        read INTEGER DEFAULT 0,
        status INTEGER DEFAULT -1,
        type INTEGER,
        reply_path_present INTEGER,
        delivery_receipt_count INTEGER DEFAULT 0,
        subject TEXT,
        body TEXT,
        mismatched_identities TEXT DEFAULT NULL,
        service_center TEXT,
        subscription_id INTEGER DEFAULT -1,
        expires_in INTEGER DEFAULT 0,
        expire_started INTEGER DEFAULT 0,
        notified DEFAULT 0,
        read_receipt_count INTEGER DEFAULT 0
    )",
    "CREATE TABLE mms (
        _id INTEGER PRIMARY KEY,
        thread_id INTEGER,
        date INTEGER,
        date_received INTEGER,
        msg_box INTEGER,
        read INTEGER DEFAULT 0,
        m_id TEXT,
        sub TEXT,
        sub_cs INTEGER,
        body TEXT,
        part_count INTEGER,
        ct_t TEXT,
        ct_l TEXT,
        address TEXT,
        address_device_id INTEGER,
        exp INTEGER,
        m_cls TEXT,
        m_type INTEGER,
        v INTEGER,
        m_size INTEGER,
        pri INTEGER,
        rr INTEGER,
        rpt_a INTEGER,
        resp_st INTEGER,
        st INTEGER,
        tr_id TEXT,
        retr_st INTEGER,
        retr_txt TEXT,
        retr_txt_cs INTEGER,
        read_status INTEGER,
        ct_cls INTEGER,
        resp_txt TEXT,
        d_tm INTEGER,
        delivery_receipt_count INTEGER DEFAULT 0,
        mismatched_identities TEXT DEFAULT NULL,
        network_failures TEXT DEFAULT NULL,
        d_rpt INTEGER,
        subscription_id INTEGER DEFAULT -1,
        expires_in INTEGER DEFAULT 0,
        expire_started INTEGER DEFAULT 0,
        notified INTEGER DEFAULT 0,
        read_receipt_count INTEGER DEFAULT 0
    )",
    "CREATE TABLE part (
        _id INTEGER PRIMARY KEY,
        mid INTEGER,
        seq INTEGER DEFAULT 0,
        ct TEXT,
        name TEXT,
        chset INTEGER,
        cd TEXT,
        fn TEXT,
        cid TEXT,
        cl TEXT,
        ctt_s INTEGER,
        ctt_t TEXT,
        encrypted INTEGER,
        pending_push INTEGER,
        _data TEXT,
        data_size INTEGER,
        file_name TEXT,
        thumbnail TEXT,
        aspect_ratio REAL,
        unique_id INTEGER NOT NULL,
        digest BLOB,
        fast_preflight_id TEXT,
        voice_note INTEGER DEFAULT 0,
        data_random BLOB,
        thumbnail_random BLOB
    )",
    "CREATE TABLE thread (
        _id INTEGER PRIMARY KEY,
        date INTEGER DEFAULT 0,
        message_count INTEGER DEFAULT 0,
        recipient_ids TEXT,
        snippet TEXT,
        snippet_cs INTEGER DEFAULT 0,
        read INTEGER DEFAULT 1,
        type INTEGER DEFAULT 0,
        error INTEGER DEFAULT 0,
        snippet_type INTEGER DEFAULT 0,
        snippet_uri TEXT DEFAULT NULL,
        archived INTEGER DEFAULT 0,
        status INTEGER DEFAULT 0,
        delivery_receipt_count INTEGER DEFAULT 0,
        expires_in INTEGER DEFAULT 0,
        last_seen INTEGER DEFAULT 0,
        has_sent INTEGER DEFAULT 0,
        read_receipt_count INTEGER DEFAULT 0
    )",
    "CREATE TABLE identities (
        _id INTEGER PRIMARY KEY,
        address TEXT UNIQUE NOT NULL,
        key TEXT NOT NULL,
        first_use INTEGER DEFAULT 0,
        timestamp INTEGER DEFAULT 0,
        verified INTEGER DEFAULT 0,
        nonblocking_approval INTEGER DEFAULT 0
    )",
    "CREATE TABLE drafts (
        _id INTEGER PRIMARY KEY,
        thread_id INTEGER,
        type TEXT,
        value TEXT
    )",
    "CREATE TABLE groups (
        _id INTEGER PRIMARY KEY,
        group_id TEXT,
        title TEXT,
        members TEXT,
        avatar BLOB,
        avatar_id INTEGER,
        avatar_key BLOB,
        avatar_content_type TEXT,
        avatar_relay TEXT,
        timestamp INTEGER,
        active INTEGER DEFAULT 1,
        avatar_digest BLOB,
        mms INTEGER DEFAULT 0
    )",
    "CREATE TABLE recipient_preferences (
        _id INTEGER PRIMARY KEY,
        recipient_ids TEXT UNIQUE,
        block INTEGER DEFAULT 0,
        notification TEXT DEFAULT NULL,
        vibrate INTEGER DEFAULT 0,
        mute_until INTEGER DEFAULT 0,
        color TEXT DEFAULT NULL,
        seen_invite_reminder INTEGER DEFAULT 0,
        default_subscription_id INTEGER DEFAULT -1,
        expire_messages INTEGER DEFAULT 0,
        registered INTEGER DEFAULT 0,
        system_display_name TEXT DEFAULT NULL,
        system_contact_photo TEXT DEFAULT NULL,
        system_phone_label TEXT DEFAULT NULL,
        system_contact_uri TEXT DEFAULT NULL,
        profile_key TEXT DEFAULT NULL,
        signal_profile_name TEXT DEFAULT NULL,
        signal_profile_avatar TEXT DEFAULT NULL,
        profile_sharing_approval INTEGER DEFAULT 0
    )",
    "CREATE TABLE group_receipts (
        _id INTEGER PRIMARY KEY,
        mms_id INTEGER,
        address TEXT,
        status INTEGER,
        timestamp INTEGER
    )",
];

pub const BASELINE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS sms_thread_id_index ON sms (thread_id)",
    "CREATE INDEX IF NOT EXISTS sms_read_index ON sms (read)",
    "CREATE INDEX IF NOT EXISTS sms_read_and_notified_thread_id_index ON sms (read, notified, thread_id)",
    "CREATE INDEX IF NOT EXISTS sms_type_index ON sms (type)",
    "CREATE INDEX IF NOT EXISTS sms_date_sent_index ON sms (date_sent)",
    "CREATE INDEX IF NOT EXISTS mms_thread_id_index ON mms (thread_id)",
    "CREATE INDEX IF NOT EXISTS mms_read_index ON mms (read)",
    "CREATE INDEX IF NOT EXISTS mms_read_and_notified_thread_id_index ON mms (read, notified, thread_id)",
    "CREATE INDEX IF NOT EXISTS mms_message_box_index ON mms (msg_box)",
    "CREATE INDEX IF NOT EXISTS mms_date_sent_index ON mms (date)",
    "CREATE INDEX IF NOT EXISTS part_mms_id_index ON part (mid)",
    "CREATE INDEX IF NOT EXISTS pending_push_index ON part (pending_push)",
    "CREATE INDEX IF NOT EXISTS thread_recipient_ids_index ON thread (recipient_ids)",
    "CREATE INDEX IF NOT EXISTS archived_count_index ON thread (archived, message_count)",
    "CREATE INDEX IF NOT EXISTS draft_thread_index ON drafts (thread_id)",
    "CREATE UNIQUE INDEX IF NOT EXISTS group_id_index ON groups (group_id)",
    "CREATE INDEX IF NOT EXISTS group_receipt_mms_id_index ON group_receipts (mms_id)",
];

pub const SIGNED_PREKEYS_TABLE: &str = "CREATE TABLE signed_prekeys (
    _id INTEGER PRIMARY KEY,
    key_id INTEGER UNIQUE,
    public_key TEXT NOT NULL,
    private_key TEXT NOT NULL,
    signature TEXT NOT NULL,
    timestamp INTEGER DEFAULT 0
)";

pub const ONE_TIME_PREKEYS_TABLE: &str = "CREATE TABLE one_time_prekeys (
    _id INTEGER PRIMARY KEY,
    key_id INTEGER UNIQUE,
    public_key TEXT NOT NULL,
    private_key TEXT NOT NULL
)";

pub const SESSIONS_TABLE: &str = "CREATE TABLE sessions (
    _id INTEGER PRIMARY KEY,
    address TEXT NOT NULL,
    device INTEGER NOT NULL,
    record BLOB NOT NULL,
    UNIQUE(address, device) ON CONFLICT REPLACE
)";

/// External-content full-text tables over message bodies, kept in sync by
/// triggers.
pub const SEARCH_TABLES: &[&str] = &[
    "CREATE VIRTUAL TABLE sms_fts USING fts5(body, content=sms, content_rowid=_id)",
    "CREATE TRIGGER sms_ai AFTER INSERT ON sms BEGIN
        INSERT INTO sms_fts(rowid, body) VALUES (new._id, new.body);
    END",
    "CREATE TRIGGER sms_ad AFTER DELETE ON sms BEGIN
        INSERT INTO sms_fts(sms_fts, rowid, body) VALUES('delete', old._id, old.body);
    END",
    "CREATE TRIGGER sms_au AFTER UPDATE ON sms BEGIN
        INSERT INTO sms_fts(sms_fts, rowid, body) VALUES('delete', old._id, old.body);
        INSERT INTO sms_fts(rowid, body) VALUES(new._id, new.body);
    END",
    "CREATE VIRTUAL TABLE mms_fts USING fts5(body, content=mms, content_rowid=_id)",
    "CREATE TRIGGER mms_ai AFTER INSERT ON mms BEGIN
        INSERT INTO mms_fts(rowid, body) VALUES (new._id, new.body);
    END",
    "CREATE TRIGGER mms_ad AFTER DELETE ON mms BEGIN
        INSERT INTO mms_fts(mms_fts, rowid, body) VALUES('delete', old._id, old.body);
    END",
    "CREATE TRIGGER mms_au AFTER UPDATE ON mms BEGIN
        INSERT INTO mms_fts(mms_fts, rowid, body) VALUES('delete', old._id, old.body);
        INSERT INTO mms_fts(rowid, body) VALUES(new._id, new.body);
    END",
];
