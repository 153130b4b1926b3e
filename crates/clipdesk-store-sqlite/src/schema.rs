//! SQL schema for the clipdesk SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// There are deliberately no foreign keys between the tables. A submission
/// keeps its raw `referrer_ref` after the referrer is deleted, and deleting a
/// submission leaves its notification in place.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS admins (
    admin_id      TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    display_name  TEXT,
    password_hash TEXT NOT NULL,
    form_link     TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS employees (
    employee_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL UNIQUE,
    form_link   TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS submissions (
    submission_id     TEXT PRIMARY KEY,
    referrer_ref      TEXT,              -- raw, unresolved
    is_admin_referrer INTEGER NOT NULL,  -- decided once, never recomputed
    first_name        TEXT NOT NULL,
    last_name         TEXT NOT NULL,
    email             TEXT NOT NULL,
    country           TEXT NOT NULL,
    social_handle     TEXT NOT NULL,
    video_url         TEXT NOT NULL,
    raw_video_url     TEXT NOT NULL,
    title             TEXT,
    description       TEXT,
    consent           TEXT NOT NULL,     -- JSON-encoded Consent
    signature         TEXT NOT NULL,
    originating_ip    TEXT NOT NULL,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id   TEXT PRIMARY KEY,
    creator_name      TEXT NOT NULL,
    employee_name     TEXT NOT NULL,
    is_admin_referrer INTEGER NOT NULL,
    submission_id     TEXT NOT NULL,
    message           TEXT NOT NULL,
    created_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS submissions_referrer_idx ON submissions(referrer_ref);

PRAGMA user_version = 1;
";
