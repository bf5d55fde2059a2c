//! SQL schema for the facegate SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS subjects (
    subject_id    TEXT PRIMARY KEY,
    identity_code TEXT NOT NULL UNIQUE,  -- externally assigned, immutable
    name          TEXT NOT NULL,
    category      TEXT NOT NULL,
    region        TEXT NOT NULL,
    birth_date    TEXT NOT NULL,         -- YYYY-MM-DD
    face_encoding TEXT,                  -- opaque oracle blob
    image_ref     TEXT,
    is_active     INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

-- Scans are append-only. Rows leave only through retention purges; a subject
-- delete nulls subject_id and nothing more.
CREATE TABLE IF NOT EXISTS scans (
    attempt_id    TEXT PRIMARY KEY,
    outcome       TEXT NOT NULL CHECK (outcome IN ('matched', 'unmatched', 'error')),
    subject_id    TEXT REFERENCES subjects(subject_id) ON DELETE SET NULL,
    confidence    REAL,
    image_ref     TEXT,
    client_origin TEXT,
    client_agent  TEXT,
    location      TEXT,
    notes         TEXT,
    scanned_at    TEXT NOT NULL,         -- fixed-width RFC 3339 UTC
    CHECK (outcome = 'matched' OR subject_id IS NULL)
);

CREATE INDEX IF NOT EXISTS subjects_created_idx ON subjects(created_at);
CREATE INDEX IF NOT EXISTS scans_subject_idx    ON scans(subject_id);
CREATE INDEX IF NOT EXISTS scans_outcome_idx    ON scans(outcome);
CREATE INDEX IF NOT EXISTS scans_scanned_idx    ON scans(scanned_at);

PRAGMA user_version = 1;
";
