//! SQL schema for the Vigia SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS users (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL UNIQUE,
    role        TEXT NOT NULL,   -- 'student' | 'staff' | 'direction'
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL    -- ISO 8601 UTC; store-assigned
);

CREATE TABLE IF NOT EXISTS reports (
    id          TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    category    TEXT NOT NULL,
    status      TEXT NOT NULL,   -- 'pending' | 'in_review' | 'resolved'
    priority    TEXT NOT NULL DEFAULT 'medium',
    -- Not a foreign key: attribution ids may belong to identities that
    -- never had a stored profile (demo sign-ins).
    reporter_id TEXT,
    anonymous   INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS visitors (
    id             TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    document       TEXT,
    visiting       TEXT NOT NULL,
    reason         TEXT NOT NULL,
    status         TEXT NOT NULL,   -- 'checked_in' | 'checked_out'
    checked_in_at  TEXT NOT NULL,
    checked_out_at TEXT
);

CREATE TABLE IF NOT EXISTS notices (
    id          TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    body        TEXT NOT NULL,
    priority    TEXT NOT NULL DEFAULT 'medium',
    is_active   INTEGER NOT NULL DEFAULT 1,
    author_id   TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS campaigns (
    id             TEXT PRIMARY KEY,
    title          TEXT NOT NULL,
    description    TEXT NOT NULL DEFAULT '',
    scheduled_date TEXT NOT NULL,   -- ISO calendar date; sorts lexically
    is_active      INTEGER NOT NULL DEFAULT 1,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS emergency_alerts (
    id           TEXT PRIMARY KEY,
    kind         TEXT NOT NULL,   -- 'lockdown' | 'evacuation' | 'medical' | 'general'
    message      TEXT NOT NULL,
    is_active    INTEGER NOT NULL DEFAULT 1,
    triggered_by TEXT,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS checklist (
    id          TEXT PRIMARY KEY,
    label       TEXT NOT NULL,
    area        TEXT NOT NULL,
    done        INTEGER NOT NULL DEFAULT 0,
    updated_at  TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS drills (
    id             TEXT PRIMARY KEY,
    title          TEXT NOT NULL,
    kind           TEXT NOT NULL,
    scheduled_date TEXT NOT NULL,
    status         TEXT NOT NULL,   -- 'scheduled' | 'completed' | 'cancelled'
    created_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS reports_created_idx    ON reports(created_at);
CREATE INDEX IF NOT EXISTS reports_status_idx     ON reports(status);
CREATE INDEX IF NOT EXISTS visitors_status_idx    ON visitors(status);
CREATE INDEX IF NOT EXISTS notices_active_idx     ON notices(is_active);
CREATE INDEX IF NOT EXISTS campaigns_date_idx     ON campaigns(scheduled_date);
CREATE INDEX IF NOT EXISTS alerts_active_idx      ON emergency_alerts(is_active);

PRAGMA user_version = 1;
";
