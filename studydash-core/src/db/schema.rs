//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.
//! Timestamps are stored as RFC 3339 text with a fixed microsecond precision
//! so that lexical order matches chronological order.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: syllabus tree and session log
    r#"
    -- ============================================
    -- Syllabus tree
    -- ============================================

    CREATE TABLE IF NOT EXISTS subjects (
        id               TEXT PRIMARY KEY,
        course_code      TEXT NOT NULL,
        name             TEXT NOT NULL,
        cycle            TEXT NOT NULL CHECK (cycle IN ('physics', 'chemistry')),
        credits          INTEGER NOT NULL,
        position         INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS modules (
        id               TEXT PRIMARY KEY,
        subject_id       TEXT NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
        number           INTEGER NOT NULL,
        title            TEXT NOT NULL,
        description      TEXT,

        UNIQUE(subject_id, number)
    );

    CREATE TABLE IF NOT EXISTS subtopics (
        id               TEXT PRIMARY KEY,
        module_id        TEXT NOT NULL REFERENCES modules(id) ON DELETE CASCADE,
        position         INTEGER NOT NULL,
        title            TEXT NOT NULL,
        completed        INTEGER NOT NULL DEFAULT 0,

        UNIQUE(module_id, position)
    );

    CREATE TABLE IF NOT EXISTS attachments (
        id               TEXT PRIMARY KEY,
        module_id        TEXT NOT NULL REFERENCES modules(id) ON DELETE CASCADE,
        file_name        TEXT NOT NULL,
        file_size        INTEGER NOT NULL,
        mime_type        TEXT NOT NULL,
        created_at       TEXT NOT NULL,
        analysis         TEXT
    );

    -- ============================================
    -- Session log (append-only)
    -- ============================================

    -- seq preserves insertion order; subject/module/topic are soft references
    CREATE TABLE IF NOT EXISTS study_sessions (
        seq              INTEGER PRIMARY KEY AUTOINCREMENT,
        id               TEXT NOT NULL UNIQUE,
        subject_id       TEXT,
        module_id        TEXT,
        topic_id         TEXT,
        duration_minutes INTEGER NOT NULL CHECK (duration_minutes > 0),
        started_at       TEXT NOT NULL,
        ended_at         TEXT NOT NULL
    );

    -- ============================================
    -- Indexes
    -- ============================================

    CREATE INDEX IF NOT EXISTS idx_modules_subject ON modules(subject_id, number);
    CREATE INDEX IF NOT EXISTS idx_subtopics_module ON subtopics(module_id, position);
    CREATE INDEX IF NOT EXISTS idx_attachments_module ON attachments(module_id);
    CREATE INDEX IF NOT EXISTS idx_study_sessions_started ON study_sessions(started_at);
    CREATE INDEX IF NOT EXISTS idx_study_sessions_subject ON study_sessions(subject_id);
    "#,
    // Version 2: planner and settings
    r#"
    CREATE TABLE IF NOT EXISTS plan_tasks (
        id               TEXT PRIMARY KEY,
        plan_date        TEXT NOT NULL,
        position         INTEGER NOT NULL,
        title            TEXT NOT NULL,
        completed        INTEGER NOT NULL DEFAULT 0,
        created_at       TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS settings (
        key              TEXT PRIMARY KEY,
        value            TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_plan_tasks_date ON plan_tasks(plan_date, position);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version = get_schema_version(conn)?;

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.pragma_update(None, "user_version", version)?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
