//! SQLite DDL for the planner database.
//!
//! All `CREATE TABLE` / `CREATE INDEX` statements live here so they can be
//! reviewed and tested in isolation.

use rusqlite::Connection;

/// Version written to `schema_meta` on a fresh database.
pub(crate) const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Complete DDL. Every statement uses `IF NOT EXISTS`, so `apply_schema` is
/// idempotent.
pub(crate) const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS schema_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS habits (
    id             TEXT PRIMARY KEY,
    user_id        TEXT NOT NULL,
    domain         TEXT,
    entity_id      TEXT,
    entity_name    TEXT NOT NULL,
    recurrence     TEXT NOT NULL,      -- 'daily' | 'weekly'
    target_weekday TEXT,               -- lowercase weekday name
    target_time    TEXT,               -- HH:MM
    start_date     TEXT NOT NULL,      -- YYYY-MM-DD
    timezone       TEXT NOT NULL,
    is_active      INTEGER NOT NULL DEFAULT 1,
    archived       INTEGER NOT NULL DEFAULT 0,
    created_at     INTEGER NOT NULL DEFAULT 0,
    updated_at     INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_habits_user ON habits(user_id, is_active, archived);

-- Substeps keep their insertion order; trigger ties resolve to the first one.
CREATE TABLE IF NOT EXISTS habit_sub_entities (
    id                TEXT PRIMARY KEY,
    habit_id          TEXT NOT NULL REFERENCES habits(id),
    position          INTEGER NOT NULL,
    sub_entity_id     TEXT,
    sub_entity_name   TEXT NOT NULL,
    scheduled_weekday TEXT NOT NULL,
    scheduled_time    TEXT,
    is_main_event     INTEGER NOT NULL DEFAULT 0,
    title_override    TEXT
);

CREATE INDEX IF NOT EXISTS idx_sub_entities_habit ON habit_sub_entities(habit_id, position);

CREATE TABLE IF NOT EXISTS habit_triggers (
    habit_id              TEXT PRIMARY KEY REFERENCES habits(id),
    trigger_sub_entity_id TEXT,
    trigger_weekday       TEXT NOT NULL
);

-- At most one occurrence per habit per cycle.
CREATE TABLE IF NOT EXISTS occurrences (
    id            TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL,
    domain        TEXT,
    entity_id     TEXT,
    sub_entity_id TEXT,
    habit_id      TEXT NOT NULL REFERENCES habits(id),
    status        TEXT NOT NULL DEFAULT 'planned',
    target_date   TEXT NOT NULL,
    cycle_key     TEXT NOT NULL,
    created_at    INTEGER NOT NULL DEFAULT 0,
    updated_at    INTEGER NOT NULL DEFAULT 0,
    UNIQUE (habit_id, cycle_key)
);

CREATE INDEX IF NOT EXISTS idx_occurrences_user_date ON occurrences(user_id, target_date);

CREATE TABLE IF NOT EXISTS task_instances (
    id             TEXT PRIMARY KEY,
    instance_id    TEXT NOT NULL REFERENCES occurrences(id),
    user_id        TEXT NOT NULL,
    habit_id       TEXT NOT NULL,
    title          TEXT NOT NULL,
    due_date       TEXT NOT NULL,
    preferred_time TEXT NOT NULL,
    scheduled_for  INTEGER NOT NULL,   -- epoch seconds, UTC
    timezone       TEXT NOT NULL,
    domain         TEXT,
    entity_id      TEXT,
    sub_entity_id  TEXT
);

CREATE INDEX IF NOT EXISTS idx_task_instances_user_due ON task_instances(user_id, due_date);

CREATE TABLE IF NOT EXISTS habit_events (
    id       TEXT PRIMARY KEY,
    habit_id TEXT NOT NULL,
    kind     TEXT NOT NULL,
    note     TEXT NOT NULL,
    at       INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_habit_events_habit ON habit_events(habit_id, at);
"#;

/// Apply the full schema and seed the version on a fresh database.
pub(crate) fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
        rusqlite::params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}

/// `None` if the version row is missing or unparseable.
pub(crate) fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<u32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_meta WHERE key = 'schema_version'")?;
    let mut rows = stmt.query([])?;
    match rows.next()? {
        Some(row) => {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().ok())
        }
        None => Ok(None),
    }
}
