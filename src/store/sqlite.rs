//! SQLite-backed planner store.
//!
//! One database file at `{root_dir}/{db_filename}` holds habits, substeps,
//! triggers, occurrences, task instances, and the habit audit trail.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, warn};

use super::schema::{apply_schema, read_schema_version};
use super::{CommitOutcome, PlannerStore, PublishFn};
use crate::error::{PlannerError, Result};
use crate::habits::{
    GeneratedTaskInstance, Habit, HabitEvent, HabitEventKind, HabitSnapshot, HabitTrigger,
    Occurrence, OccurrenceStatus, RecurrenceType, SubEntity, Weekday, new_id,
};
use crate::timezone::parse_local_time;

/// How long a writer waits on another process's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const HABIT_COLUMNS: &str = "id, user_id, domain, entity_id, entity_name, recurrence, \
     target_weekday, target_time, start_date, timezone, is_active, archived";

const OCCURRENCE_COLUMNS: &str = "id, user_id, domain, entity_id, sub_entity_id, habit_id, \
     status, target_date, cycle_key, created_at";

const INSTANCE_COLUMNS: &str = "id, user_id, habit_id, instance_id, title, due_date, \
     preferred_time, scheduled_for, timezone, domain, entity_id, sub_entity_id";

/// SQLite planner store.
///
/// Thread-safe via an internal `Mutex<Connection>`. Every multi-row write
/// runs in one transaction; the `(habit_id, cycle_key)` unique constraint
/// settles races between processes sharing the file.
pub struct SqlitePlannerStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqlitePlannerStore {
    /// Open (or create) the database at `{root_dir}/{db_filename}`.
    pub fn new(root_dir: &Path, db_filename: &str) -> Result<Self> {
        std::fs::create_dir_all(root_dir).map_err(|e| StoreError::Io(e.to_string()))?;
        let db_path = root_dir.join(db_filename);
        let conn = Connection::open(&db_path).map_err(db)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(db)?;
        apply_schema(&conn).map_err(db)?;
        info!(path = %db_path.display(), "planner store opened");
        Ok(Self {
            path: Some(db_path),
            conn: Mutex::new(conn),
        })
    }

    /// Private in-memory database, for tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db)?;
        apply_schema(&conn).map_err(db)?;
        Ok(Self {
            path: None,
            conn: Mutex::new(conn),
        })
    }

    /// Database file path; `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn schema_version(&self) -> Result<Option<u32>> {
        let conn = self.lock()?;
        read_schema_version(&conn).map_err(db)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()).into())
    }
}

impl PlannerStore for SqlitePlannerStore {
    fn insert_habit(
        &self,
        habit: &Habit,
        substeps: &[SubEntity],
        trigger: Option<&HabitTrigger>,
    ) -> Result<()> {
        let conn = self.lock()?;
        let now = Utc::now().timestamp();
        let tx = conn.unchecked_transaction().map_err(db)?;

        tx.execute(
            "INSERT INTO habits \
             (id, user_id, domain, entity_id, entity_name, recurrence, target_weekday, \
              target_time, start_date, timezone, is_active, archived, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                habit.id,
                habit.user_id,
                habit.domain,
                habit.entity_id,
                habit.entity_name,
                recurrence_to_str(habit.recurrence),
                habit.target_weekday.map(Weekday::name),
                habit.target_time.map(format_time),
                habit.start_date.to_string(),
                habit.timezone,
                habit.is_active,
                habit.archived,
                now,
                now
            ],
        )
        .map_err(db)?;

        write_substeps(&tx, &habit.id, substeps, trigger).map_err(db)?;
        record_event(
            &tx,
            &habit.id,
            HabitEventKind::Created,
            &format!("{} substeps", substeps.len()),
            now,
        )
        .map_err(db)?;

        tx.commit().map_err(db)?;
        debug!(habit_id = %habit.id, user_id = %habit.user_id, "habit inserted");
        Ok(())
    }

    fn load_habit_snapshot(&self, habit_id: &str) -> Result<HabitSnapshot> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction().map_err(db)?;
        let snapshot = load_snapshot(&tx, habit_id).map_err(db)?;
        tx.commit().map_err(db)?;
        snapshot.ok_or_else(|| PlannerError::NotFound(format!("habit {habit_id}")))
    }

    fn list_habits(&self, user_id: &str, include_inactive: bool) -> Result<Vec<HabitSnapshot>> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction().map_err(db)?;

        let habits: Vec<Habit> = {
            let sql = format!(
                "SELECT {HABIT_COLUMNS} FROM habits \
                 WHERE user_id = ?1 AND (?2 OR (is_active = 1 AND archived = 0)) \
                 ORDER BY created_at, id"
            );
            let mut stmt = tx.prepare(&sql).map_err(db)?;
            let rows = stmt
                .query_map(params![user_id, include_inactive], row_to_habit)
                .map_err(db)?;
            rows.collect::<rusqlite::Result<_>>().map_err(db)?
        };

        let mut snapshots = Vec::with_capacity(habits.len());
        for habit in habits {
            let substeps = load_substeps(&tx, &habit.id).map_err(db)?;
            let trigger = load_trigger(&tx, &habit.id).map_err(db)?;
            snapshots.push(HabitSnapshot {
                habit,
                substeps,
                trigger,
            });
        }

        tx.commit().map_err(db)?;
        Ok(snapshots)
    }

    fn set_habit_active(&self, habit_id: &str, active: bool) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction().map_err(db)?;

        let (is_active, archived) = habit_flags(&tx, habit_id)?;
        if archived && active {
            return Err(PlannerError::Validation(format!(
                "habit {habit_id} is archived and cannot be reactivated"
            )));
        }
        if is_active == active {
            return Ok(());
        }

        let now = Utc::now().timestamp();
        tx.execute(
            "UPDATE habits SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
            params![active, now, habit_id],
        )
        .map_err(db)?;
        let kind = if active {
            HabitEventKind::Activated
        } else {
            HabitEventKind::Deactivated
        };
        record_event(&tx, habit_id, kind, "", now).map_err(db)?;

        tx.commit().map_err(db)?;
        debug!(habit_id, active, "habit active flag changed");
        Ok(())
    }

    fn archive_habit(&self, habit_id: &str) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction().map_err(db)?;

        let (_, archived) = habit_flags(&tx, habit_id)?;
        if archived {
            return Ok(());
        }

        let now = Utc::now().timestamp();
        tx.execute(
            "UPDATE habits SET archived = 1, is_active = 0, updated_at = ?1 WHERE id = ?2",
            params![now, habit_id],
        )
        .map_err(db)?;
        record_event(&tx, habit_id, HabitEventKind::Archived, "", now).map_err(db)?;

        tx.commit().map_err(db)?;
        debug!(habit_id, "habit archived");
        Ok(())
    }

    fn replace_substeps(
        &self,
        habit_id: &str,
        substeps: &[SubEntity],
        trigger: Option<&HabitTrigger>,
    ) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction().map_err(db)?;

        habit_flags(&tx, habit_id)?;
        let now = Utc::now().timestamp();
        write_substeps(&tx, habit_id, substeps, trigger).map_err(db)?;
        tx.execute(
            "UPDATE habits SET updated_at = ?1 WHERE id = ?2",
            params![now, habit_id],
        )
        .map_err(db)?;
        record_event(
            &tx,
            habit_id,
            HabitEventKind::SubstepsReplaced,
            &format!("{} substeps", substeps.len()),
            now,
        )
        .map_err(db)?;

        tx.commit().map_err(db)?;
        Ok(())
    }

    fn has_occurrence(&self, habit_id: &str, cycle_key: &str) -> Result<bool> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM occurrences WHERE habit_id = ?1 AND cycle_key = ?2)",
            params![habit_id, cycle_key],
            |row| row.get(0),
        )
        .map_err(db)
    }

    fn commit_occurrence(
        &self,
        occurrence: &Occurrence,
        instances: &[GeneratedTaskInstance],
        publish: PublishFn<'_>,
    ) -> Result<CommitOutcome> {
        let conn = self.lock()?;
        let now = Utc::now().timestamp();
        let tx = conn.unchecked_transaction().map_err(db)?;

        let inserted = tx.execute(
            "INSERT INTO occurrences \
             (id, user_id, domain, entity_id, sub_entity_id, habit_id, status, target_date, \
              cycle_key, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                occurrence.id,
                occurrence.user_id,
                occurrence.domain,
                occurrence.entity_id,
                occurrence.sub_entity_id,
                occurrence.habit_id,
                occurrence.status.as_str(),
                occurrence.target_date.to_string(),
                occurrence.cycle_key,
                occurrence.created_at.timestamp(),
                now
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                debug!(
                    habit_id = %occurrence.habit_id,
                    cycle_key = %occurrence.cycle_key,
                    "occurrence already generated"
                );
                return Ok(CommitOutcome::AlreadyGenerated);
            }
            Err(e) => return Err(db(e)),
        }

        {
            let sql = format!(
                "INSERT INTO task_instances ({INSTANCE_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            );
            let mut stmt = tx.prepare(&sql).map_err(db)?;
            for instance in instances {
                stmt.execute(params![
                    instance.id,
                    instance.user_id,
                    instance.habit_id,
                    instance.instance_id,
                    instance.title,
                    instance.due_date.to_string(),
                    format_time(instance.preferred_time),
                    instance.scheduled_for.timestamp(),
                    instance.timezone,
                    instance.domain,
                    instance.entity_id,
                    instance.sub_entity_id
                ])
                .map_err(db)?;
            }
        }

        // Dropping `tx` on the error path rolls everything back.
        if let Err(e) = publish(instances) {
            warn!(
                habit_id = %occurrence.habit_id,
                cycle_key = %occurrence.cycle_key,
                "publish failed, rolling back occurrence: {e}"
            );
            return Err(e);
        }

        tx.commit().map_err(db)?;
        Ok(CommitOutcome::Inserted)
    }

    fn list_occurrences(&self, habit_id: &str) -> Result<Vec<Occurrence>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {OCCURRENCE_COLUMNS} FROM occurrences WHERE habit_id = ?1 \
             ORDER BY target_date, created_at"
        );
        let mut stmt = conn.prepare(&sql).map_err(db)?;
        let rows = stmt
            .query_map(params![habit_id], row_to_occurrence)
            .map_err(db)?;
        rows.collect::<rusqlite::Result<_>>().map_err(db)
    }

    fn set_occurrence_status(&self, occurrence_id: &str, status: OccurrenceStatus) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction().map_err(db)?;

        let current: Option<String> = tx
            .query_row(
                "SELECT status FROM occurrences WHERE id = ?1",
                params![occurrence_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(db)?;
        let current = current
            .ok_or_else(|| PlannerError::NotFound(format!("occurrence {occurrence_id}")))?;
        let current = str_to_status(&current).ok_or_else(|| {
            StoreError::Corrupt(format!("occurrence {occurrence_id} has status {current}"))
        })?;

        if !current.can_transition_to(status) {
            return Err(PlannerError::Validation(format!(
                "occurrence {occurrence_id} cannot move from {} to {}",
                current.as_str(),
                status.as_str()
            )));
        }

        tx.execute(
            "UPDATE occurrences SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), Utc::now().timestamp(), occurrence_id],
        )
        .map_err(db)?;
        tx.commit().map_err(db)?;
        Ok(())
    }

    fn list_task_instances(
        &self,
        user_id: &str,
        due_date: NaiveDate,
    ) -> Result<Vec<GeneratedTaskInstance>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {INSTANCE_COLUMNS} FROM task_instances \
             WHERE user_id = ?1 AND due_date = ?2 ORDER BY scheduled_for, title"
        );
        let mut stmt = conn.prepare(&sql).map_err(db)?;
        let rows = stmt
            .query_map(params![user_id, due_date.to_string()], row_to_instance)
            .map_err(db)?;
        rows.collect::<rusqlite::Result<_>>().map_err(db)
    }

    fn habit_events(&self, habit_id: &str) -> Result<Vec<HabitEvent>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, habit_id, kind, note, at FROM habit_events \
                 WHERE habit_id = ?1 ORDER BY at, rowid",
            )
            .map_err(db)?;
        let rows = stmt.query_map(params![habit_id], row_to_event).map_err(db)?;
        rows.collect::<rusqlite::Result<_>>().map_err(db)
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from the SQLite backend. Surface as [`PlannerError::Persistence`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("lock poisoned: {0}")]
    Lock(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<StoreError> for PlannerError {
    fn from(e: StoreError) -> Self {
        PlannerError::Persistence(e.to_string())
    }
}

fn db(e: rusqlite::Error) -> PlannerError {
    StoreError::Sqlite(e).into()
}

// ---------------------------------------------------------------------------
// Shared queries
// ---------------------------------------------------------------------------

fn habit_flags(conn: &Connection, habit_id: &str) -> Result<(bool, bool)> {
    conn.query_row(
        "SELECT is_active, archived FROM habits WHERE id = ?1",
        params![habit_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
    .map_err(db)?
    .ok_or_else(|| PlannerError::NotFound(format!("habit {habit_id}")))
}

fn load_snapshot(conn: &Connection, habit_id: &str) -> rusqlite::Result<Option<HabitSnapshot>> {
    let sql = format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1");
    let Some(habit) = conn
        .query_row(&sql, params![habit_id], row_to_habit)
        .optional()?
    else {
        return Ok(None);
    };
    let substeps = load_substeps(conn, habit_id)?;
    let trigger = load_trigger(conn, habit_id)?;
    Ok(Some(HabitSnapshot {
        habit,
        substeps,
        trigger,
    }))
}

fn load_substeps(conn: &Connection, habit_id: &str) -> rusqlite::Result<Vec<SubEntity>> {
    let mut stmt = conn.prepare(
        "SELECT id, habit_id, sub_entity_id, sub_entity_name, scheduled_weekday, \
         scheduled_time, is_main_event, title_override FROM habit_sub_entities \
         WHERE habit_id = ?1 ORDER BY position",
    )?;
    let rows = stmt.query_map(params![habit_id], row_to_substep)?;
    rows.collect()
}

fn load_trigger(conn: &Connection, habit_id: &str) -> rusqlite::Result<Option<HabitTrigger>> {
    conn.query_row(
        "SELECT habit_id, trigger_sub_entity_id, trigger_weekday FROM habit_triggers \
         WHERE habit_id = ?1",
        params![habit_id],
        |row| {
            Ok(HabitTrigger {
                habit_id: row.get(0)?,
                trigger_sub_entity_id: row.get(1)?,
                trigger_weekday: parse_weekday(row, 2)?,
            })
        },
    )
    .optional()
}

fn write_substeps(
    conn: &Connection,
    habit_id: &str,
    substeps: &[SubEntity],
    trigger: Option<&HabitTrigger>,
) -> rusqlite::Result<()> {
    conn.execute(
        "DELETE FROM habit_sub_entities WHERE habit_id = ?1",
        params![habit_id],
    )?;
    conn.execute("DELETE FROM habit_triggers WHERE habit_id = ?1", params![habit_id])?;

    let mut stmt = conn.prepare(
        "INSERT INTO habit_sub_entities \
         (id, habit_id, position, sub_entity_id, sub_entity_name, scheduled_weekday, \
          scheduled_time, is_main_event, title_override) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;
    for (position, substep) in substeps.iter().enumerate() {
        stmt.execute(params![
            substep.id,
            habit_id,
            position as i64,
            substep.sub_entity_id,
            substep.sub_entity_name,
            substep.scheduled_weekday.name(),
            substep.scheduled_time.map(format_time),
            substep.is_main_event,
            substep.title_override
        ])?;
    }

    if let Some(trigger) = trigger {
        conn.execute(
            "INSERT INTO habit_triggers (habit_id, trigger_sub_entity_id, trigger_weekday) \
             VALUES (?1, ?2, ?3)",
            params![
                habit_id,
                trigger.trigger_sub_entity_id,
                trigger.trigger_weekday.name()
            ],
        )?;
    }
    Ok(())
}

fn record_event(
    conn: &Connection,
    habit_id: &str,
    kind: HabitEventKind,
    note: &str,
    at: i64,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO habit_events (id, habit_id, kind, note, at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![new_id(), habit_id, event_kind_to_str(kind), note, at],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Row conversion helpers
// ---------------------------------------------------------------------------

fn row_to_habit(row: &rusqlite::Row<'_>) -> rusqlite::Result<Habit> {
    let recurrence: String = row.get(5)?;
    let target_weekday: Option<String> = row.get(6)?;
    Ok(Habit {
        id: row.get(0)?,
        user_id: row.get(1)?,
        domain: row.get(2)?,
        entity_id: row.get(3)?,
        entity_name: row.get(4)?,
        recurrence: str_to_recurrence(&recurrence)
            .ok_or_else(|| conversion_error(5, format!("unknown recurrence {recurrence}")))?,
        target_weekday: target_weekday
            .map(|w| w.parse::<Weekday>().map_err(|e| conversion_error(6, e)))
            .transpose()?,
        target_time: parse_optional_time(row, 7)?,
        start_date: parse_date(row, 8)?,
        timezone: row.get(9)?,
        is_active: row.get(10)?,
        archived: row.get(11)?,
    })
}

fn row_to_substep(row: &rusqlite::Row<'_>) -> rusqlite::Result<SubEntity> {
    Ok(SubEntity {
        id: row.get(0)?,
        habit_id: row.get(1)?,
        sub_entity_id: row.get(2)?,
        sub_entity_name: row.get(3)?,
        scheduled_weekday: parse_weekday(row, 4)?,
        scheduled_time: parse_optional_time(row, 5)?,
        is_main_event: row.get(6)?,
        title_override: row.get(7)?,
    })
}

fn row_to_occurrence(row: &rusqlite::Row<'_>) -> rusqlite::Result<Occurrence> {
    let status: String = row.get(6)?;
    Ok(Occurrence {
        id: row.get(0)?,
        user_id: row.get(1)?,
        domain: row.get(2)?,
        entity_id: row.get(3)?,
        sub_entity_id: row.get(4)?,
        habit_id: row.get(5)?,
        status: str_to_status(&status)
            .ok_or_else(|| conversion_error(6, format!("unknown status {status}")))?,
        target_date: parse_date(row, 7)?,
        cycle_key: row.get(8)?,
        created_at: from_epoch(row.get(9)?),
    })
}

fn row_to_instance(row: &rusqlite::Row<'_>) -> rusqlite::Result<GeneratedTaskInstance> {
    let preferred_time: String = row.get(6)?;
    Ok(GeneratedTaskInstance {
        id: row.get(0)?,
        user_id: row.get(1)?,
        habit_id: row.get(2)?,
        instance_id: row.get(3)?,
        title: row.get(4)?,
        due_date: parse_date(row, 5)?,
        preferred_time: parse_local_time(&preferred_time)
            .map_err(|e| conversion_error(6, e.to_string()))?,
        scheduled_for: from_epoch(row.get(7)?),
        timezone: row.get(8)?,
        domain: row.get(9)?,
        entity_id: row.get(10)?,
        sub_entity_id: row.get(11)?,
    })
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<HabitEvent> {
    let kind: String = row.get(2)?;
    Ok(HabitEvent {
        id: row.get(0)?,
        habit_id: row.get(1)?,
        kind: str_to_event_kind(&kind)
            .ok_or_else(|| conversion_error(2, format!("unknown event kind {kind}")))?,
        note: row.get(3)?,
        at: from_epoch(row.get(4)?),
    })
}

fn conversion_error(idx: usize, msg: impl Into<String>) -> rusqlite::Error {
    let msg: String = msg.into();
    let err: Box<dyn std::error::Error + Send + Sync> = msg.into();
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, err)
}

fn parse_date(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| conversion_error(idx, e.to_string()))
}

fn parse_weekday(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Weekday> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: String| conversion_error(idx, e))
}

fn parse_optional_time(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveTime>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|t| parse_local_time(&t).map_err(|e| conversion_error(idx, e.to_string())))
        .transpose()
}

fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

fn from_epoch(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn recurrence_to_str(recurrence: RecurrenceType) -> &'static str {
    match recurrence {
        RecurrenceType::Daily => "daily",
        RecurrenceType::Weekly => "weekly",
    }
}

fn str_to_recurrence(s: &str) -> Option<RecurrenceType> {
    match s {
        "daily" => Some(RecurrenceType::Daily),
        "weekly" => Some(RecurrenceType::Weekly),
        _ => None,
    }
}

fn str_to_status(s: &str) -> Option<OccurrenceStatus> {
    match s {
        "planned" => Some(OccurrenceStatus::Planned),
        "active" => Some(OccurrenceStatus::Active),
        "completed" => Some(OccurrenceStatus::Completed),
        "cancelled" => Some(OccurrenceStatus::Cancelled),
        _ => None,
    }
}

fn event_kind_to_str(kind: HabitEventKind) -> &'static str {
    match kind {
        HabitEventKind::Created => "created",
        HabitEventKind::Activated => "activated",
        HabitEventKind::Deactivated => "deactivated",
        HabitEventKind::Archived => "archived",
        HabitEventKind::SubstepsReplaced => "substeps_replaced",
    }
}

fn str_to_event_kind(s: &str) -> Option<HabitEventKind> {
    match s {
        "created" => Some(HabitEventKind::Created),
        "activated" => Some(HabitEventKind::Activated),
        "deactivated" => Some(HabitEventKind::Deactivated),
        "archived" => Some(HabitEventKind::Archived),
        "substeps_replaced" => Some(HabitEventKind::SubstepsReplaced),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
