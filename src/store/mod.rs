//! Persistence for habits, occurrences, and generated task instances.
//!
//! Sub-modules:
//! - `schema`: SQLite DDL and schema versioning.
//! - `sqlite`: [`SqlitePlannerStore`], the bundled backend.
//!
//! The generator only talks to the [`PlannerStore`] trait, so tests and
//! embedders can supply their own backend.

pub(crate) mod schema;
pub mod sqlite;

use chrono::NaiveDate;

use crate::error::Result;
use crate::habits::{
    GeneratedTaskInstance, Habit, HabitEvent, HabitSnapshot, HabitTrigger, Occurrence,
    OccurrenceStatus, SubEntity,
};

pub use sqlite::{SqlitePlannerStore, StoreError};

/// Result of [`PlannerStore::commit_occurrence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The occurrence and its task instances were written and published.
    Inserted,
    /// Another writer already produced this cycle; nothing was written.
    AlreadyGenerated,
}

/// Hands a batch to the downstream consumer while the commit transaction is
/// still open. An error rolls the whole habit back.
pub type PublishFn<'a> = &'a (dyn Fn(&[GeneratedTaskInstance]) -> Result<()> + 'a);

/// Storage operations the planner needs.
pub trait PlannerStore: Send + Sync {
    /// Insert a habit with its substeps and trigger in one transaction.
    fn insert_habit(
        &self,
        habit: &Habit,
        substeps: &[SubEntity],
        trigger: Option<&HabitTrigger>,
    ) -> Result<()>;

    /// Habit, substeps, and trigger read together. `NotFound` if absent.
    fn load_habit_snapshot(&self, habit_id: &str) -> Result<HabitSnapshot>;

    /// Every habit of `user_id`; inactive and archived ones only on request.
    fn list_habits(&self, user_id: &str, include_inactive: bool) -> Result<Vec<HabitSnapshot>>;

    /// Active, non-archived habits of `user_id`.
    fn list_schedulable_habits(&self, user_id: &str) -> Result<Vec<HabitSnapshot>> {
        self.list_habits(user_id, false)
    }

    fn set_habit_active(&self, habit_id: &str, active: bool) -> Result<()>;

    fn archive_habit(&self, habit_id: &str) -> Result<()>;

    /// Swap a habit's substeps and trigger atomically.
    fn replace_substeps(
        &self,
        habit_id: &str,
        substeps: &[SubEntity],
        trigger: Option<&HabitTrigger>,
    ) -> Result<()>;

    /// Whether `(habit_id, cycle_key)` already has an occurrence.
    fn has_occurrence(&self, habit_id: &str, cycle_key: &str) -> Result<bool>;

    /// Write one occurrence and its task instances, then publish them, all in
    /// a single transaction. A uniqueness conflict on `(habit_id, cycle_key)`
    /// is reported as [`CommitOutcome::AlreadyGenerated`], not as an error.
    fn commit_occurrence(
        &self,
        occurrence: &Occurrence,
        instances: &[GeneratedTaskInstance],
        publish: PublishFn<'_>,
    ) -> Result<CommitOutcome>;

    /// Occurrences of one habit, oldest target date first.
    fn list_occurrences(&self, habit_id: &str) -> Result<Vec<Occurrence>>;

    /// Move an occurrence through its lifecycle. Illegal transitions are a
    /// `Validation` error.
    fn set_occurrence_status(&self, occurrence_id: &str, status: OccurrenceStatus) -> Result<()>;

    /// Task instances of `user_id` due on `due_date`, earliest first.
    fn list_task_instances(
        &self,
        user_id: &str,
        due_date: NaiveDate,
    ) -> Result<Vec<GeneratedTaskInstance>>;

    /// Audit trail of one habit, oldest first.
    fn habit_events(&self, habit_id: &str) -> Result<Vec<HabitEvent>>;
}
