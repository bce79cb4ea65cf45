//! Habit data model and recurrence evaluation.
//!
//! Sub-modules:
//! - `types`: habits, substeps, triggers, occurrences, task instances.
//! - `recurrence`: due-date and trigger-weekday evaluation.

pub mod recurrence;
pub mod types;

pub use recurrence::{
    DueSelection, backward_offset, compute_trigger, effective_trigger_weekday, forward_offset,
    is_due_on, select_due, select_triggers_for_date, trigger_weekday_for,
};
pub use types::{
    GeneratedTaskInstance, Habit, HabitEvent, HabitEventKind, HabitId, HabitSnapshot,
    HabitTrigger, NewHabit, NewSubEntity, Occurrence, OccurrenceStatus, RecurrenceType,
    SubEntity, SubstepSpec, Weekday, new_id,
};
