//! Recurrence evaluation: which habits are due on a date, and which weekday
//! kicks off each weekly cycle.
//!
//! Weeks wrap circularly. The backward offset of a substep is
//! `(target - substep) mod 7`, so a Sunday substep before a Monday main event
//! is 1 day back, never -6.

use chrono::NaiveDate;

use super::types::{Habit, HabitSnapshot, HabitTrigger, RecurrenceType, SubEntity, Weekday};
use crate::error::{PlannerError, Result};
use crate::timezone;

/// Days from `substep` forward to `target`, in `0..7`.
pub fn backward_offset(target: Weekday, substep: Weekday) -> u8 {
    (i64::from(target.index()) - i64::from(substep.index())).rem_euclid(7) as u8
}

/// Days from `from` forward to `to`, in `0..7`.
pub fn forward_offset(from: Weekday, to: Weekday) -> u8 {
    backward_offset(to, from)
}

/// Weekday of the substep furthest back from `target_weekday`.
///
/// Ties keep the first substep in input order. No substeps means the main
/// event is its own trigger.
pub fn trigger_weekday_for(target_weekday: Weekday, substeps: &[SubEntity]) -> Weekday {
    earliest_substep(target_weekday, substeps)
        .map(|s| s.scheduled_weekday)
        .unwrap_or(target_weekday)
}

fn earliest_substep(target_weekday: Weekday, substeps: &[SubEntity]) -> Option<&SubEntity> {
    let mut best: Option<(&SubEntity, u8)> = None;
    for substep in substeps {
        let offset = backward_offset(target_weekday, substep.scheduled_weekday);
        match best {
            Some((_, best_offset)) if offset <= best_offset => {}
            _ => best = Some((substep, offset)),
        }
    }
    best.map(|(s, _)| s)
}

/// Trigger row for a weekly habit; `None` for daily habits.
pub fn compute_trigger(habit: &Habit, substeps: &[SubEntity]) -> Result<Option<HabitTrigger>> {
    if habit.recurrence == RecurrenceType::Daily {
        return Ok(None);
    }
    let target = habit.target_weekday.ok_or_else(|| {
        PlannerError::Validation(format!("weekly habit {} has no target weekday", habit.id))
    })?;
    let earliest = earliest_substep(target, substeps);
    Ok(Some(HabitTrigger {
        habit_id: habit.id.clone(),
        trigger_sub_entity_id: earliest.map(|s| s.id.clone()),
        trigger_weekday: earliest.map(|s| s.scheduled_weekday).unwrap_or(target),
    }))
}

/// Weekday on which a weekly snapshot fires: the stored trigger, else the
/// main event's weekday.
pub fn effective_trigger_weekday(snapshot: &HabitSnapshot) -> Option<Weekday> {
    snapshot
        .trigger
        .as_ref()
        .map(|t| t.trigger_weekday)
        .or(snapshot.habit.target_weekday)
}

/// Whether the habit fires on `target_date`.
///
/// Daily habits fire every schedulable day. Weekly habits fire when the
/// date's weekday in the habit's zone equals the trigger weekday.
pub fn is_due_on(snapshot: &HabitSnapshot, target_date: NaiveDate) -> Result<bool> {
    let habit = &snapshot.habit;
    if !habit.is_schedulable_on(target_date) {
        return Ok(false);
    }
    match habit.recurrence {
        RecurrenceType::Daily => Ok(true),
        RecurrenceType::Weekly => {
            let Some(trigger) = effective_trigger_weekday(snapshot) else {
                return Err(PlannerError::Validation(format!(
                    "weekly habit {} has no target weekday",
                    habit.id
                )));
            };
            Ok(timezone::weekday_of(target_date, &habit.timezone)? == trigger)
        }
    }
}

/// Triggers whose weekday matches `target_date` in `timezone`.
pub fn select_triggers_for_date<'a>(
    triggers: &'a [HabitTrigger],
    target_date: NaiveDate,
    timezone: &str,
) -> Result<Vec<&'a HabitTrigger>> {
    let weekday = timezone::weekday_of(target_date, timezone)?;
    Ok(triggers
        .iter()
        .filter(|t| t.trigger_weekday == weekday)
        .collect())
}

/// Outcome of filtering a user's habits for one date.
#[derive(Debug, Default)]
pub struct DueSelection<'a> {
    /// Habits that fire on the date.
    pub due: Vec<&'a HabitSnapshot>,
    /// Habits whose due-ness could not be evaluated (bad zone, missing weekday).
    pub invalid: Vec<(&'a HabitSnapshot, PlannerError)>,
}

/// Split `snapshots` into those due on `target_date` and those that failed
/// evaluation. Each habit is evaluated in its own zone.
pub fn select_due(snapshots: &[HabitSnapshot], target_date: NaiveDate) -> DueSelection<'_> {
    let mut selection = DueSelection::default();
    for snapshot in snapshots {
        match is_due_on(snapshot, target_date) {
            Ok(true) => selection.due.push(snapshot),
            Ok(false) => {}
            Err(e) => selection.invalid.push((snapshot, e)),
        }
    }
    selection
}
