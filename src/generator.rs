//! Occurrence generation: turns due habits into occurrences and task
//! instances for one `(user, date)` pair.
//!
//! Each habit is generated independently. A habit's occurrence row, its task
//! instances, and the publish of its batch share one store transaction, so a
//! habit either appears completely or not at all. A failure on one habit is
//! recorded in the [`GenerationResult`] and never stops its siblings.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Days, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, error, info, warn};

use crate::config::GenerationConfig;
use crate::domains::titles::{PLACEHOLDER_MAIN_TITLE, PLACEHOLDER_SUB_TITLE};
use crate::domains::{DomainAdapterRegistry, TitleResolverRegistry};
use crate::error::{PlannerError, Result};
use crate::habits::{
    GeneratedTaskInstance, Habit, HabitId, HabitSnapshot, Occurrence, OccurrenceStatus,
    RecurrenceType, SubEntity, Weekday, effective_trigger_weekday, forward_offset, new_id,
    select_due,
};
use crate::publish::TaskPublisher;
use crate::store::{CommitOutcome, PlannerStore};
use crate::timezone;

/// One habit that could not be generated.
#[derive(Debug)]
pub struct HabitFailure {
    pub habit_id: HabitId,
    pub error: PlannerError,
}

/// Aggregate outcome of one generation pass.
#[derive(Debug)]
pub struct GenerationResult {
    pub target_date: NaiveDate,
    /// Habits whose occurrence was written by this pass.
    pub success_count: usize,
    /// Habits whose cycle already had an occurrence. Counted as success.
    pub already_generated_count: usize,
    pub failed_habit_ids: Vec<HabitId>,
    pub errors: Vec<HabitFailure>,
    /// Set when the habit list itself could not be read; nothing was attempted.
    pub aborted: Option<PlannerError>,
}

impl GenerationResult {
    pub fn new(target_date: NaiveDate) -> Self {
        Self {
            target_date,
            success_count: 0,
            already_generated_count: 0,
            failed_habit_ids: Vec::new(),
            errors: Vec::new(),
            aborted: None,
        }
    }

    pub(crate) fn aborted(target_date: NaiveDate, error: PlannerError) -> Self {
        Self {
            aborted: Some(error),
            ..Self::new(target_date)
        }
    }

    /// No habit failed and the pass was not aborted.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.aborted.is_none()
    }

    fn record_failure(&mut self, habit_id: &str, error: PlannerError) {
        self.failed_habit_ids.push(habit_id.to_owned());
        self.errors.push(HabitFailure {
            habit_id: habit_id.to_owned(),
            error,
        });
    }
}

/// Cycle key: ISO week for weekly habits, the date itself for daily ones.
pub fn cycle_key_for(recurrence: RecurrenceType, target_date: NaiveDate) -> String {
    match recurrence {
        RecurrenceType::Weekly => timezone::iso_week_key(target_date),
        RecurrenceType::Daily => target_date.format("%Y-%m-%d").to_string(),
    }
}

/// Local slot of one task instance before conversion to UTC.
struct Slot {
    due_date: NaiveDate,
    time: NaiveTime,
    title: String,
    sub_entity_id: Option<String>,
}

/// Generates occurrences for due habits.
pub struct OccurrenceGenerator {
    store: Arc<dyn PlannerStore>,
    adapters: Arc<DomainAdapterRegistry>,
    titles: Arc<TitleResolverRegistry>,
    publisher: Arc<dyn TaskPublisher>,
    topic: String,
    timeout: Duration,
}

impl OccurrenceGenerator {
    pub fn new(
        store: Arc<dyn PlannerStore>,
        adapters: Arc<DomainAdapterRegistry>,
        titles: Arc<TitleResolverRegistry>,
        publisher: Arc<dyn TaskPublisher>,
    ) -> Self {
        let defaults = GenerationConfig::default();
        Self {
            store,
            adapters,
            titles,
            publisher,
            topic: defaults.topic.clone(),
            timeout: defaults.timeout(),
        }
    }

    /// Apply topic and timeout from configuration.
    pub fn with_config(mut self, config: &GenerationConfig) -> Self {
        self.topic = config.topic.clone();
        self.timeout = config.timeout();
        self
    }

    /// Generate every habit of `user_id` that is due on `target_date`.
    ///
    /// # Errors
    ///
    /// Only when the user's habits cannot be loaded. Per-habit failures are
    /// collected in the result.
    pub fn generate_for(&self, user_id: &str, target_date: NaiveDate) -> Result<GenerationResult> {
        let deadline = Instant::now() + self.timeout;
        let snapshots = self.store.list_schedulable_habits(user_id)?;
        let selection = select_due(&snapshots, target_date);
        let mut result = GenerationResult::new(target_date);

        for (snapshot, err) in selection.invalid {
            error!(habit_id = %snapshot.habit.id, %target_date, "habit not evaluable: {err}");
            result.record_failure(&snapshot.habit.id, err);
        }

        for snapshot in selection.due {
            let habit_id = &snapshot.habit.id;
            if Instant::now() >= deadline {
                warn!(habit_id = %habit_id, %target_date, "generation deadline passed; skipping habit");
                result.record_failure(
                    habit_id,
                    PlannerError::Timeout {
                        habit_id: habit_id.clone(),
                    },
                );
                continue;
            }
            match self.generate_habit(snapshot, target_date) {
                Ok(CommitOutcome::Inserted) => result.success_count += 1,
                Ok(CommitOutcome::AlreadyGenerated) => result.already_generated_count += 1,
                Err(e) => {
                    error!(habit_id = %habit_id, %target_date, "habit generation failed: {e}");
                    result.record_failure(habit_id, e);
                }
            }
        }

        info!(
            user_id,
            %target_date,
            habits = snapshots.len(),
            success = result.success_count,
            already_generated = result.already_generated_count,
            failed = result.failed_habit_ids.len(),
            "generation pass finished"
        );
        Ok(result)
    }

    /// Generate one due habit's occurrence for the cycle of `target_date`.
    pub fn generate_habit(
        &self,
        snapshot: &HabitSnapshot,
        target_date: NaiveDate,
    ) -> Result<CommitOutcome> {
        let habit = &snapshot.habit;
        let tz = timezone::parse_timezone(&habit.timezone)?;
        let cycle_key = cycle_key_for(habit.recurrence, target_date);

        if self.store.has_occurrence(&habit.id, &cycle_key)? {
            debug!(habit_id = %habit.id, %cycle_key, "cycle already generated");
            return Ok(CommitOutcome::AlreadyGenerated);
        }

        if let Some(domain) = habit.domain.as_deref() {
            let entity_id = habit.entity_id.as_deref().ok_or_else(|| {
                PlannerError::Validation(format!("habit {} has a domain but no entity", habit.id))
            })?;
            let version = self.adapters.get(domain)?.latest_version(entity_id)?;
            debug!(habit_id = %habit.id, domain, entity_id, version, "domain entity resolved");
        }

        let occurrence = Occurrence {
            id: new_id(),
            user_id: habit.user_id.clone(),
            domain: habit.domain.clone(),
            entity_id: habit.entity_id.clone(),
            sub_entity_id: None,
            habit_id: habit.id.clone(),
            status: OccurrenceStatus::Planned,
            target_date,
            cycle_key,
            created_at: Utc::now(),
        };

        let instances: Vec<GeneratedTaskInstance> = self
            .plan_slots(snapshot, target_date)?
            .into_iter()
            .map(|slot| build_instance(habit, &occurrence, tz, slot))
            .collect();

        let publish = |batch: &[GeneratedTaskInstance]| -> Result<()> {
            self.publisher
                .publish_batch(&self.topic, batch)
                .map_err(PlannerError::from)
        };
        let outcome = self
            .store
            .commit_occurrence(&occurrence, &instances, &publish)?;

        match outcome {
            CommitOutcome::Inserted => info!(
                habit_id = %habit.id,
                occurrence_id = %occurrence.id,
                cycle_key = %occurrence.cycle_key,
                instances = instances.len(),
                "occurrence generated"
            ),
            CommitOutcome::AlreadyGenerated => debug!(
                habit_id = %habit.id,
                cycle_key = %occurrence.cycle_key,
                "lost race for cycle; already generated"
            ),
        }
        Ok(outcome)
    }

    /// Local slots for the main event and every substep.
    fn plan_slots(&self, snapshot: &HabitSnapshot, target_date: NaiveDate) -> Result<Vec<Slot>> {
        let habit = &snapshot.habit;
        let main_time = habit
            .target_time
            .unwrap_or_else(timezone::default_local_time);

        if habit.recurrence == RecurrenceType::Daily {
            return Ok(vec![Slot {
                due_date: target_date,
                time: main_time,
                title: self.main_title(habit),
                sub_entity_id: None,
            }]);
        }

        let (Some(target_weekday), Some(trigger)) =
            (habit.target_weekday, effective_trigger_weekday(snapshot))
        else {
            return Err(PlannerError::Validation(format!(
                "weekly habit {} has no target weekday",
                habit.id
            )));
        };

        let mut slots = Vec::with_capacity(snapshot.substeps.len() + 1);
        // The flagged anchor substep is the main event itself.
        for substep in snapshot.substeps.iter().filter(|s| !s.is_main_event) {
            slots.push(Slot {
                due_date: date_after(target_date, trigger, substep.scheduled_weekday)?,
                time: substep
                    .scheduled_time
                    .or(habit.target_time)
                    .unwrap_or_else(timezone::default_local_time),
                title: self.substep_title(habit, substep),
                sub_entity_id: Some(
                    substep
                        .sub_entity_id
                        .clone()
                        .unwrap_or_else(|| substep.id.clone()),
                ),
            });
        }
        slots.push(Slot {
            due_date: date_after(target_date, trigger, target_weekday)?,
            time: main_time,
            title: self.main_title(habit),
            sub_entity_id: None,
        });
        Ok(slots)
    }

    /// Domain resolver, then the stored entity name, then a placeholder.
    fn main_title(&self, habit: &Habit) -> String {
        if let (Some(domain), Some(entity_id)) = (habit.domain.as_deref(), habit.entity_id.as_deref())
            && let Some(title) = self.titles.try_main_event_title(domain, entity_id)
        {
            return title;
        }
        if !habit.entity_name.trim().is_empty() {
            return habit.entity_name.clone();
        }
        match habit.domain.as_deref() {
            Some(domain) => self.titles.main_placeholder(domain),
            None => PLACEHOLDER_MAIN_TITLE.to_owned(),
        }
    }

    /// Override, then domain resolver, then the stored name, then a placeholder.
    fn substep_title(&self, habit: &Habit, substep: &SubEntity) -> String {
        if let Some(title) = substep.title_override.as_deref().filter(|t| !t.trim().is_empty()) {
            return title.to_owned();
        }
        if let (Some(domain), Some(reference)) =
            (habit.domain.as_deref(), substep.sub_entity_id.as_deref())
            && let Some(title) = self.titles.try_sub_entity_title(domain, reference)
        {
            return title;
        }
        if !substep.sub_entity_name.trim().is_empty() {
            return substep.sub_entity_name.clone();
        }
        match habit.domain.as_deref() {
            Some(domain) => self.titles.sub_placeholder(domain),
            None => PLACEHOLDER_SUB_TITLE.to_owned(),
        }
    }
}

impl std::fmt::Debug for OccurrenceGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OccurrenceGenerator")
            .field("adapters", &self.adapters)
            .field("titles", &self.titles)
            .field("topic", &self.topic)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Date of the next `weekday` on or after `trigger_date`, whose weekday is
/// `trigger`.
fn date_after(trigger_date: NaiveDate, trigger: Weekday, weekday: Weekday) -> Result<NaiveDate> {
    let offset = forward_offset(trigger, weekday);
    trigger_date
        .checked_add_days(Days::new(u64::from(offset)))
        .ok_or_else(|| PlannerError::Validation(format!("date overflow after {trigger_date}")))
}

fn build_instance(
    habit: &Habit,
    occurrence: &Occurrence,
    tz: Tz,
    slot: Slot,
) -> GeneratedTaskInstance {
    let scheduled_for = timezone::local_to_utc_in(slot.due_date, slot.time, tz);
    debug!(
        habit_id = %habit.id,
        due_date = %slot.due_date,
        time = %slot.time.format("%H:%M"),
        %scheduled_for,
        title = %slot.title,
        "task instance planned"
    );
    GeneratedTaskInstance {
        id: new_id(),
        user_id: habit.user_id.clone(),
        habit_id: habit.id.clone(),
        instance_id: occurrence.id.clone(),
        title: slot.title,
        due_date: slot.due_date,
        preferred_time: slot.time,
        scheduled_for,
        timezone: habit.timezone.clone(),
        domain: habit.domain.clone(),
        entity_id: habit.entity_id.clone(),
        sub_entity_id: slot.sub_entity_id,
    }
}
