//! The planner facade: habit creation and lifecycle, lazy generation, and
//! todo listing, wired over one store and one set of domain registries.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::config::{GenerationConfig, PlannerConfig};
use crate::domains::{DomainAdapterRegistry, SubstepKey, TitleResolverRegistry, VersionNumber};
use crate::error::{PlannerError, Result};
use crate::generator::{GenerationResult, OccurrenceGenerator};
use crate::habits::{
    GeneratedTaskInstance, Habit, HabitEvent, HabitId, HabitSnapshot, NewHabit, NewSubEntity,
    OccurrenceStatus, RecurrenceType, SubEntity, SubstepSpec, compute_trigger, new_id,
};
use crate::publish::TaskPublisher;
use crate::store::{PlannerStore, SqlitePlannerStore};
use crate::timezone;
use crate::trigger::LazyTrigger;

/// Offsets a substep may sit before its main event, in days.
const SUBSTEP_OFFSET_RANGE: std::ops::RangeInclusive<i32> = -6..=0;

/// Habit planner over a store, domain registries, and a publisher.
#[derive(Clone)]
pub struct Planner {
    store: Arc<dyn PlannerStore>,
    adapters: Arc<DomainAdapterRegistry>,
    titles: Arc<TitleResolverRegistry>,
    trigger: LazyTrigger,
    default_timezone: String,
}

impl std::fmt::Debug for Planner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Planner")
            .field("adapters", &self.adapters)
            .field("titles", &self.titles)
            .field("trigger", &self.trigger)
            .field("default_timezone", &self.default_timezone)
            .finish()
    }
}

impl Planner {
    pub fn new(
        store: Arc<dyn PlannerStore>,
        adapters: Arc<DomainAdapterRegistry>,
        titles: Arc<TitleResolverRegistry>,
        publisher: Arc<dyn TaskPublisher>,
        config: &GenerationConfig,
    ) -> Self {
        let generator = OccurrenceGenerator::new(
            Arc::clone(&store),
            Arc::clone(&adapters),
            Arc::clone(&titles),
            publisher,
        )
        .with_config(config);
        Self {
            store,
            adapters,
            titles,
            trigger: LazyTrigger::new(Arc::new(generator)),
            default_timezone: config.default_timezone.clone(),
        }
    }

    /// Open the SQLite store named by `config` and build a planner over it.
    pub fn open(
        config: &PlannerConfig,
        adapters: Arc<DomainAdapterRegistry>,
        titles: Arc<TitleResolverRegistry>,
        publisher: Arc<dyn TaskPublisher>,
    ) -> Result<Self> {
        let store = SqlitePlannerStore::new(&config.store.root_dir, &config.store.db_filename)?;
        Ok(Self::new(
            Arc::new(store),
            adapters,
            titles,
            publisher,
            &config.generation,
        ))
    }

    pub fn store(&self) -> &Arc<dyn PlannerStore> {
        &self.store
    }

    pub fn trigger(&self) -> &LazyTrigger {
        &self.trigger
    }

    fn adapters(&self) -> &DomainAdapterRegistry {
        &self.adapters
    }

    fn titles(&self) -> &TitleResolverRegistry {
        &self.titles
    }

    // -----------------------------------------------------------------------
    // Habits
    // -----------------------------------------------------------------------

    /// Validate and persist a new habit together with its substeps and
    /// trigger.
    ///
    /// # Errors
    ///
    /// `Validation` for model violations, `InvalidTimezone`, `UnknownDomain`,
    /// `EntityNotFound` for an unresolvable linked entity, and storage errors.
    pub fn create_habit(&self, request: NewHabit) -> Result<HabitId> {
        let user_id = request.user_id.trim();
        if user_id.is_empty() {
            return Err(PlannerError::Validation("user_id is required".to_owned()));
        }

        let timezone = request
            .timezone
            .clone()
            .unwrap_or_else(|| self.default_timezone.clone());
        timezone::parse_timezone(&timezone)?;

        if request.recurrence == RecurrenceType::Weekly && request.target_weekday.is_none() {
            return Err(PlannerError::Validation(
                "weekly habits need a target_weekday".to_owned(),
            ));
        }

        let version = match request.domain.as_deref() {
            Some(domain) => {
                let entity_id = request.entity_id.as_deref().ok_or_else(|| {
                    PlannerError::Validation(format!("domain {domain} needs an entity_id"))
                })?;
                Some(self.freeze_entity(domain, entity_id)?)
            }
            None => None,
        };

        let entity_name = match (request.domain.as_deref(), request.entity_id.as_deref()) {
            _ if !request.entity_name.trim().is_empty() => request.entity_name.trim().to_owned(),
            (Some(domain), Some(entity_id)) => self.titles().get_main_event_title(domain, entity_id),
            _ => {
                return Err(PlannerError::Validation(
                    "entity_name is required for habits without a domain".to_owned(),
                ));
            }
        };

        let habit = Habit {
            id: new_id(),
            user_id: user_id.to_owned(),
            domain: request.domain,
            entity_id: request.entity_id,
            entity_name,
            recurrence: request.recurrence,
            target_weekday: request.target_weekday,
            target_time: request.target_time,
            start_date: request.start_date,
            timezone,
            is_active: request.is_active,
            archived: false,
        };

        let substeps = self.build_substeps(&habit, request.substeps, version)?;
        let trigger = compute_trigger(&habit, &substeps)?;
        self.store()
            .insert_habit(&habit, &substeps, trigger.as_ref())?;

        info!(
            habit_id = %habit.id,
            user_id = %habit.user_id,
            substeps = substeps.len(),
            trigger = ?trigger.as_ref().map(|t| t.trigger_weekday),
            "habit created"
        );
        Ok(habit.id)
    }

    /// Replace a weekly habit's substeps and recompute its trigger.
    pub fn replace_substeps(&self, habit_id: &str, substeps: SubstepSpec) -> Result<()> {
        let snapshot = self.store().load_habit_snapshot(habit_id)?;
        let habit = snapshot.habit;
        if habit.recurrence == RecurrenceType::Daily {
            return Err(PlannerError::Validation(format!(
                "daily habit {habit_id} has no substeps"
            )));
        }

        let version = match (habit.domain.as_deref(), habit.entity_id.as_deref()) {
            (Some(domain), Some(entity_id)) => Some(self.freeze_entity(domain, entity_id)?),
            _ => None,
        };
        let substeps = self.build_substeps(&habit, substeps, version)?;
        let trigger = compute_trigger(&habit, &substeps)?;
        self.store()
            .replace_substeps(habit_id, &substeps, trigger.as_ref())?;
        debug!(habit_id, substeps = substeps.len(), "substeps replaced");
        Ok(())
    }

    pub fn habit(&self, habit_id: &str) -> Result<HabitSnapshot> {
        self.store().load_habit_snapshot(habit_id)
    }

    pub fn list_habits(&self, user_id: &str, include_inactive: bool) -> Result<Vec<HabitSnapshot>> {
        self.store().list_habits(user_id, include_inactive)
    }

    pub fn set_habit_active(&self, habit_id: &str, active: bool) -> Result<()> {
        self.store().set_habit_active(habit_id, active)
    }

    /// Soft-delete: archived habits are never scheduled again.
    pub fn archive_habit(&self, habit_id: &str) -> Result<()> {
        self.store().archive_habit(habit_id)
    }

    pub fn habit_events(&self, habit_id: &str) -> Result<Vec<HabitEvent>> {
        self.store().habit_events(habit_id)
    }

    // -----------------------------------------------------------------------
    // Generation and todos
    // -----------------------------------------------------------------------

    /// Run lazy generation for `user_id` on `local_date`. Never fails.
    pub fn ensure_generated(&self, user_id: &str, local_date: NaiveDate) -> GenerationResult {
        self.trigger.ensure_generated(user_id, local_date)
    }

    /// Generate, then list the user's todos due on `local_date`.
    ///
    /// Generation problems are logged, never returned; only the final read
    /// can fail.
    pub fn list_todos(
        &self,
        user_id: &str,
        local_date: NaiveDate,
    ) -> Result<Vec<GeneratedTaskInstance>> {
        let result = self.ensure_generated(user_id, local_date);
        if !result.is_clean() {
            debug!(
                user_id,
                %local_date,
                failed = result.failed_habit_ids.len(),
                "listing todos after partial generation"
            );
        }
        self.store().list_task_instances(user_id, local_date)
    }

    /// Move an occurrence through its lifecycle.
    pub fn set_occurrence_status(&self, occurrence_id: &str, status: OccurrenceStatus) -> Result<()> {
        self.store().set_occurrence_status(occurrence_id, status)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Check the linked entity exists and capture its current version.
    fn freeze_entity(&self, domain: &str, entity_id: &str) -> Result<VersionNumber> {
        let adapter = self.adapters().get(domain)?;
        let version = adapter.latest_version(entity_id)?;
        let snapshot = adapter.snapshot(entity_id, version)?;
        debug!(domain, entity_id, version = snapshot.version, "entity snapshot taken");
        Ok(snapshot.version)
    }

    fn build_substeps(
        &self,
        habit: &Habit,
        spec: SubstepSpec,
        version: Option<VersionNumber>,
    ) -> Result<Vec<SubEntity>> {
        if habit.recurrence == RecurrenceType::Daily {
            if spec != SubstepSpec::None {
                warn!(habit_id = %habit.id, "daily habits ignore substeps");
            }
            return Ok(Vec::new());
        }

        let substeps = match spec {
            SubstepSpec::None => Vec::new(),
            SubstepSpec::Manual { substeps } => substeps
                .into_iter()
                .map(|s| manual_substep(&habit.id, s))
                .collect(),
            SubstepSpec::Plan { plan } => {
                let (Some(domain), Some(entity_id), Some(version)) =
                    (habit.domain.as_deref(), habit.entity_id.as_deref(), version)
                else {
                    return Err(PlannerError::Validation(
                        "substep plans need a linked domain entity".to_owned(),
                    ));
                };
                let keys = self
                    .adapters()
                    .get(domain)?
                    .resolve_plan(&plan, entity_id, version)?;
                keys.into_iter()
                    .map(|key| self.planned_substep(habit, key))
                    .collect::<Result<Vec<_>>>()?
            }
        };

        let anchors = substeps.iter().filter(|s| s.is_main_event).count();
        if anchors > 1 {
            return Err(PlannerError::Validation(format!(
                "{anchors} substeps are flagged as the main event; at most one is allowed"
            )));
        }
        Ok(substeps)
    }

    fn planned_substep(&self, habit: &Habit, key: SubstepKey) -> Result<SubEntity> {
        if !SUBSTEP_OFFSET_RANGE.contains(&key.offset_days) {
            return Err(PlannerError::Validation(format!(
                "substep {} has offset {} days; expected -6..=0",
                key.sub_entity_id, key.offset_days
            )));
        }
        let target = habit.target_weekday.ok_or_else(|| {
            PlannerError::Validation("weekly habits need a target_weekday".to_owned())
        })?;
        let reference = key.reference();
        let name = match key.title_override.as_deref() {
            Some(title) => title.to_owned(),
            None => self.titles().get_sub_entity_title(&key.domain, &reference),
        };
        Ok(SubEntity {
            id: new_id(),
            habit_id: habit.id.clone(),
            sub_entity_id: Some(reference),
            sub_entity_name: name,
            scheduled_weekday: target.shifted(i64::from(key.offset_days)),
            scheduled_time: key.time.or(habit.target_time),
            is_main_event: false,
            title_override: key.title_override,
        })
    }
}

fn manual_substep(habit_id: &str, substep: NewSubEntity) -> SubEntity {
    SubEntity {
        id: new_id(),
        habit_id: habit_id.to_owned(),
        sub_entity_id: substep.sub_entity_id,
        sub_entity_name: substep.sub_entity_name,
        scheduled_weekday: substep.scheduled_weekday,
        scheduled_time: substep.scheduled_time,
        is_main_event: substep.is_main_event,
        title_override: None,
    }
}
