//! Habit data model: habits, substeps, triggers, occurrences, and the task
//! instances the scheduler emits.
//!
//! Everything here is storage-agnostic; `crate::store` maps these types to
//! SQLite rows.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domains::SubstepPlan;

/// Opaque habit identifier.
pub type HabitId = String;

/// Fresh random identifier for any stored row.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// Weekday
// ---------------------------------------------------------------------------

/// Day of the week, indexed from Sunday (`0`) to Saturday (`6`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    /// All weekdays in index order.
    pub const ALL: [Weekday; 7] = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    /// Index in `0..7`, Sunday first.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Weekday for an index; wraps modulo 7.
    pub fn from_index(index: i64) -> Self {
        Self::ALL[index.rem_euclid(7) as usize]
    }

    /// Weekday `days` after this one (negative goes backwards).
    pub fn shifted(self, days: i64) -> Self {
        Self::from_index(i64::from(self.index()) + days)
    }

    /// Lowercase English name, e.g. `"wednesday"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sunday => "sunday",
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
        }
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sun" | "sunday" => Ok(Self::Sunday),
            "mon" | "monday" => Ok(Self::Monday),
            "tue" | "tues" | "tuesday" => Ok(Self::Tuesday),
            "wed" | "wednesday" => Ok(Self::Wednesday),
            "thu" | "thurs" | "thursday" => Ok(Self::Thursday),
            "fri" | "friday" => Ok(Self::Friday),
            "sat" | "saturday" => Ok(Self::Saturday),
            other => Err(format!("unknown weekday: {other}")),
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        Self::from_index(i64::from(day.num_days_from_sunday()))
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceType {
    Daily,
    Weekly,
}

/// Lifecycle of one occurrence. Downstream task completion drives the
/// transitions; the generator only ever writes `Planned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceStatus {
    Planned,
    Active,
    Completed,
    Cancelled,
}

impl OccurrenceStatus {
    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: OccurrenceStatus) -> bool {
        use OccurrenceStatus::*;
        matches!(
            (self, next),
            (Planned, Active)
                | (Planned, Completed)
                | (Planned, Cancelled)
                | (Active, Completed)
                | (Active, Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Kind of a recorded habit mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitEventKind {
    Created,
    Activated,
    Deactivated,
    Archived,
    SubstepsReplaced,
}

// ---------------------------------------------------------------------------
// Core structs
// ---------------------------------------------------------------------------

/// A recurring commitment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub user_id: String,
    /// `None` for a plain text habit with no linked entity.
    pub domain: Option<String>,
    pub entity_id: Option<String>,
    pub entity_name: String,
    pub recurrence: RecurrenceType,
    /// Weekday of the main event; always set for weekly habits.
    pub target_weekday: Option<Weekday>,
    #[serde(default, with = "hhmm::option")]
    pub target_time: Option<NaiveTime>,
    pub start_date: NaiveDate,
    /// IANA zone name.
    pub timezone: String,
    pub is_active: bool,
    #[serde(default)]
    pub archived: bool,
}

impl Habit {
    /// Active, not archived, and started on or before `date`.
    pub fn is_schedulable_on(&self, date: NaiveDate) -> bool {
        self.is_active && !self.archived && date >= self.start_date
    }
}

/// One scheduled component of a multi-step habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubEntity {
    pub id: String,
    pub habit_id: HabitId,
    /// External reference in the owning domain's store.
    pub sub_entity_id: Option<String>,
    pub sub_entity_name: String,
    pub scheduled_weekday: Weekday,
    #[serde(default, with = "hhmm::option")]
    pub scheduled_time: Option<NaiveTime>,
    pub is_main_event: bool,
    /// Caller-chosen title; beats the domain's title resolver.
    #[serde(default)]
    pub title_override: Option<String>,
}

/// Which weekday kicks off generation for a whole habit instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitTrigger {
    pub habit_id: HabitId,
    pub trigger_sub_entity_id: Option<String>,
    pub trigger_weekday: Weekday,
}

/// A habit together with its substeps and trigger, read in one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitSnapshot {
    pub habit: Habit,
    pub substeps: Vec<SubEntity>,
    pub trigger: Option<HabitTrigger>,
}

/// One concrete firing of a habit for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    pub id: String,
    pub user_id: String,
    pub domain: Option<String>,
    pub entity_id: Option<String>,
    /// Always `None` at the top level: the row stands for the whole instance.
    pub sub_entity_id: Option<String>,
    pub habit_id: HabitId,
    pub status: OccurrenceStatus,
    pub target_date: NaiveDate,
    /// ISO week (`2026-W42`) for weekly habits, the date for daily ones.
    pub cycle_key: String,
    pub created_at: DateTime<Utc>,
}

/// One emitted task tied to the main event or one substep of an occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedTaskInstance {
    pub id: String,
    pub user_id: String,
    pub habit_id: HabitId,
    /// Shared by every instance of one occurrence (the occurrence id).
    pub instance_id: String,
    pub title: String,
    pub due_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub preferred_time: NaiveTime,
    pub scheduled_for: DateTime<Utc>,
    pub timezone: String,
    pub domain: Option<String>,
    pub entity_id: Option<String>,
    /// `None` for the main-event task.
    pub sub_entity_id: Option<String>,
}

impl GeneratedTaskInstance {
    pub fn is_main_event(&self) -> bool {
        self.sub_entity_id.is_none()
    }
}

/// Audit row for a habit mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitEvent {
    pub id: String,
    pub habit_id: HabitId,
    pub kind: HabitEventKind,
    pub note: String,
    pub at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Creation requests
// ---------------------------------------------------------------------------

/// A substep supplied directly by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSubEntity {
    #[serde(default)]
    pub sub_entity_id: Option<String>,
    pub sub_entity_name: String,
    pub scheduled_weekday: Weekday,
    #[serde(default, with = "hhmm::option")]
    pub scheduled_time: Option<NaiveTime>,
    #[serde(default)]
    pub is_main_event: bool,
}

/// Where a new habit's substeps come from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SubstepSpec {
    /// No substeps: the habit behaves as a single main event.
    #[default]
    None,
    /// Caller-provided substeps.
    Manual { substeps: Vec<NewSubEntity> },
    /// Substeps resolved from the habit's domain adapter.
    Plan { plan: SubstepPlan },
}

/// Habit creation request, validated by `Planner::create_habit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHabit {
    pub user_id: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub entity_name: String,
    pub recurrence: RecurrenceType,
    #[serde(default)]
    pub target_weekday: Option<Weekday>,
    #[serde(default, with = "hhmm::option")]
    pub target_time: Option<NaiveTime>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub substeps: SubstepSpec,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Serde helpers
// ---------------------------------------------------------------------------

/// `HH:MM` (24-hour) serde representation for `NaiveTime`.
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        crate::timezone::parse_local_time(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
            match time {
                Some(t) => s.serialize_some(&t.format("%H:%M").to_string()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
            let raw: Option<String> = Option::deserialize(d)?;
            raw.map(|r| crate::timezone::parse_local_time(&r).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
