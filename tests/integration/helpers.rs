//! Shared helpers for integration tests.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use habit_planner::config::{GenerationConfig, PlannerConfig, StoreConfig};
use habit_planner::domains::meal::Instruction;
use habit_planner::domains::{
    DomainAdapterRegistry, InMemoryRecipeSource, MealAdapter, MealTitleResolver,
    TitleResolverRegistry,
};
use habit_planner::habits::{NewHabit, RecurrenceType, SubstepSpec, Weekday};
use habit_planner::publish::PublishedBatch;
use habit_planner::{ChannelPublisher, Planner, SqlitePlannerStore};
use tokio::sync::mpsc;

/// A planner wired to the meal domain and a channel publisher.
pub(crate) struct Harness {
    pub planner: Planner,
    pub recipes: Arc<InMemoryRecipeSource>,
    pub published: mpsc::UnboundedReceiver<PublishedBatch>,
}

impl Harness {
    /// Every batch published so far.
    pub fn drain(&mut self) -> Vec<PublishedBatch> {
        let mut batches = Vec::new();
        while let Ok(batch) = self.published.try_recv() {
            batches.push(batch);
        }
        batches
    }
}

fn registries(recipes: &Arc<InMemoryRecipeSource>) -> (DomainAdapterRegistry, TitleResolverRegistry) {
    (
        DomainAdapterRegistry::new().with(Arc::new(MealAdapter::new(recipes.clone()))),
        TitleResolverRegistry::new().with(Arc::new(MealTitleResolver::new(recipes.clone()))),
    )
}

/// Harness over an in-memory store.
pub(crate) fn harness() -> Harness {
    let recipes = Arc::new(InMemoryRecipeSource::new());
    let (adapters, titles) = registries(&recipes);
    let (publisher, published) = ChannelPublisher::new();
    let planner = Planner::new(
        Arc::new(SqlitePlannerStore::open_in_memory().expect("open in-memory store")),
        Arc::new(adapters),
        Arc::new(titles),
        Arc::new(publisher),
        &GenerationConfig::default(),
    );
    Harness {
        planner,
        recipes,
        published,
    }
}

/// Harness over a file-backed store in `root`, opened through the config.
pub(crate) fn harness_at(root: &Path, recipes: Arc<InMemoryRecipeSource>) -> Harness {
    let config = PlannerConfig {
        store: StoreConfig {
            root_dir: root.to_path_buf(),
            ..StoreConfig::default()
        },
        ..PlannerConfig::default()
    };
    let (adapters, titles) = registries(&recipes);
    let (publisher, published) = ChannelPublisher::new();
    let planner = Planner::open(
        &config,
        Arc::new(adapters),
        Arc::new(titles),
        Arc::new(publisher),
    )
    .expect("open file-backed planner");
    Harness {
        planner,
        recipes,
        published,
    }
}

pub(crate) fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
}

pub(crate) fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
}

pub(crate) fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .expect("valid RFC 3339 instant")
        .with_timezone(&Utc)
}

pub(crate) fn instruction(id: &str, step: u32, text: &str) -> Instruction {
    Instruction {
        id: id.to_owned(),
        step,
        text: text.to_owned(),
    }
}

/// Plain weekly habit with no substeps.
pub(crate) fn weekly(user: &str, name: &str, weekday: Weekday, at: NaiveTime, zone: &str) -> NewHabit {
    NewHabit {
        user_id: user.to_owned(),
        domain: None,
        entity_id: None,
        entity_name: name.to_owned(),
        recurrence: RecurrenceType::Weekly,
        target_weekday: Some(weekday),
        target_time: Some(at),
        start_date: date("2026-01-01"),
        timezone: Some(zone.to_owned()),
        substeps: SubstepSpec::None,
        is_active: true,
    }
}

/// Plain daily habit.
pub(crate) fn daily(user: &str, name: &str, at: Option<NaiveTime>, zone: &str) -> NewHabit {
    NewHabit {
        recurrence: RecurrenceType::Daily,
        target_weekday: None,
        target_time: at,
        ..weekly(user, name, Weekday::Monday, time(9, 0), zone)
    }
}
