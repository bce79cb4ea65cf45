//! File-backed store and configuration round-trips.

use std::sync::Arc;

use habit_planner::PlannerConfig;
use habit_planner::domains::InMemoryRecipeSource;
use habit_planner::habits::{HabitEventKind, Weekday};

use crate::helpers::{daily, date, harness_at, time, weekly};

#[test]
fn habits_and_occurrences_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let recipes = Arc::new(InMemoryRecipeSource::new());

    let habit_id = {
        let mut h = harness_at(dir.path(), recipes.clone());
        let id = h
            .planner
            .create_habit(weekly("u1", "Laundry", Weekday::Wednesday, time(20, 0), "UTC"))
            .unwrap();
        assert_eq!(h.planner.ensure_generated("u1", date("2026-10-14")).success_count, 1);
        assert_eq!(h.drain().len(), 1);
        id
    };
    assert!(dir.path().join("planner.db").is_file());

    let mut reopened = harness_at(dir.path(), recipes);
    let habits = reopened.planner.list_habits("u1", false).unwrap();
    assert_eq!(habits.len(), 1);
    assert_eq!(habits[0].habit.id, habit_id);
    assert_eq!(habits[0].habit.target_time, Some(time(20, 0)));

    let again = reopened.planner.ensure_generated("u1", date("2026-10-14"));
    assert_eq!((again.success_count, again.already_generated_count), (0, 1));
    assert!(reopened.drain().is_empty());

    let todos = reopened.planner.list_todos("u1", date("2026-10-14")).unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].title, "Laundry");
}

#[test]
fn lifecycle_changes_are_audited() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness_at(dir.path(), Arc::new(InMemoryRecipeSource::new()));
    let id = h.planner.create_habit(daily("u1", "Vitamins", None, "UTC")).unwrap();

    h.planner.set_habit_active(&id, false).unwrap();
    h.planner.set_habit_active(&id, true).unwrap();
    h.planner.archive_habit(&id).unwrap();
    h.planner.archive_habit(&id).unwrap();

    let kinds: Vec<_> = h
        .planner
        .habit_events(&id)
        .unwrap()
        .into_iter()
        .map(|e| e.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            HabitEventKind::Created,
            HabitEventKind::Deactivated,
            HabitEventKind::Activated,
            HabitEventKind::Archived,
        ]
    );
    assert!(h.planner.set_habit_active(&id, true).is_err());
    assert!(h.planner.list_todos("u1", date("2026-10-14")).unwrap().is_empty());
}

#[test]
fn config_file_round_trips_through_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = PlannerConfig::default();
    config.store.root_dir = dir.path().join("data");
    config.generation.timeout_ms = 2_500;
    config.generation.default_timezone = "Europe/Paris".to_owned();
    config.save_to_file(&path).unwrap();

    let loaded = PlannerConfig::from_file(&path).unwrap();
    assert_eq!(loaded.store.db_path(), dir.path().join("data").join("planner.db"));
    assert_eq!(loaded.generation.timeout().as_millis(), 2_500);
    assert_eq!(loaded.generation.default_timezone, "Europe/Paris");
    assert_eq!(loaded.generation.topic, "todos.generated");
}
