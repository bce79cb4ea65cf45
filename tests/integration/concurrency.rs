//! Concurrent lazy generation for the same user and date.

use std::sync::{Arc, Barrier};

use habit_planner::habits::{NewSubEntity, SubstepSpec, Weekday};

use crate::helpers::{daily, date, harness, harness_at, time, weekly};
use habit_planner::domains::InMemoryRecipeSource;

const CALLERS: usize = 8;

#[test]
fn concurrent_callers_generate_each_cycle_once() {
    let mut h = harness();
    let weekly_id = h
        .planner
        .create_habit(habit_planner::habits::NewHabit {
            substeps: SubstepSpec::Manual {
                substeps: vec![NewSubEntity {
                    sub_entity_id: None,
                    sub_entity_name: "Prep".to_owned(),
                    scheduled_weekday: Weekday::Wednesday,
                    scheduled_time: None,
                    is_main_event: false,
                }],
            },
            ..weekly("u1", "Cook", Weekday::Friday, time(18, 0), "UTC")
        })
        .unwrap();
    let daily_id = h.planner.create_habit(daily("u1", "Walk", None, "UTC")).unwrap();

    let barrier = Arc::new(Barrier::new(CALLERS));
    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                let planner = h.planner.clone();
                let barrier = Arc::clone(&barrier);
                scope.spawn(move || {
                    barrier.wait();
                    planner.ensure_generated("u1", date("2026-10-14"))
                })
            })
            .collect();
        handles.into_iter().map(|t| t.join().unwrap()).collect()
    });

    assert!(results.iter().all(|r| r.is_clean()));
    let inserted: usize = results.iter().map(|r| r.success_count).sum();
    let skipped: usize = results.iter().map(|r| r.already_generated_count).sum();
    assert_eq!(inserted, 2);
    assert_eq!(skipped, 2 * CALLERS - 2);

    for habit_id in [&weekly_id, &daily_id] {
        assert_eq!(h.planner.store().list_occurrences(habit_id).unwrap().len(), 1);
    }
    // One batch per habit, published exactly once.
    assert_eq!(h.drain().len(), 2);
}

#[test]
fn two_planners_on_one_database_do_not_duplicate() {
    let dir = tempfile::tempdir().unwrap();
    let recipes = Arc::new(InMemoryRecipeSource::new());
    let mut first = harness_at(dir.path(), recipes.clone());
    let mut second = harness_at(dir.path(), recipes);

    let habit_id = first
        .planner
        .create_habit(daily("u1", "Floss", None, "UTC"))
        .unwrap();

    let barrier = Barrier::new(2);
    let run = |planner: &habit_planner::Planner| {
        barrier.wait();
        planner.ensure_generated("u1", date("2026-10-14"))
    };
    let (a, b) = std::thread::scope(|scope| {
        let a = scope.spawn(|| run(&first.planner));
        let b = scope.spawn(|| run(&second.planner));
        (a.join().unwrap(), b.join().unwrap())
    });

    assert!(a.is_clean() && b.is_clean(), "{:?} / {:?}", a.errors, b.errors);
    assert_eq!(a.success_count + b.success_count, 1);
    assert_eq!(a.already_generated_count + b.already_generated_count, 1);
    assert_eq!(first.planner.store().list_occurrences(&habit_id).unwrap().len(), 1);
    assert_eq!(first.drain().len() + second.drain().len(), 1);
}
