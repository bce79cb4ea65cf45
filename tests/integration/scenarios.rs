//! End-to-end generation scenarios through the `Planner` facade.

use chrono::Datelike;
use habit_planner::PlannerError;
use habit_planner::habits::{
    Habit, HabitTrigger, NewSubEntity, OccurrenceStatus, RecurrenceType, SubstepSpec, Weekday,
};

use crate::helpers::{daily, date, harness, time, utc, weekly};

#[test]
fn weekly_habit_with_wednesday_substep_in_new_york() {
    let mut h = harness();
    let habit_id = h
        .planner
        .create_habit(habit_planner::habits::NewHabit {
            substeps: SubstepSpec::Manual {
                substeps: vec![NewSubEntity {
                    sub_entity_id: None,
                    sub_entity_name: "Buy groceries".to_owned(),
                    scheduled_weekday: Weekday::Wednesday,
                    scheduled_time: Some(time(10, 0)),
                    is_main_event: false,
                }],
            },
            ..weekly("u1", "Cook dinner", Weekday::Friday, time(18, 0), "America/New_York")
        })
        .unwrap();

    let wednesday = date("2026-10-14");
    assert_eq!(wednesday.weekday(), chrono::Weekday::Wed);
    let result = h.planner.ensure_generated("u1", wednesday);
    assert!(result.is_clean(), "unexpected failures: {:?}", result.errors);
    assert_eq!(result.success_count, 1);

    let occurrences = h.planner.store().list_occurrences(&habit_id).unwrap();
    assert_eq!(occurrences.len(), 1);
    assert_eq!(occurrences[0].cycle_key, "2026-W42");
    assert_eq!(occurrences[0].target_date, wednesday);
    assert_eq!(occurrences[0].status, OccurrenceStatus::Planned);

    let batches = h.drain();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].topic, "todos.generated");
    let instances = &batches[0].instances;
    assert_eq!(instances.len(), 2);

    let substep = instances.iter().find(|i| !i.is_main_event()).unwrap();
    assert_eq!(substep.title, "Buy groceries");
    assert_eq!(substep.due_date, wednesday);
    assert_eq!(substep.scheduled_for, utc("2026-10-14T14:00:00Z"));

    let main = instances.iter().find(|i| i.is_main_event()).unwrap();
    assert_eq!(main.title, "Cook dinner");
    assert_eq!(main.due_date, date("2026-10-16"));
    assert_eq!(main.scheduled_for, utc("2026-10-16T22:00:00Z"));
    assert!(instances.iter().all(|i| i.instance_id == occurrences[0].id));

    // Todos are listed on the day each instance is due.
    assert_eq!(h.planner.list_todos("u1", wednesday).unwrap().len(), 1);
    let friday = h.planner.list_todos("u1", date("2026-10-16")).unwrap();
    assert_eq!(friday.len(), 1);
    assert!(friday[0].is_main_event());
}

#[test]
fn weekly_habit_is_not_generated_off_its_trigger_day() {
    let mut h = harness();
    h.planner
        .create_habit(weekly("u1", "Review", Weekday::Friday, time(18, 0), "UTC"))
        .unwrap();

    let result = h.planner.ensure_generated("u1", date("2026-10-14"));
    assert!(result.is_clean());
    assert_eq!(result.success_count, 0);
    assert!(h.drain().is_empty());
}

#[test]
fn daily_habit_generates_once_per_day() {
    let mut h = harness();
    let habit_id = h
        .planner
        .create_habit(daily("u1", "Stretch", Some(time(7, 30)), "Europe/Berlin"))
        .unwrap();

    for day in ["2026-10-14", "2026-10-15", "2026-10-16"] {
        let result = h.planner.ensure_generated("u1", date(day));
        assert_eq!(result.success_count, 1, "day {day}");
    }

    let occurrences = h.planner.store().list_occurrences(&habit_id).unwrap();
    let keys: Vec<_> = occurrences.iter().map(|o| o.cycle_key.as_str()).collect();
    assert_eq!(keys, vec!["2026-10-14", "2026-10-15", "2026-10-16"]);

    let batches = h.drain();
    assert_eq!(batches.len(), 3);
    assert!(batches.iter().all(|b| b.instances.len() == 1));
    // 07:30 CEST is 05:30 UTC.
    assert_eq!(
        batches[0].instances[0].scheduled_for,
        utc("2026-10-14T05:30:00Z")
    );
}

#[test]
fn daily_habit_without_time_uses_nine_am() {
    let mut h = harness();
    h.planner
        .create_habit(daily("u1", "Water plants", None, "Asia/Tokyo"))
        .unwrap();
    h.planner.ensure_generated("u1", date("2026-10-14"));

    let batches = h.drain();
    let instance = &batches[0].instances[0];
    assert_eq!(instance.preferred_time, time(9, 0));
    assert_eq!(instance.scheduled_for, utc("2026-10-14T00:00:00Z"));
}

#[test]
fn second_pass_reports_already_generated() {
    let mut h = harness();
    h.planner
        .create_habit(weekly("u1", "Review", Weekday::Wednesday, time(18, 0), "UTC"))
        .unwrap();

    let first = h.planner.ensure_generated("u1", date("2026-10-14"));
    assert_eq!((first.success_count, first.already_generated_count), (1, 0));
    let second = h.planner.ensure_generated("u1", date("2026-10-14"));
    assert_eq!((second.success_count, second.already_generated_count), (0, 1));
    assert!(second.is_clean());

    assert_eq!(h.drain().len(), 1);
    assert_eq!(h.planner.list_todos("u1", date("2026-10-14")).unwrap().len(), 1);
}

#[test]
fn missing_domain_entity_fails_only_that_habit() {
    let mut h = harness();
    let good = h.planner.create_habit(daily("u1", "Journal", None, "UTC")).unwrap();

    // A meal habit whose recipe no longer exists.
    let broken = Habit {
        id: "habit-ghost".to_owned(),
        user_id: "u1".to_owned(),
        domain: Some("meal".to_owned()),
        entity_id: Some("vanished-recipe".to_owned()),
        entity_name: "Vanished".to_owned(),
        recurrence: RecurrenceType::Weekly,
        target_weekday: Some(Weekday::Wednesday),
        target_time: None,
        start_date: date("2026-01-01"),
        timezone: "UTC".to_owned(),
        is_active: true,
        archived: false,
    };
    let trigger = HabitTrigger {
        habit_id: broken.id.clone(),
        trigger_sub_entity_id: None,
        trigger_weekday: Weekday::Wednesday,
    };
    h.planner
        .store()
        .insert_habit(&broken, &[], Some(&trigger))
        .unwrap();

    let result = h.planner.ensure_generated("u1", date("2026-10-14"));
    assert_eq!(result.success_count, 1);
    assert_eq!(result.failed_habit_ids, vec!["habit-ghost".to_owned()]);
    assert!(matches!(
        result.errors[0].error,
        PlannerError::EntityNotFound { .. }
    ));

    assert!(h.planner.store().list_occurrences("habit-ghost").unwrap().is_empty());
    assert_eq!(h.planner.store().list_occurrences(&good).unwrap().len(), 1);
    let batches = h.drain();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].instances[0].habit_id, good);
}

#[test]
fn habits_before_start_date_or_paused_are_skipped() {
    let mut h = harness();
    h.planner
        .create_habit(habit_planner::habits::NewHabit {
            start_date: date("2026-11-01"),
            ..daily("u1", "Future", None, "UTC")
        })
        .unwrap();
    h.planner
        .create_habit(habit_planner::habits::NewHabit {
            is_active: false,
            ..daily("u1", "Paused", None, "UTC")
        })
        .unwrap();

    let result = h.planner.ensure_generated("u1", date("2026-10-14"));
    assert_eq!(result.success_count, 0);
    assert!(result.is_clean());
    assert!(h.drain().is_empty());
}

#[test]
fn spring_forward_gap_uses_pre_transition_offset() {
    let mut h = harness();
    h.planner
        .create_habit(daily("u1", "Night feed", Some(time(2, 30)), "America/New_York"))
        .unwrap();

    // 2026-03-08 02:30 does not exist in New York; EST (-05:00) still applies.
    h.planner.ensure_generated("u1", date("2026-03-08"));
    let batches = h.drain();
    assert_eq!(
        batches[0].instances[0].scheduled_for,
        utc("2026-03-08T07:30:00Z")
    );
}

#[test]
fn fall_back_overlap_takes_the_earlier_instant() {
    let mut h = harness();
    h.planner
        .create_habit(daily("u1", "Night feed", Some(time(1, 30)), "America/New_York"))
        .unwrap();

    // 2026-11-01 01:30 happens twice; the EDT (-04:00) reading comes first.
    h.planner.ensure_generated("u1", date("2026-11-01"));
    let batches = h.drain();
    assert_eq!(
        batches[0].instances[0].scheduled_for,
        utc("2026-11-01T05:30:00Z")
    );
}

#[test]
fn occurrence_status_follows_lifecycle() {
    let h = harness();
    let habit_id = h.planner.create_habit(daily("u1", "Read", None, "UTC")).unwrap();
    h.planner.ensure_generated("u1", date("2026-10-14"));
    let occurrence = h.planner.store().list_occurrences(&habit_id).unwrap().remove(0);

    h.planner
        .set_occurrence_status(&occurrence.id, OccurrenceStatus::Completed)
        .unwrap();
    assert!(matches!(
        h.planner
            .set_occurrence_status(&occurrence.id, OccurrenceStatus::Planned),
        Err(PlannerError::Validation(_))
    ));
    assert!(matches!(
        h.planner
            .set_occurrence_status("no-such-occurrence", OccurrenceStatus::Completed),
        Err(PlannerError::NotFound(_))
    ));
}

#[tokio::test]
async fn batches_reach_an_async_consumer() {
    let mut h = harness();
    h.planner
        .create_habit(daily("u1", "Meditate", Some(time(6, 0)), "UTC"))
        .unwrap();

    let planner = h.planner.clone();
    let result = tokio::task::spawn_blocking(move || {
        planner.ensure_generated("u1", date("2026-10-14"))
    })
    .await
    .unwrap();
    assert_eq!(result.success_count, 1);

    let batch = h.published.recv().await.expect("one batch");
    assert_eq!(batch.instances.len(), 1);
    assert_eq!(batch.instances[0].title, "Meditate");
}
