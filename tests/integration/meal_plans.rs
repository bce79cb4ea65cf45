//! Meal-domain habits: recipe plans resolved into versioned substeps.

use habit_planner::PlannerError;
use habit_planner::domains::{ExplicitStep, SubstepPlan};
use habit_planner::habits::{NewHabit, NewSubEntity, SubstepSpec, Weekday};

use crate::helpers::{date, harness, instruction, time, utc, weekly};

fn roast_habit(plan: SubstepPlan) -> NewHabit {
    NewHabit {
        domain: Some("meal".to_owned()),
        entity_id: Some("roast".to_owned()),
        entity_name: String::new(),
        substeps: SubstepSpec::Plan { plan },
        ..weekly("u1", "", Weekday::Sunday, time(12, 0), "Europe/London")
    }
}

#[test]
fn all_instructions_become_saturday_substeps() {
    let mut h = harness();
    h.recipes
        .publish(
            "roast",
            "Sunday roast",
            vec![
                instruction("brine", 1, "Brine the chicken"),
                instruction("veg", 2, "Peel the vegetables"),
            ],
        )
        .unwrap();
    let habit_id = h
        .planner
        .create_habit(roast_habit(SubstepPlan::All {
            offset_days: -1,
            time: Some(time(19, 0)),
        }))
        .unwrap();

    let snapshot = h.planner.habit(&habit_id).unwrap();
    assert_eq!(snapshot.habit.entity_name, "Sunday roast");
    assert_eq!(
        snapshot.trigger.as_ref().map(|t| t.trigger_weekday),
        Some(Weekday::Saturday)
    );

    // Nothing is due on Sunday itself: the week fires on Saturday.
    assert_eq!(h.planner.ensure_generated("u1", date("2026-10-18")).success_count, 0);

    let result = h.planner.ensure_generated("u1", date("2026-10-17"));
    assert!(result.is_clean(), "{:?}", result.errors);
    assert_eq!(result.success_count, 1);

    let saturday = h.planner.list_todos("u1", date("2026-10-17")).unwrap();
    let titles: Vec<_> = saturday.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Sunday roast: step 1 - Brine the chicken",
            "Sunday roast: step 2 - Peel the vegetables",
        ]
    );
    // 19:00 BST.
    assert!(saturday.iter().all(|t| t.scheduled_for == utc("2026-10-17T18:00:00Z")));
    assert!(saturday.iter().all(|t| t.domain.as_deref() == Some("meal")));

    let sunday = h.planner.list_todos("u1", date("2026-10-18")).unwrap();
    assert_eq!(sunday.len(), 1);
    assert_eq!(sunday[0].title, "Sunday roast");
    assert_eq!(sunday[0].scheduled_for, utc("2026-10-18T11:00:00Z"));
    assert_eq!(h.drain().len(), 1);
}

#[test]
fn substep_titles_stay_pinned_to_the_resolved_version() {
    let h = harness();
    h.recipes
        .publish("roast", "Sunday roast", vec![instruction("brine", 1, "Brine overnight")])
        .unwrap();
    h.planner
        .create_habit(roast_habit(SubstepPlan::Explicit {
            steps: vec![ExplicitStep {
                sub_entity_id: "brine".to_owned(),
                offset_days: -1,
                time: Some(time(20, 0)),
                title_override: None,
            }],
        }))
        .unwrap();

    h.recipes
        .publish("roast", "Sunday roast", vec![instruction("brine", 1, "Dry brine for 4 hours")])
        .unwrap();

    let saturday = h.planner.list_todos("u1", date("2026-10-24")).unwrap();
    assert_eq!(saturday.len(), 1);
    assert_eq!(saturday[0].title, "Sunday roast: step 1 - Brine overnight");
    assert_eq!(saturday[0].sub_entity_id.as_deref(), Some("roast:1:brine"));

    // Clocks go back on 2026-10-25, so Sunday noon is GMT.
    let sunday = h.planner.list_todos("u1", date("2026-10-25")).unwrap();
    assert_eq!(sunday[0].scheduled_for, utc("2026-10-25T12:00:00Z"));
}

#[test]
fn explicit_plan_title_override_wins() {
    let h = harness();
    h.recipes
        .publish("roast", "Sunday roast", vec![instruction("shop", 1, "Buy a chicken")])
        .unwrap();
    h.planner
        .create_habit(roast_habit(SubstepPlan::Explicit {
            steps: vec![ExplicitStep {
                sub_entity_id: "shop".to_owned(),
                offset_days: -3,
                time: None,
                title_override: Some("Butcher run".to_owned()),
            }],
        }))
        .unwrap();

    // Sunday minus three days is Thursday; no step time means the habit's noon.
    let thursday = h.planner.list_todos("u1", date("2026-10-15")).unwrap();
    assert_eq!(thursday.len(), 1);
    assert_eq!(thursday[0].title, "Butcher run");
    assert_eq!(thursday[0].scheduled_for, utc("2026-10-15T11:00:00Z"));
}

#[test]
fn explicit_plan_with_unknown_instruction_is_rejected() {
    let h = harness();
    h.recipes
        .publish("roast", "Sunday roast", vec![instruction("shop", 1, "Buy a chicken")])
        .unwrap();
    let err = h
        .planner
        .create_habit(roast_habit(SubstepPlan::Explicit {
            steps: vec![ExplicitStep {
                sub_entity_id: "carve".to_owned(),
                offset_days: 0,
                time: None,
                title_override: None,
            }],
        }))
        .unwrap_err();
    assert!(matches!(err, PlannerError::EntityNotFound { .. }));
    assert!(h.planner.list_habits("u1", true).unwrap().is_empty());
}

#[test]
fn tagged_plan_leaves_a_main_event_only_habit() {
    let h = harness();
    h.recipes
        .publish("roast", "Sunday roast", vec![instruction("shop", 1, "Buy a chicken")])
        .unwrap();
    let habit_id = h
        .planner
        .create_habit(roast_habit(SubstepPlan::Tagged {
            tag: "prep".to_owned(),
        }))
        .unwrap();

    let snapshot = h.planner.habit(&habit_id).unwrap();
    assert!(snapshot.substeps.is_empty());
    assert_eq!(
        snapshot.trigger.map(|t| t.trigger_weekday),
        Some(Weekday::Sunday)
    );
    assert_eq!(h.planner.list_todos("u1", date("2026-10-18")).unwrap().len(), 1);
}

#[test]
fn manual_substeps_on_a_meal_habit_keep_their_names() {
    let mut h = harness();
    h.recipes
        .publish("chili", "Chili", vec![instruction("simmer", 1, "Simmer for two hours")])
        .unwrap();
    h.planner
        .create_habit(NewHabit {
            domain: Some("meal".to_owned()),
            entity_id: Some("chili".to_owned()),
            entity_name: String::new(),
            substeps: SubstepSpec::Manual {
                substeps: vec![NewSubEntity {
                    sub_entity_id: Some("soak".to_owned()),
                    sub_entity_name: "Soak beans tonight".to_owned(),
                    scheduled_weekday: Weekday::Wednesday,
                    scheduled_time: Some(time(20, 0)),
                    is_main_event: false,
                }],
            },
            ..weekly("u1", "", Weekday::Friday, time(18, 0), "UTC")
        })
        .unwrap();

    let result = h.planner.ensure_generated("u1", date("2026-10-14"));
    assert!(result.is_clean(), "{:?}", result.errors);

    let batches = h.drain();
    let titles: Vec<_> = batches[0].instances.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Soak beans tonight", "Chili"]);
}
