use ai_core::{Phase, Schedule, TickContext};

#[test]
fn systems_run_in_registration_order_within_a_phase() {
    let mut schedule: Schedule<Vec<&'static str>> = Schedule::new();
    schedule
        .add_system(Phase::StateReaction, "late", |_ctx, log| log.push("late"))
        .add_system(Phase::EventDispatch, "first", |_ctx, log| log.push("first"))
        .add_system(Phase::EventDispatch, "second", |_ctx, log| log.push("second"));

    let mut log = Vec::new();
    let ctx = TickContext::new(0, 1);
    for phase in Phase::ALL {
        schedule.run_phase(phase, &ctx, &mut log);
    }

    assert_eq!(log, vec!["first", "second", "late"]);
    assert_eq!(schedule.system_names(Phase::EventDispatch), vec!["first", "second"]);
    assert!(schedule.system_names(Phase::Cleanup).is_empty());
}

#[test]
fn phases_are_ordered_like_a_turn() {
    let mut sorted = Phase::ALL;
    sorted.sort();
    assert_eq!(sorted, Phase::ALL);
}
