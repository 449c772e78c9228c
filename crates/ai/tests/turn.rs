use std::cell::RefCell;
use std::rc::Rc;

use ai::bt::{calculate, sequence, wait_event, Node};
use ai::core::{GridAction, GridMut, IVec2, Phase, WorldView};
use ai::hsm::{MachineView, StateId, SubmachineEntry};
use ai::{AgentRecord, AiConfig, SimWorld, TurnDriver};

type Log = Rc<RefCell<Vec<&'static str>>>;

fn logging_leaf(world: &mut SimWorld, log: &Log, label: &'static str) -> Node<SimWorld> {
    let log = Rc::clone(log);
    calculate(
        move |_: &SimWorld, _, _| {
            log.borrow_mut().push(label);
            Some(1)
        },
        world.names.key::<i32>("logged"),
    )
}

#[test]
fn phases_run_in_order() {
    let mut world = SimWorld::new();
    let agent = world.spawn(AgentRecord::at((0, 0)));
    let log: Log = Rc::default();

    let mut driver: TurnDriver<SimWorld> = TurnDriver::new(1);
    for (phase, label) in [
        (Phase::Cleanup, "cleanup"),
        (Phase::StateReaction, "state_reaction"),
        (Phase::Transition, "transition"),
        (Phase::Acting, "acting"),
        (Phase::EventReaction, "event_reaction"),
        (Phase::EventDispatch, "event_dispatch"),
    ] {
        let log = Rc::clone(&log);
        driver
            .schedule_mut()
            .add_system(phase, label, move |_, _: &mut SimWorld| {
                log.borrow_mut().push(label)
            });
    }
    let tree = logging_leaf(&mut world, &log, "tree");
    driver.forest_mut().plant(agent, &tree);

    let report = driver.run_turn(&mut world);
    assert_eq!(report.turn, 0);
    assert_eq!(driver.turn(), 1);
    assert_eq!(
        *log.borrow(),
        vec![
            "event_dispatch",
            "event_reaction",
            "acting",
            "tree",
            "transition",
            "state_reaction",
            "cleanup",
        ]
    );
}

#[test]
fn dispatched_events_wake_trees_in_the_same_turn() {
    let mut world = SimWorld::new();
    let agent = world.spawn(AgentRecord::at((0, 0)));
    let alarm = world.names.event("alarm");
    let log: Log = Rc::default();

    let mut driver: TurnDriver<SimWorld> = TurnDriver::new(1);
    driver
        .schedule_mut()
        .add_system(Phase::EventDispatch, "alarm", move |ctx, world: &mut SimWorld| {
            if ctx.turn == 1 {
                world.fire(agent, alarm);
            }
        });
    let after = logging_leaf(&mut world, &log, "after");
    driver
        .forest_mut()
        .plant(agent, &sequence(vec![wait_event(alarm), after]));

    driver.run_turn(&mut world);
    assert!(log.borrow().is_empty());
    assert!(driver.forest().get(agent).unwrap().is_running());

    // Woken in the reaction phase, then restarted in the acting phase where the wait
    // short-circuits because the event is still in this turn's set.
    driver.run_turn(&mut world);
    assert_eq!(*log.borrow(), vec!["after", "after"]);

    driver.run_turn(&mut world);
    assert_eq!(log.borrow().len(), 2);
    assert!(driver.forest().get(agent).unwrap().is_running());
}

#[test]
fn state_reactions_see_this_turns_transitions() {
    let mut world = SimWorld::new();
    let agent = world.spawn(AgentRecord::at((0, 0)));
    let provoked = world.names.event("provoked");
    let angry = StateId::intern(&mut world.names, "angry");

    let mut driver: TurnDriver<SimWorld> = TurnDriver::new(1);
    driver
        .tracker_mut()
        .load(
            &serde_yaml::from_str(
                "mood: {calm: [{angry: provoked}], angry: [{calm: {not: provoked}}]}",
            )
            .unwrap(),
            &mut world.names,
        )
        .unwrap();
    driver
        .tracker()
        .add_sm_to_entity(&mut world, agent, "mood")
        .unwrap();

    driver
        .schedule_mut()
        .add_system(Phase::EventDispatch, "provoke", move |ctx, world: &mut SimWorld| {
            if ctx.turn == 1 {
                world.fire(agent, provoked);
            }
        })
        .add_system(Phase::StateReaction, "charge", move |_, world: &mut SimWorld| {
            for agent in world.agents() {
                if world.machines(agent).is_some_and(|m| m.is_in(angry)) {
                    world.set_action(agent, GridAction::MoveUp);
                }
            }
        });

    assert_eq!(driver.run_turn(&mut world).transitions, 0);
    assert_eq!(world.record(agent).unwrap().action, GridAction::Nop);

    assert_eq!(driver.run_turn(&mut world).transitions, 1);
    assert_eq!(world.record(agent).unwrap().action, GridAction::MoveUp);
    world.apply_actions();
    assert_eq!(world.record(agent).unwrap().position, IVec2 { x: 0, y: 1 });

    assert_eq!(driver.run_turn(&mut world).transitions, 1);
    assert_eq!(world.record(agent).unwrap().action, GridAction::Nop);
    let state = driver
        .tracker()
        .current_state(&world, agent, "mood")
        .unwrap();
    assert_eq!(world.names.resolve(state.0), Some("calm"));
}

#[test]
fn events_are_cleared_at_the_end_of_the_turn() {
    let mut world = SimWorld::new();
    let agent = world.spawn(AgentRecord::at((0, 0)));
    let ping = world.names.event("ping");
    world.fire(agent, ping);

    let mut driver: TurnDriver<SimWorld> = TurnDriver::new(1);
    driver.run_turn(&mut world);
    assert!(world.record(agent).unwrap().events.is_empty());
}

#[test]
fn dead_agents_lose_their_trees() {
    let mut world = SimWorld::new();
    let alive = world.spawn(AgentRecord::at((0, 0)));
    let doomed = world.spawn(AgentRecord::at((1, 0)));
    let never = world.names.event("never");

    let mut driver: TurnDriver<SimWorld> = TurnDriver::new(1);
    driver.forest_mut().plant(alive, &wait_event(never));
    driver.forest_mut().plant(doomed, &wait_event(never));

    driver.run_turn(&mut world);
    world.kill(doomed);
    driver.run_turn(&mut world);

    assert_eq!(driver.forest().agents().collect::<Vec<_>>(), vec![alive]);
}

#[test]
fn run_reports_every_turn() {
    let mut world = SimWorld::new();
    let mut driver: TurnDriver<SimWorld> = TurnDriver::new(9);
    let reports = driver.run(&mut world, 3);
    assert_eq!(
        reports.iter().map(|r| r.turn).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert_eq!(driver.context().seed, 9);
}

#[test]
fn config_reaches_the_tracker() {
    let config = AiConfig::from_yaml_str("seed: 42\nhsm: {submachine_entry: reset}").unwrap();
    let driver: TurnDriver<SimWorld> = TurnDriver::with_config(&config);
    assert_eq!(driver.context().seed, 42);
    assert_eq!(
        driver.tracker().config().submachine_entry,
        SubmachineEntry::Reset
    );
}
