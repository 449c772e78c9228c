mod common;

use std::cell::RefCell;
use std::rc::Rc;

use ai_hsm::{HsmConfig, HsmError, StateMachineTracker, SubmachineEntry};
use ai_tools::VecTraceSink;

use common::{turn, yaml, MachineWorld};

fn tracker(src: &str, world: &mut MachineWorld) -> StateMachineTracker {
    let mut tracker = StateMachineTracker::new();
    tracker.load(&yaml(src), &mut world.names).unwrap();
    tracker
}

const TOGGLE: &str = "
toggle:
  a: [ {b: go} ]
  b: [ {a: back} ]
";

#[test]
fn fires_on_the_turn_the_event_is_seen() {
    let mut world = MachineWorld::new();
    world.spawn(1);
    let mut tracker = tracker(TOGGLE, &mut world);
    tracker.add_sm_to_entity(&mut world, 1, "toggle").unwrap();
    assert_eq!(world.current(&tracker, 1, "toggle"), "a");

    assert_eq!(turn(&mut tracker, &mut world, 0), 0);
    assert_eq!(world.current(&tracker, 1, "toggle"), "a");

    world.fire(1, "go");
    assert_eq!(turn(&mut tracker, &mut world, 1), 1);
    assert_eq!(world.current(&tracker, 1, "toggle"), "b");

    // Events do not outlive their turn.
    assert_eq!(turn(&mut tracker, &mut world, 2), 0);
    assert_eq!(world.current(&tracker, 1, "toggle"), "b");

    world.fire(1, "back");
    turn(&mut tracker, &mut world, 3);
    assert_eq!(world.current(&tracker, 1, "toggle"), "a");
}

#[test]
fn attaching_tracks_every_event_read() {
    let mut world = MachineWorld::new();
    world.spawn(1);
    let tracker = tracker(TOGGLE, &mut world);
    tracker.add_sm_to_entity(&mut world, 1, "toggle").unwrap();

    let go = world.names.event("go");
    let back = world.names.event("back");
    let other = world.names.event("other");
    let events = &world.records[&1].events;
    assert!(events.is_tracked(go));
    assert!(events.is_tracked(back));
    assert!(!events.is_tracked(other));
}

#[test]
fn at_most_one_transition_per_machine_per_turn() {
    let mut world = MachineWorld::new();
    world.spawn(1);
    let mut tracker = tracker("ping: {a: [{b: go}], b: [{a: go}]}", &mut world);
    tracker.add_sm_to_entity(&mut world, 1, "ping").unwrap();

    world.fire(1, "go");
    assert_eq!(turn(&mut tracker, &mut world, 0), 1);
    assert_eq!(world.current(&tracker, 1, "ping"), "b");
}

#[test]
fn first_matching_transition_wins() {
    let mut world = MachineWorld::new();
    world.spawn(1);
    let mut tracker = tracker(
        "fork: {start: [{left: {or: [l, both]}}, {right: {or: [r, both]}}], left: ~, right: ~}",
        &mut world,
    );
    tracker.add_sm_to_entity(&mut world, 1, "fork").unwrap();

    world.fire(1, "both");
    turn(&mut tracker, &mut world, 0);
    assert_eq!(world.current(&tracker, 1, "fork"), "left");
}

#[test]
fn agents_are_independent() {
    let mut world = MachineWorld::new();
    world.spawn(1);
    world.spawn(2);
    let mut tracker = tracker(TOGGLE, &mut world);
    tracker.add_sm_to_entity(&mut world, 1, "toggle").unwrap();
    tracker.add_sm_to_entity(&mut world, 2, "toggle").unwrap();

    world.fire(2, "go");
    assert_eq!(turn(&mut tracker, &mut world, 0), 1);
    assert_eq!(world.current(&tracker, 1, "toggle"), "a");
    assert_eq!(world.current(&tracker, 2, "toggle"), "b");
}

#[test]
fn agents_without_machines_are_skipped() {
    let mut world = MachineWorld::new();
    world.spawn(1);
    let mut tracker = tracker(TOGGLE, &mut world);
    world.fire(1, "go");
    assert_eq!(turn(&mut tracker, &mut world, 0), 0);
    assert!(world.states(1).is_empty());
}

#[test]
fn attach_errors() {
    let mut world = MachineWorld::new();
    world.spawn(1);
    let tracker = tracker(TOGGLE, &mut world);

    assert_eq!(
        tracker.add_sm_to_entity(&mut world, 1, "missing"),
        Err(HsmError::UnknownMachine {
            name: "missing".to_owned()
        })
    );
    assert_eq!(
        tracker.add_sm_to_entity(&mut world, 99, "toggle"),
        Err(HsmError::MissingComponent {
            component: "event set"
        })
    );
}

#[test]
fn attaching_twice_keeps_the_current_state() {
    let mut world = MachineWorld::new();
    world.spawn(1);
    let mut tracker = tracker(TOGGLE, &mut world);
    tracker.add_sm_to_entity(&mut world, 1, "toggle").unwrap();
    world.fire(1, "go");
    turn(&mut tracker, &mut world, 0);

    tracker.add_sm_to_entity(&mut world, 1, "toggle").unwrap();
    assert_eq!(world.states(1).len(), 1);
    assert_eq!(world.current(&tracker, 1, "toggle"), "b");
}

const NESTED: &str = "
inner:
  idle: [ {busy: work} ]
  busy: [ {idle: rest} ]
outer:
  calm: [ {inner: alarm} ]
  inner: [ {calm: quiet} ]
";

fn nested(config: HsmConfig) -> (MachineWorld, StateMachineTracker) {
    let mut world = MachineWorld::new();
    world.spawn(1);
    let mut tracker = StateMachineTracker::with_config(config);
    tracker.load(&yaml(NESTED), &mut world.names).unwrap();
    tracker.add_sm_to_entity(&mut world, 1, "outer").unwrap();
    (world, tracker)
}

#[test]
fn submachine_is_active_only_inside_its_state() {
    let (mut world, mut tracker) = nested(HsmConfig::default());
    let inner = tracker.machine("inner").unwrap().id();
    let busy = world.state("busy");

    // Attached with the parent, but the parent starts elsewhere.
    assert_eq!(world.states(1).len(), 2);
    assert!(!world.states(1).is_active(inner));

    // Inactive machines do not fire.
    world.fire(1, "work");
    assert_eq!(turn(&mut tracker, &mut world, 0), 0);
    assert_eq!(world.current(&tracker, 1, "inner"), "idle");

    world.fire(1, "alarm");
    assert_eq!(turn(&mut tracker, &mut world, 1), 1);
    assert!(world.states(1).is_active(inner));

    world.fire(1, "work");
    assert_eq!(turn(&mut tracker, &mut world, 2), 1);
    assert!(world.states(1).is_in(busy));

    world.fire(1, "quiet");
    turn(&mut tracker, &mut world, 3);
    assert_eq!(world.current(&tracker, 1, "outer"), "calm");
    assert!(!world.states(1).is_active(inner));
    assert!(!world.states(1).is_in(busy));
}

#[test]
fn attaching_a_parent_deactivates_a_child_attached_on_its_own() {
    let mut world = MachineWorld::new();
    world.spawn(1);
    let mut tracker = tracker(NESTED, &mut world);
    let inner = tracker.machine("inner").unwrap().id();

    tracker.add_sm_to_entity(&mut world, 1, "inner").unwrap();
    assert!(world.states(1).is_active(inner));

    // outer starts in calm, which does not compose inner.
    tracker.add_sm_to_entity(&mut world, 1, "outer").unwrap();
    assert_eq!(world.states(1).len(), 2);
    assert!(!world.states(1).is_active(inner));

    world.fire(1, "work");
    assert_eq!(turn(&mut tracker, &mut world, 0), 0);
    assert_eq!(world.current(&tracker, 1, "inner"), "idle");

    // Entering the composing state brings it back.
    world.fire(1, "alarm");
    assert_eq!(turn(&mut tracker, &mut world, 1), 1);
    assert!(world.states(1).is_active(inner));
}

#[test]
fn reattaching_a_parent_follows_its_current_state() {
    let (mut world, mut tracker) = nested(HsmConfig::default());
    let inner = tracker.machine("inner").unwrap().id();
    world.fire(1, "alarm");
    turn(&mut tracker, &mut world, 0);
    assert!(world.states(1).is_active(inner));

    tracker.add_sm_to_entity(&mut world, 1, "outer").unwrap();
    assert_eq!(world.current(&tracker, 1, "outer"), "inner");
    assert!(world.states(1).is_active(inner));
}

#[test]
fn leaving_the_parent_state_stops_the_child_in_the_same_turn() {
    let (mut world, mut tracker) = nested(HsmConfig::default());
    world.fire(1, "alarm");
    turn(&mut tracker, &mut world, 0);

    // The parent is evaluated first; the child it deactivates does not get a turn.
    world.fire(1, "quiet");
    world.fire(1, "work");
    assert_eq!(turn(&mut tracker, &mut world, 1), 1);
    assert_eq!(world.current(&tracker, 1, "inner"), "idle");
}

fn reenter(world: &mut MachineWorld, tracker: &mut StateMachineTracker) {
    for (t, event) in ["alarm", "work", "quiet", "alarm"].into_iter().enumerate() {
        world.fire(1, event);
        assert_eq!(turn(tracker, world, t as u64), 1, "{event}");
    }
}

#[test]
fn reentry_preserves_submachine_state_by_default() {
    let (mut world, mut tracker) = nested(HsmConfig::default());
    reenter(&mut world, &mut tracker);
    assert_eq!(world.current(&tracker, 1, "inner"), "busy");
}

#[test]
fn reentry_can_reset_the_submachine() {
    let (mut world, mut tracker) = nested(HsmConfig {
        submachine_entry: SubmachineEntry::Reset,
    });
    reenter(&mut world, &mut tracker);
    assert_eq!(world.current(&tracker, 1, "inner"), "idle");
}

#[test]
fn deactivation_reaches_every_level() {
    let mut world = MachineWorld::new();
    world.spawn(1);
    let mut tracker = tracker(
        "
leaf:
  a: [ {b: x} ]
  b: ~
mid:
  leaf: [ {rest: y} ]
  rest: [ {leaf: z} ]
top:
  mid: [ {off: q} ]
  off: [ {mid: r} ]
",
        &mut world,
    );
    tracker.add_sm_to_entity(&mut world, 1, "top").unwrap();
    let mid = tracker.machine("mid").unwrap().id();
    let leaf = tracker.machine("leaf").unwrap().id();

    let x = world.names.event("x");
    assert_eq!(world.states(1).active_machines().count(), 3);
    assert!(world.records[&1].events.is_tracked(x));

    world.fire(1, "q");
    turn(&mut tracker, &mut world, 0);
    assert!(!world.states(1).is_active(mid));
    assert!(!world.states(1).is_active(leaf));

    world.fire(1, "r");
    turn(&mut tracker, &mut world, 1);
    assert!(world.states(1).is_active(mid));
    assert!(world.states(1).is_active(leaf));
}

#[test]
fn transitions_are_traced() {
    let mut world = MachineWorld::new();
    world.spawn(1);
    let sink = Rc::new(RefCell::new(VecTraceSink::default()));
    let mut tracker = StateMachineTracker::new().with_trace(Rc::clone(&sink));
    tracker.load(&yaml(TOGGLE), &mut world.names).unwrap();
    tracker.add_sm_to_entity(&mut world, 1, "toggle").unwrap();

    for (t, event) in ["go", "noise", "back"].into_iter().enumerate() {
        world.fire(1, event);
        turn(&mut tracker, &mut world, t as u64);
    }

    let sink = sink.borrow();
    assert_eq!(sink.count("hsm.transition"), 2);
    let b = world.state("b");
    assert_eq!(sink.events[0].turn, 0);
    assert_eq!(sink.events[0].a, 1);
    assert_eq!(sink.events[0].b, b.0.index() as u64);
}
