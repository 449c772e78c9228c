#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use ai_bt::{calculate, Node};
use ai_core::{
    BbKey, Blackboard, EventId, EventSet, GridAction, GridMut, GridView, IVec2, Interner,
    MemoryMut, MemoryView, RelationId, TickContext, WorldMut, WorldView,
};

#[derive(Debug, Default)]
pub struct Body {
    pub pos: IVec2,
    pub alive: bool,
    pub team: Option<i32>,
    pub visibility: Option<f32>,
    pub action: GridAction,
    pub blackboard: Blackboard<u64>,
    pub events: EventSet,
    pub links: BTreeMap<RelationId, u64>,
}

#[derive(Debug, Default)]
pub struct TestWorld {
    pub bodies: BTreeMap<u64, Body>,
    pub names: Interner,
}

impl TestWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, agent: u64, pos: (i32, i32), team: i32) -> &mut Body {
        self.bodies.entry(agent).or_insert(Body {
            pos: pos.into(),
            alive: true,
            team: Some(team),
            ..Body::default()
        })
    }

    pub fn body(&mut self, agent: u64) -> &mut Body {
        self.bodies.get_mut(&agent).expect("unknown agent")
    }

    pub fn fire(&mut self, agent: u64, event: EventId) {
        self.body(agent).events.fire(event);
    }

    pub fn clear_events(&mut self) {
        ai_core::clear_event_sets(self);
    }

    /// Apply every intended action and reset it, like a host's end-of-turn movement.
    pub fn apply_actions(&mut self) {
        for body in self.bodies.values_mut() {
            body.pos = body.pos + body.action.offset();
            body.action = GridAction::Nop;
        }
    }
}

impl WorldView for TestWorld {
    type Agent = u64;

    fn agents(&self) -> Vec<u64> {
        self.bodies.keys().copied().collect()
    }
}

impl WorldMut for TestWorld {}

impl MemoryView for TestWorld {
    fn blackboard(&self, agent: u64) -> Option<&Blackboard<u64>> {
        self.bodies.get(&agent).map(|b| &b.blackboard)
    }

    fn events(&self, agent: u64) -> Option<&EventSet> {
        self.bodies.get(&agent).map(|b| &b.events)
    }
}

impl MemoryMut for TestWorld {
    fn blackboard_mut(&mut self, agent: u64) -> Option<&mut Blackboard<u64>> {
        self.bodies.get_mut(&agent).map(|b| &mut b.blackboard)
    }

    fn events_mut(&mut self, agent: u64) -> Option<&mut EventSet> {
        self.bodies.get_mut(&agent).map(|b| &mut b.events)
    }
}

impl GridView for TestWorld {
    fn position(&self, agent: u64) -> Option<IVec2> {
        self.bodies.get(&agent).map(|b| b.pos)
    }

    fn is_alive(&self, agent: u64) -> bool {
        self.bodies.get(&agent).is_some_and(|b| b.alive)
    }

    fn team(&self, agent: u64) -> Option<i32> {
        self.bodies.get(&agent).and_then(|b| b.team)
    }

    fn visibility(&self, agent: u64) -> Option<f32> {
        self.bodies.get(&agent).and_then(|b| b.visibility)
    }

    fn related(&self, agent: u64, relation: RelationId) -> Option<u64> {
        self.bodies
            .get(&agent)
            .and_then(|b| b.links.get(&relation).copied())
    }
}

impl GridMut for TestWorld {
    fn set_action(&mut self, agent: u64, action: GridAction) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.action = action;
        }
    }
}

pub fn ctx(turn: u64) -> TickContext {
    TickContext::new(turn, 7)
}

/// Instant leaves that record their label when executed.
#[derive(Clone)]
pub struct Recorder {
    log: Rc<RefCell<Vec<&'static str>>>,
    key: BbKey<i32>,
}

impl Recorder {
    pub fn new(world: &mut TestWorld) -> Self {
        Self {
            log: Rc::default(),
            key: world.names.key("recorder"),
        }
    }

    pub fn leaf(&self, label: &'static str, ok: bool) -> Node<TestWorld> {
        let log = Rc::clone(&self.log);
        calculate(
            move |_: &TestWorld, _, _| {
                log.borrow_mut().push(label);
                ok.then_some(1)
            },
            self.key,
        )
    }

    pub fn log(&self) -> Vec<&'static str> {
        self.log.borrow().clone()
    }

    pub fn count(&self, label: &str) -> usize {
        self.log.borrow().iter().filter(|l| **l == label).count()
    }
}
