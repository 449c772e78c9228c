#![allow(dead_code)]

use std::collections::BTreeMap;

use ai_core::{
    Blackboard, EventSet, Interner, MemoryMut, MemoryView, TickContext, WorldMut, WorldView,
};
use ai_hsm::{MachineMut, MachineStates, MachineView, StateId, StateMachineTracker};
use serde_yaml::Value;

#[derive(Debug, Default)]
pub struct Record {
    pub blackboard: Blackboard<u64>,
    pub events: EventSet,
    pub machines: MachineStates,
}

#[derive(Debug, Default)]
pub struct MachineWorld {
    pub records: BTreeMap<u64, Record>,
    pub names: Interner,
}

impl MachineWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, agent: u64) {
        self.records.entry(agent).or_default();
    }

    pub fn fire(&mut self, agent: u64, event: &str) {
        let event = self.names.event(event);
        self.records
            .get_mut(&agent)
            .expect("unknown agent")
            .events
            .fire(event);
    }

    pub fn clear_events(&mut self) {
        ai_core::clear_event_sets(self);
    }

    pub fn state(&mut self, name: &str) -> StateId {
        StateId::intern(&mut self.names, name)
    }

    pub fn states(&self, agent: u64) -> &MachineStates {
        &self.records[&agent].machines
    }

    /// Name of the state `agent` is in for machine `machine`.
    pub fn current(&self, tracker: &StateMachineTracker, agent: u64, machine: &str) -> String {
        let state = tracker
            .current_state(self, agent, machine)
            .expect("machine not attached");
        self.names
            .resolve(state.0)
            .expect("state not interned")
            .to_owned()
    }
}

impl WorldView for MachineWorld {
    type Agent = u64;

    fn agents(&self) -> Vec<u64> {
        self.records.keys().copied().collect()
    }
}

impl WorldMut for MachineWorld {}

impl MemoryView for MachineWorld {
    fn blackboard(&self, agent: u64) -> Option<&Blackboard<u64>> {
        self.records.get(&agent).map(|r| &r.blackboard)
    }

    fn events(&self, agent: u64) -> Option<&EventSet> {
        self.records.get(&agent).map(|r| &r.events)
    }
}

impl MemoryMut for MachineWorld {
    fn blackboard_mut(&mut self, agent: u64) -> Option<&mut Blackboard<u64>> {
        self.records.get_mut(&agent).map(|r| &mut r.blackboard)
    }

    fn events_mut(&mut self, agent: u64) -> Option<&mut EventSet> {
        self.records.get_mut(&agent).map(|r| &mut r.events)
    }
}

impl MachineView for MachineWorld {
    fn machines(&self, agent: u64) -> Option<&MachineStates> {
        self.records.get(&agent).map(|r| &r.machines)
    }
}

impl MachineMut for MachineWorld {
    fn machines_mut(&mut self, agent: u64) -> Option<&mut MachineStates> {
        self.records.get_mut(&agent).map(|r| &mut r.machines)
    }
}

pub fn yaml(src: &str) -> Value {
    serde_yaml::from_str(src).expect("test yaml")
}

pub fn ctx(turn: u64) -> TickContext {
    TickContext::new(turn, 11)
}

/// One transition phase followed by the turn-boundary cleanup.
pub fn turn(tracker: &mut StateMachineTracker, world: &mut MachineWorld, turn: u64) -> usize {
    let fired = tracker.run_transitions(&ctx(turn), world);
    world.clear_events();
    fired
}
