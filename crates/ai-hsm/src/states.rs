use std::collections::BTreeMap;

use ai_core::{MemoryMut, MemoryView};

use crate::{MachineId, StateId};

/// Where one agent is in one attached machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineState {
    pub state: StateId,
    /// Sub-machines are only active while their parent is in the composing state.
    pub active: bool,
}

/// Per-agent machine component: exactly one current state per attached machine.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MachineStates {
    entries: BTreeMap<MachineId, MachineState>,
    order: Vec<MachineId>,
}

impl MachineStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, machine: MachineId) -> bool {
        self.entries.contains_key(&machine)
    }

    pub fn get(&self, machine: MachineId) -> Option<MachineState> {
        self.entries.get(&machine).copied()
    }

    pub fn current(&self, machine: MachineId) -> Option<StateId> {
        self.get(machine).map(|m| m.state)
    }

    pub fn is_active(&self, machine: MachineId) -> bool {
        self.get(machine).is_some_and(|m| m.active)
    }

    /// Whether any active machine is currently in `state`.
    pub fn is_in(&self, state: StateId) -> bool {
        self.entries.values().any(|m| m.active && m.state == state)
    }

    /// Attached machines in attach order.
    pub fn machines(&self) -> impl Iterator<Item = MachineId> + '_ {
        self.order.iter().copied()
    }

    pub fn active_machines(&self) -> impl Iterator<Item = MachineId> + '_ {
        self.machines().filter(|m| self.is_active(*m))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(crate) fn attach(&mut self, machine: MachineId, state: StateId, active: bool) {
        let previous = self
            .entries
            .insert(machine, MachineState { state, active });
        assert!(previous.is_none(), "{machine:?} attached twice");
        self.order.push(machine);
    }

    pub(crate) fn set_state(&mut self, machine: MachineId, state: StateId) {
        self.entry(machine).state = state;
    }

    pub(crate) fn set_active(&mut self, machine: MachineId, active: bool) {
        self.entry(machine).active = active;
    }

    fn entry(&mut self, machine: MachineId) -> &mut MachineState {
        self.entries
            .get_mut(&machine)
            .unwrap_or_else(|| panic!("{machine:?} is not attached"))
    }
}

/// Read access to agents' machine components.
pub trait MachineView: MemoryView {
    fn machines(&self, agent: Self::Agent) -> Option<&MachineStates>;
}

pub trait MachineMut: MachineView + MemoryMut {
    fn machines_mut(&mut self, agent: Self::Agent) -> Option<&mut MachineStates>;
}
