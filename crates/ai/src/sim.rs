//! In-memory component store implementing every world trait the runtime needs.

use std::collections::{BTreeMap, BTreeSet};

use ai_core::{
    Blackboard, EventId, EventSet, GridAction, GridMut, GridView, IVec2, Interner, MemoryMut,
    MemoryView, RelationId, WorldMut, WorldView,
};
use ai_hsm::{MachineMut, MachineStates, MachineView};

/// Every component one simulated agent carries.
#[derive(Debug, Default, Clone)]
pub struct AgentRecord {
    pub position: IVec2,
    pub team: Option<i32>,
    /// Sight radius; `None` sees everything.
    pub visibility: Option<f32>,
    pub alive: bool,
    pub action: GridAction,
    pub tags: BTreeSet<String>,
    pub links: BTreeMap<RelationId, u64>,
    pub blackboard: Blackboard<u64>,
    pub events: EventSet,
    pub machines: MachineStates,
}

impl AgentRecord {
    /// A live agent at `position` with no team.
    pub fn at(position: impl Into<IVec2>) -> Self {
        Self {
            position: position.into(),
            alive: true,
            ..Self::default()
        }
    }

    pub fn with_team(mut self, team: i32) -> Self {
        self.team = Some(team);
        self
    }

    pub fn with_visibility(mut self, radius: f32) -> Self {
        self.visibility = Some(radius);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }
}

/// BTreeMap-backed world. Agent handles are `u64`s handed out in spawn order and never reused.
#[derive(Debug, Default)]
pub struct SimWorld {
    records: BTreeMap<u64, AgentRecord>,
    next_id: u64,
    pub names: Interner,
}

impl SimWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, record: AgentRecord) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.records.insert(id, record);
        tracing::trace!(agent = id, "spawned agent");
        id
    }

    /// Remove an agent and every component it had.
    pub fn despawn(&mut self, agent: u64) -> Option<AgentRecord> {
        self.records.remove(&agent)
    }

    /// Mark an agent dead. Dead agents keep their components until despawned.
    pub fn kill(&mut self, agent: u64) {
        if let Some(record) = self.records.get_mut(&agent) {
            record.alive = false;
        }
    }

    pub fn record(&self, agent: u64) -> Option<&AgentRecord> {
        self.records.get(&agent)
    }

    pub fn record_mut(&mut self, agent: u64) -> Option<&mut AgentRecord> {
        self.records.get_mut(&agent)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Agents carrying `tag`, in handle order.
    pub fn tagged(&self, tag: &str) -> Vec<u64> {
        self.records
            .iter()
            .filter(|(_, r)| r.tags.contains(tag))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn fire(&mut self, agent: u64, event: EventId) {
        if let Some(record) = self.records.get_mut(&agent) {
            record.events.fire(event);
        }
    }

    pub fn link(&mut self, agent: u64, relation: RelationId, target: u64) {
        if let Some(record) = self.records.get_mut(&agent) {
            record.links.insert(relation, target);
        }
    }

    /// Resolve this turn's intended actions: every live agent steps by its action, which then
    /// resets to `Nop`. The grid is unbounded and agents may share a cell.
    pub fn apply_actions(&mut self) {
        for record in self.records.values_mut() {
            if record.alive {
                record.position = record.position + record.action.offset();
            }
            record.action = GridAction::Nop;
        }
    }
}

impl WorldView for SimWorld {
    type Agent = u64;

    fn agents(&self) -> Vec<u64> {
        self.records.keys().copied().collect()
    }
}

impl WorldMut for SimWorld {}

impl MemoryView for SimWorld {
    fn blackboard(&self, agent: u64) -> Option<&Blackboard<u64>> {
        self.records.get(&agent).map(|r| &r.blackboard)
    }

    fn events(&self, agent: u64) -> Option<&EventSet> {
        self.records.get(&agent).map(|r| &r.events)
    }
}

impl MemoryMut for SimWorld {
    fn blackboard_mut(&mut self, agent: u64) -> Option<&mut Blackboard<u64>> {
        self.records.get_mut(&agent).map(|r| &mut r.blackboard)
    }

    fn events_mut(&mut self, agent: u64) -> Option<&mut EventSet> {
        self.records.get_mut(&agent).map(|r| &mut r.events)
    }
}

impl GridView for SimWorld {
    fn position(&self, agent: u64) -> Option<IVec2> {
        self.records.get(&agent).map(|r| r.position)
    }

    fn is_alive(&self, agent: u64) -> bool {
        self.records.get(&agent).is_some_and(|r| r.alive)
    }

    fn team(&self, agent: u64) -> Option<i32> {
        self.records.get(&agent).and_then(|r| r.team)
    }

    fn visibility(&self, agent: u64) -> Option<f32> {
        self.records.get(&agent).and_then(|r| r.visibility)
    }

    fn related(&self, agent: u64, relation: RelationId) -> Option<u64> {
        self.records
            .get(&agent)
            .and_then(|r| r.links.get(&relation).copied())
    }
}

impl GridMut for SimWorld {
    fn set_action(&mut self, agent: u64, action: GridAction) {
        if let Some(record) = self.records.get_mut(&agent) {
            record.action = action;
        }
    }
}

impl MachineView for SimWorld {
    fn machines(&self, agent: u64) -> Option<&MachineStates> {
        self.records.get(&agent).map(|r| &r.machines)
    }
}

impl MachineMut for SimWorld {
    fn machines_mut(&mut self, agent: u64) -> Option<&mut MachineStates> {
        self.records.get_mut(&agent).map(|r| &mut r.machines)
    }
}
