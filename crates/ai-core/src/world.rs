//! Component-store boundary.
//!
//! The core crates never own agents or their components; the host's entity/component store does.
//! These traits are the narrow surface the runtime needs from it. Subsystems layer extension
//! traits on top of [`WorldView`] instead of growing it.

use crate::{AgentId, Blackboard, EventSet, GridAction, IVec2, RelationId};

/// Read-only world access.
pub trait WorldView {
    type Agent: AgentId;

    /// Every live agent, in ascending handle order.
    fn agents(&self) -> Vec<Self::Agent>;
}

/// Write access / effect sink.
pub trait WorldMut: WorldView {}

/// Per-agent memory components: the blackboard and this turn's event set.
pub trait MemoryView: WorldView {
    fn blackboard(&self, agent: Self::Agent) -> Option<&Blackboard<Self::Agent>>;
    fn events(&self, agent: Self::Agent) -> Option<&EventSet>;
}

pub trait MemoryMut: WorldMut + MemoryView {
    fn blackboard_mut(&mut self, agent: Self::Agent) -> Option<&mut Blackboard<Self::Agent>>;
    fn events_mut(&mut self, agent: Self::Agent) -> Option<&mut EventSet>;
}

/// Spatial and social components used by the movement and targeting leaves.
pub trait GridView: WorldView {
    fn position(&self, agent: Self::Agent) -> Option<IVec2>;

    fn is_alive(&self, agent: Self::Agent) -> bool;

    fn team(&self, agent: Self::Agent) -> Option<i32>;

    /// Visibility radius. `None` means the agent is not limited by sight.
    fn visibility(&self, agent: Self::Agent) -> Option<f32>;

    /// Target of `agent`'s `relation` link, if any.
    fn related(&self, agent: Self::Agent, relation: RelationId) -> Option<Self::Agent>;
}

pub trait GridMut: WorldMut + GridView {
    /// Overwrite the agent's intended action for this turn.
    fn set_action(&mut self, agent: Self::Agent, action: GridAction);
}

/// Turn-boundary cleanup: drop every agent's fired events.
pub fn clear_event_sets<W: MemoryMut>(world: &mut W) {
    for agent in world.agents() {
        if let Some(events) = world.events_mut(agent) {
            events.clear();
        }
    }
}
