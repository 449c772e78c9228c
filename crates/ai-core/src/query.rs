use std::fmt;
use std::rc::Rc;

use crate::WorldView;

type Filter<W> = Rc<dyn Fn(&W, <W as WorldView>::Agent) -> bool>;

/// Candidate filter over the world's agents ("everything with a team", "every bear", ...).
///
/// Queries are immutable and cheap to clone, so tree templates can carry them into every
/// per-agent instance.
pub struct AgentQuery<W: WorldView> {
    filter: Filter<W>,
}

impl<W: WorldView> Clone for AgentQuery<W> {
    fn clone(&self) -> Self {
        Self {
            filter: Rc::clone(&self.filter),
        }
    }
}

impl<W: WorldView> fmt::Debug for AgentQuery<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentQuery").finish_non_exhaustive()
    }
}

impl<W: WorldView + 'static> AgentQuery<W> {
    pub fn new(filter: impl Fn(&W, W::Agent) -> bool + 'static) -> Self {
        Self {
            filter: Rc::new(filter),
        }
    }

    pub fn all() -> Self {
        Self::new(|_, _| true)
    }

    /// Narrow this query with another condition.
    pub fn and(self, filter: impl Fn(&W, W::Agent) -> bool + 'static) -> Self {
        let first = self.filter;
        Self::new(move |world, agent| first(world, agent) && filter(world, agent))
    }
}

impl<W: WorldView> AgentQuery<W> {
    pub fn matches(&self, world: &W, agent: W::Agent) -> bool {
        (self.filter)(world, agent)
    }

    /// Matching agents in ascending handle order.
    pub fn matching(&self, world: &W) -> Vec<W::Agent> {
        let mut agents: Vec<_> = world
            .agents()
            .into_iter()
            .filter(|a| self.matches(world, *a))
            .collect();
        agents.sort();
        agents
    }
}
