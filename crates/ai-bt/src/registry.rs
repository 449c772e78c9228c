//! Wake-up registries for suspended nodes.
//!
//! Both hold arena handles, never references, so a node cancelled earlier in the same pass is
//! simply absent by the time the pass reaches it.

use std::collections::{BTreeMap, BTreeSet};

use ai_core::EventId;

use crate::NodeId;

/// Nodes that want a tick once per turn (movement in progress, repeat loops).
#[derive(Debug, Default, Clone)]
pub struct ActingNodes {
    nodes: BTreeSet<NodeId>,
}

impl ActingNodes {
    pub fn register(&mut self, node: NodeId) {
        let inserted = self.nodes.insert(node);
        assert!(inserted, "{node:?} registered twice in ActingNodes");
    }

    pub fn deregister(&mut self, node: NodeId) {
        let removed = self.nodes.remove(&node);
        assert!(removed, "{node:?} is not registered in ActingNodes");
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// Registered nodes in arena order, copied so the caller may mutate the registry while
    /// walking them.
    pub fn snapshot(&self) -> Vec<NodeId> {
        self.nodes.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Nodes waiting for an event, keyed by event. Several waiters may share one event.
#[derive(Debug, Default, Clone)]
pub struct ReactingNodes {
    waiters: BTreeMap<EventId, Vec<NodeId>>,
}

impl ReactingNodes {
    pub fn register(&mut self, event: EventId, node: NodeId) {
        let waiters = self.waiters.entry(event).or_default();
        assert!(
            !waiters.contains(&node),
            "{node:?} registered twice in ReactingNodes for {event:?}"
        );
        waiters.push(node);
    }

    pub fn deregister(&mut self, event: EventId, node: NodeId) {
        let Some(waiters) = self.waiters.get_mut(&event) else {
            panic!("{node:?} is not waiting on {event:?}");
        };
        let Some(pos) = waiters.iter().position(|n| *n == node) else {
            panic!("{node:?} is not waiting on {event:?}");
        };
        waiters.remove(pos);
        if waiters.is_empty() {
            self.waiters.remove(&event);
        }
    }

    pub fn contains(&self, event: EventId, node: NodeId) -> bool {
        self.waiters
            .get(&event)
            .is_some_and(|waiters| waiters.contains(&node))
    }

    /// Waiters on `event` in registration order.
    pub fn waiting_on(&self, event: EventId) -> &[NodeId] {
        self.waiters.get(&event).map_or(&[], Vec::as_slice)
    }

    pub fn events(&self) -> impl Iterator<Item = EventId> + '_ {
        self.waiters.keys().copied()
    }

    /// Total registrations across all events.
    pub fn len(&self) -> usize {
        self.waiters.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}
