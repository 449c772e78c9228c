use std::collections::BTreeSet;

use crate::Symbol;

/// Interned event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub Symbol);

/// Events that fired for one agent during the current turn.
///
/// Dispatch rules write it, tree reactions and state machine transitions read it, and the
/// turn-boundary cleanup clears it exactly once per turn. The tracked set is long-lived: it
/// records which events anything attached to this agent can react to, so dispatch rules can skip
/// agents that would never observe an event.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EventSet {
    fired: BTreeSet<EventId>,
    tracked: BTreeSet<EventId>,
}

impl EventSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire(&mut self, event: EventId) {
        self.fired.insert(event);
    }

    pub fn contains(&self, event: EventId) -> bool {
        self.fired.contains(&event)
    }

    pub fn iter(&self) -> impl Iterator<Item = EventId> + '_ {
        self.fired.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }

    /// Drop this turn's events. Tracking is left untouched.
    pub fn clear(&mut self) {
        self.fired.clear();
    }

    pub fn track(&mut self, event: EventId) {
        self.tracked.insert(event);
    }

    pub fn is_tracked(&self, event: EventId) -> bool {
        self.tracked.contains(&event)
    }

    pub fn tracked(&self) -> impl Iterator<Item = EventId> + '_ {
        self.tracked.iter().copied()
    }
}
