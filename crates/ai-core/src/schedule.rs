use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::TickContext;

/// Phases of one simulated turn, in execution order.
///
/// The runtime does its own work inside `EventReaction`, `Acting`, `Transition` and `Cleanup`;
/// host rules registered for a phase run before the runtime's share of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// World observations become per-agent events.
    EventDispatch,
    /// Suspended nodes waiting on fired events are woken.
    EventReaction,
    /// Idle trees restart and per-turn actors tick.
    Acting,
    /// State machine transition rules.
    Transition,
    /// Rules keyed on the current state tag decide or override the intended action.
    StateReaction,
    /// Event sets are cleared.
    Cleanup,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::EventDispatch,
        Phase::EventReaction,
        Phase::Acting,
        Phase::Transition,
        Phase::StateReaction,
        Phase::Cleanup,
    ];
}

type System<W> = Box<dyn FnMut(&TickContext, &mut W)>;

struct NamedSystem<W> {
    name: Cow<'static, str>,
    run: System<W>,
}

/// Host rules grouped by phase.
pub struct Schedule<W> {
    phases: BTreeMap<Phase, Vec<NamedSystem<W>>>,
}

impl<W> Default for Schedule<W> {
    fn default() -> Self {
        Self {
            phases: BTreeMap::new(),
        }
    }
}

impl<W> Schedule<W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule. Rules within a phase run in registration order.
    pub fn add_system(
        &mut self,
        phase: Phase,
        name: impl Into<Cow<'static, str>>,
        system: impl FnMut(&TickContext, &mut W) + 'static,
    ) -> &mut Self {
        self.phases.entry(phase).or_default().push(NamedSystem {
            name: name.into(),
            run: Box::new(system),
        });
        self
    }

    pub fn run_phase(&mut self, phase: Phase, ctx: &TickContext, world: &mut W) {
        let Some(systems) = self.phases.get_mut(&phase) else {
            return;
        };
        for system in systems.iter_mut() {
            tracing::trace!(turn = ctx.turn, ?phase, system = %system.name, "run system");
            (system.run)(ctx, world);
        }
    }

    pub fn system_names(&self, phase: Phase) -> Vec<&str> {
        self.phases
            .get(&phase)
            .map(|systems| systems.iter().map(|s| s.name.as_ref()).collect())
            .unwrap_or_default()
    }
}
