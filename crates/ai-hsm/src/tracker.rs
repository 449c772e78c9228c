use std::collections::BTreeMap;
use std::fmt;

use ai_core::{AgentId, Interner, TickContext};
use ai_tools::{TraceEvent, TraceSink, Tracer};
use serde_yaml::Value;

use crate::{
    HsmConfig, HsmError, Machine, MachineId, MachineMut, MachineStates, MachineView, StateId,
    SubmachineEntry,
};

/// Compiled machines plus the per-turn transition pass.
///
/// `load` lowers a parsed description (`machine -> state -> [{target: expr}]`) into
/// [`Machine`]s; `add_sm_to_entity` attaches one (and every machine it composes) to an agent;
/// `run_transitions` is the transition phase of the turn.
#[derive(Default)]
pub struct StateMachineTracker {
    machines: BTreeMap<MachineId, Machine>,
    by_name: BTreeMap<String, MachineId>,
    config: HsmConfig,
    tracer: Tracer,
}

impl fmt::Debug for StateMachineTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachineTracker")
            .field("machines", &self.by_name.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .field("tracer", &self.tracer)
            .finish()
    }
}

impl StateMachineTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HsmConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Emit `hsm.transition` (agent, target state) for every fired transition into `sink`.
    pub fn with_trace(mut self, sink: impl TraceSink + 'static) -> Self {
        self.tracer = Tracer::new(sink);
        self
    }

    pub fn config(&self) -> HsmConfig {
        self.config
    }

    /// Compile every machine in `spec` that is not compiled yet, in declared order.
    ///
    /// Returns how many machines were added. Machines already loaded are skipped, so loading
    /// the same description twice is a no-op; machines without states are skipped with a
    /// warning. A sub-machine must be declared (or loaded) before the machine composing it.
    pub fn load(&mut self, spec: &Value, names: &mut Interner) -> Result<usize, HsmError> {
        let Value::Mapping(root) = spec else {
            return Err(HsmError::malformed(
                "<root>",
                "expected a map of machine names",
            ));
        };

        let mut added = 0;
        for (key, desc) in root {
            let Some(name) = key.as_str() else {
                return Err(HsmError::malformed("<root>", "machine names must be strings"));
            };
            if self.by_name.contains_key(name) {
                tracing::trace!(machine = name, "state machine already compiled");
                continue;
            }

            let desc = match desc {
                Value::Mapping(states) if !states.is_empty() => states,
                Value::Null | Value::Mapping(_) => {
                    tracing::warn!(machine = name, "skipping state machine without states");
                    continue;
                }
                _ => return Err(HsmError::malformed(name, "a machine is a map of states")),
            };

            let machine = Machine::compile(name, desc, &self.by_name, names)?;
            tracing::debug!(
                machine = name,
                states = machine.states().len(),
                transitions = machine.transition_count(),
                "compiled state machine"
            );
            self.by_name.insert(name.to_owned(), machine.id());
            self.machines.insert(machine.id(), machine);
            added += 1;
        }
        Ok(added)
    }

    pub fn machine(&self, name: &str) -> Option<&Machine> {
        self.by_name.get(name).and_then(|id| self.machines.get(id))
    }

    pub fn machine_by_id(&self, id: MachineId) -> Option<&Machine> {
        self.machines.get(&id)
    }

    pub fn machine_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_name.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// Total compiled transition rules across all machines.
    pub fn rule_count(&self) -> usize {
        self.machines.values().map(Machine::transition_count).sum()
    }

    /// Put `agent` into the initial state of machine `name`, attach every machine it composes
    /// (active only along the initial path), and track every event they read.
    ///
    /// An already attached machine keeps its current state. Its sub-machines are reconciled to
    /// that state: a machine composed by a state the parent is not in ends up inactive, even if it
    /// was attached on its own earlier.
    pub fn add_sm_to_entity<W>(
        &self,
        world: &mut W,
        agent: W::Agent,
        name: &str,
    ) -> Result<(), HsmError>
    where
        W: MachineMut,
    {
        let root = *self
            .by_name
            .get(name)
            .ok_or_else(|| HsmError::UnknownMachine {
                name: name.to_owned(),
            })?;

        let mut plan = Vec::new();
        {
            let states = world.machines(agent).ok_or(HsmError::MissingComponent {
                component: "machine state",
            })?;
            let active = !states.contains(root) || states.is_active(root);
            self.plan_attach(root, active, states, &mut plan);
        }

        let events = world
            .events_mut(agent)
            .ok_or(HsmError::MissingComponent {
                component: "event set",
            })?;
        for (id, _, _) in &plan {
            for event in self.machines[id].tracked_events() {
                events.track(*event);
            }
        }

        let states = world
            .machines_mut(agent)
            .ok_or(HsmError::MissingComponent {
                component: "machine state",
            })?;
        for (id, initial, active) in plan {
            if !states.contains(id) {
                states.attach(id, initial, active);
            } else if id != root && states.is_active(id) != active {
                tracing::debug!(
                    agent = ?agent,
                    machine = self.machines[&id].name(),
                    active,
                    "reconciled sub-machine activity"
                );
                states.set_active(id, active);
            }
        }
        tracing::debug!(agent = ?agent, machine = name, "attached state machine");
        Ok(())
    }

    fn plan_attach(
        &self,
        id: MachineId,
        active: bool,
        states: &MachineStates,
        plan: &mut Vec<(MachineId, StateId, bool)>,
    ) {
        if plan.iter().any(|(m, _, _)| *m == id) {
            return;
        }
        let machine = &self.machines[&id];
        let initial = machine.initial();
        let current = states.current(id).unwrap_or(initial);
        plan.push((id, initial, active));
        for (state, sub) in machine.submachines() {
            self.plan_attach(sub, active && state == current, states, plan);
        }
    }

    pub fn current_state<W>(&self, world: &W, agent: W::Agent, name: &str) -> Option<StateId>
    where
        W: MachineView,
    {
        let id = self.by_name.get(name)?;
        world.machines(agent)?.current(*id)
    }

    /// Transition phase: for every agent, evaluate each machine that was active when the pass
    /// reached the agent, in attach order, and fire the first matching transition out of its
    /// current state. Returns the number of transitions fired.
    pub fn run_transitions<W>(&mut self, ctx: &TickContext, world: &mut W) -> usize
    where
        W: MachineMut,
    {
        let mut fired = 0;
        for agent in world.agents() {
            fired += self.step_agent(ctx, world, agent);
        }
        fired
    }

    fn step_agent<W>(&mut self, ctx: &TickContext, world: &mut W, agent: W::Agent) -> usize
    where
        W: MachineMut,
    {
        let Some(events) = world.events(agent).cloned() else {
            return 0;
        };
        let Some(states) = world.machines_mut(agent) else {
            return 0;
        };

        let pass: Vec<MachineId> = states.active_machines().collect();
        let mut fired = 0;
        for id in pass {
            // A parent may have left the composing state earlier in this pass.
            if !states.is_active(id) {
                continue;
            }
            let (Some(machine), Some(from)) = (self.machines.get(&id), states.current(id)) else {
                continue;
            };
            let Some(transition) = machine.firing(from, &events) else {
                continue;
            };
            let to = transition.target;

            enter(&self.machines, self.config, states, machine, from, to);
            fired += 1;

            tracing::debug!(
                agent = ?agent,
                turn = ctx.turn,
                machine = machine.name(),
                from = state_name(machine, from),
                to = state_name(machine, to),
                "state transition"
            );
            self.tracer.emit_with(|| {
                TraceEvent::new(ctx.turn, "hsm.transition")
                    .with_a(agent.stable_id())
                    .with_b(to.0.index() as u64)
            });
        }
        fired
    }
}

fn state_name(machine: &Machine, state: StateId) -> &str {
    machine.state(state).map_or("?", |s| s.name.as_str())
}

fn enter(
    machines: &BTreeMap<MachineId, Machine>,
    config: HsmConfig,
    states: &mut MachineStates,
    machine: &Machine,
    from: StateId,
    to: StateId,
) {
    if let Some(sub) = machine.state(from).and_then(|s| s.submachine) {
        deactivate(machines, states, sub);
    }
    states.set_state(machine.id(), to);
    if let Some(sub) = machine.state(to).and_then(|s| s.submachine) {
        activate(machines, config, states, sub);
    }
}

fn composed_in_current(
    machines: &BTreeMap<MachineId, Machine>,
    states: &MachineStates,
    id: MachineId,
) -> Option<MachineId> {
    let machine = machines.get(&id)?;
    machine.state(states.current(id)?)?.submachine
}

fn deactivate(
    machines: &BTreeMap<MachineId, Machine>,
    states: &mut MachineStates,
    id: MachineId,
) {
    if !states.is_active(id) {
        return;
    }
    states.set_active(id, false);
    if let Some(sub) = composed_in_current(machines, states, id) {
        deactivate(machines, states, sub);
    }
}

fn activate(
    machines: &BTreeMap<MachineId, Machine>,
    config: HsmConfig,
    states: &mut MachineStates,
    id: MachineId,
) {
    let Some(machine) = machines.get(&id) else {
        return;
    };
    if states.contains(id) {
        if config.submachine_entry == SubmachineEntry::Reset {
            states.set_state(id, machine.initial());
        }
        states.set_active(id, true);
    } else {
        states.attach(id, machine.initial(), true);
    }

    if let Some(sub) = composed_in_current(machines, states, id) {
        activate(machines, config, states, sub);
    }
}
