use std::collections::{BTreeMap, BTreeSet};

use ai_core::{EventId, EventSet, Interner, Symbol};
use serde_yaml::{Mapping, Value};

use crate::{EventExpr, HsmError};

/// Interned machine name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MachineId(pub Symbol);

/// Interned state name. State names are global: two machines may share a state name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(pub Symbol);

impl MachineId {
    pub fn intern(names: &mut Interner, name: &str) -> Self {
        MachineId(names.intern(name))
    }
}

impl StateId {
    pub fn intern(names: &mut Interner, name: &str) -> Self {
        StateId(names.intern(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub target: StateId,
    pub when: EventExpr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub id: StateId,
    pub name: String,
    /// Machine composed into this state: active exactly while the parent is in this state.
    pub submachine: Option<MachineId>,
    /// Outgoing transitions in declared order.
    pub transitions: Vec<Transition>,
}

/// One compiled machine. The first declared state is the initial state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    id: MachineId,
    name: String,
    states: Vec<State>,
    tracked: BTreeSet<EventId>,
}

impl Machine {
    pub fn id(&self) -> MachineId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initial(&self) -> StateId {
        self.states[0].id
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.iter().find(|s| s.id == id)
    }

    /// Events referenced by any of this machine's own transitions.
    pub fn tracked_events(&self) -> &BTreeSet<EventId> {
        &self.tracked
    }

    pub fn transition_count(&self) -> usize {
        self.states.iter().map(|s| s.transitions.len()).sum()
    }

    /// Machines composed directly into one of this machine's states.
    pub fn submachines(&self) -> impl Iterator<Item = (StateId, MachineId)> + '_ {
        self.states
            .iter()
            .filter_map(|s| s.submachine.map(|sub| (s.id, sub)))
    }

    /// First transition out of `from` whose expression holds, in declared order.
    pub fn firing(&self, from: StateId, events: &EventSet) -> Option<&Transition> {
        self.state(from)?
            .transitions
            .iter()
            .find(|t| t.when.eval(events))
    }

    /// Compile one machine description: `state -> [ {target: expr}, ... ]`.
    ///
    /// `known` lists the machines compiled so far; a state naming one of them composes it.
    pub(crate) fn compile(
        name: &str,
        desc: &Mapping,
        known: &BTreeMap<String, MachineId>,
        names: &mut Interner,
    ) -> Result<Self, HsmError> {
        let id = MachineId::intern(names, name);

        let mut states = Vec::with_capacity(desc.len());
        let mut tracked = BTreeSet::new();
        for (key, body) in desc {
            let Some(state_name) = key.as_str() else {
                return Err(HsmError::malformed(name, "state names must be strings"));
            };
            let path = format!("{name}.{state_name}");

            let (explicit, transitions) = split_state(body, &path)?;
            let submachine = match explicit {
                Some(sub) if sub == name => {
                    return Err(HsmError::SelfReference {
                        machine: name.to_owned(),
                    })
                }
                Some(sub) => Some(*known.get(sub).ok_or_else(|| HsmError::UnknownMachine {
                    name: sub.to_owned(),
                })?),
                None => known.get(state_name).copied(),
            };

            let mut compiled = Vec::with_capacity(transitions.len());
            for (i, item) in transitions.iter().enumerate() {
                let item_path = format!("{path}[{i}]");
                let (target, when) = single_entry(item, &item_path)?;
                let when = EventExpr::parse_at(when, names, &item_path)?;
                tracked.extend(when.events());
                compiled.push((target.to_owned(), when));
            }

            states.push((
                State {
                    id: StateId::intern(names, state_name),
                    name: state_name.to_owned(),
                    submachine,
                    transitions: Vec::new(),
                },
                compiled,
            ));
        }

        if states.is_empty() {
            return Err(HsmError::malformed(name, "a machine needs at least one state"));
        }

        // Targets are resolved once every state of the machine is declared.
        let declared: BTreeSet<&str> = states.iter().map(|(s, _)| s.name.as_str()).collect();
        for (_, pending) in &states {
            let unknown = pending.iter().find(|(t, _)| !declared.contains(t.as_str()));
            if let Some((target, _)) = unknown {
                return Err(HsmError::UnknownState {
                    machine: name.to_owned(),
                    state: target.clone(),
                });
            }
        }
        let states = states
            .into_iter()
            .map(|(mut state, pending)| {
                state.transitions = pending
                    .into_iter()
                    .map(|(target, when)| Transition {
                        target: StateId::intern(names, &target),
                        when,
                    })
                    .collect();
                state
            })
            .collect();

        Ok(Machine {
            id,
            name: name.to_owned(),
            states,
            tracked,
        })
    }
}

/// Split a state body into its explicit sub-machine (if any) and its transition list.
fn split_state<'v>(
    body: &'v Value,
    path: &str,
) -> Result<(Option<&'v str>, &'v [Value]), HsmError> {
    match body {
        Value::Null => Ok((None, &[] as &[Value])),
        Value::Sequence(items) => Ok((None, items.as_slice())),
        Value::Mapping(map) => {
            let Some(sub) = map.get("submachine") else {
                return Err(HsmError::malformed(
                    path,
                    "state maps must name a `submachine`",
                ));
            };
            let Some(sub) = sub.as_str() else {
                return Err(HsmError::malformed(path, "`submachine` must be a machine name"));
            };
            if let Some(key) = map
                .keys()
                .filter_map(Value::as_str)
                .find(|k| !matches!(*k, "submachine" | "transitions"))
            {
                return Err(HsmError::malformed(path, format!("unexpected key `{key}`")));
            }
            match map.get("transitions") {
                None | Some(Value::Null) => Ok((Some(sub), &[] as &[Value])),
                Some(Value::Sequence(items)) => Ok((Some(sub), items.as_slice())),
                Some(_) => Err(HsmError::malformed(path, "`transitions` must be a sequence")),
            }
        }
        _ => Err(HsmError::malformed(
            path,
            "a state is a transition list, null, or a sub-machine map",
        )),
    }
}

fn single_entry<'v>(item: &'v Value, path: &str) -> Result<(&'v str, &'v Value), HsmError> {
    let Value::Mapping(map) = item else {
        return Err(HsmError::malformed(path, "transitions are `{target: expr}` maps"));
    };
    let mut entries = map.iter();
    let (Some((target, when)), None) = (entries.next(), entries.next()) else {
        return Err(HsmError::malformed(path, "a transition has exactly one target"));
    };
    let Some(target) = target.as_str() else {
        return Err(HsmError::malformed(path, "target state must be a string"));
    };
    Ok((target, when))
}
