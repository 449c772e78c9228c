//! Boolean formulas over the events fired this turn.
//!
//! Written in a machine description as a bare event name, `{not: expr}`, `{and: [expr, ...]}` or
//! `{or: [expr, ...]}`, nested freely.

use std::collections::BTreeSet;

use ai_core::{EventId, EventSet, Interner};
use serde_yaml::Value;

use crate::HsmError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventExpr {
    Event(EventId),
    Not(Box<EventExpr>),
    /// True when every operand is; an empty `and` is true.
    And(Vec<EventExpr>),
    /// True when any operand is; an empty `or` is false.
    Or(Vec<EventExpr>),
}

impl EventExpr {
    /// Parse an already-decoded expression, interning every event name it mentions.
    pub fn parse(value: &Value, names: &mut Interner) -> Result<Self, HsmError> {
        Self::parse_at(value, names, "expr")
    }

    pub(crate) fn parse_at(
        value: &Value,
        names: &mut Interner,
        path: &str,
    ) -> Result<Self, HsmError> {
        match value {
            Value::String(name) => Ok(EventExpr::Event(names.event(name))),
            Value::Mapping(map) => {
                let mut entries = map.iter();
                let (Some((op, operand)), None) = (entries.next(), entries.next()) else {
                    return Err(HsmError::expression(
                        path,
                        "operator maps take exactly one key",
                    ));
                };
                let Some(op) = op.as_str() else {
                    return Err(HsmError::expression(path, "operator must be a string"));
                };
                let path = format!("{path}.{op}");
                match op {
                    "not" => Ok(EventExpr::Not(Box::new(Self::parse_at(
                        operand, names, &path,
                    )?))),
                    "and" | "or" => {
                        let Value::Sequence(items) = operand else {
                            return Err(HsmError::expression(
                                path,
                                format!("`{op}` takes a sequence of operands"),
                            ));
                        };
                        let operands = items
                            .iter()
                            .enumerate()
                            .map(|(i, item)| Self::parse_at(item, names, &format!("{path}[{i}]")))
                            .collect::<Result<Vec<_>, _>>()?;
                        Ok(if op == "and" {
                            EventExpr::And(operands)
                        } else {
                            EventExpr::Or(operands)
                        })
                    }
                    other => Err(HsmError::expression(
                        path.clone(),
                        format!("unknown operator `{other}`"),
                    )),
                }
            }
            Value::Tagged(tagged) => Self::parse_at(&tagged.value, names, path),
            _ => Err(HsmError::expression(
                path,
                "expected an event name or an operator map",
            )),
        }
    }

    pub fn eval(&self, events: &EventSet) -> bool {
        match self {
            EventExpr::Event(event) => events.contains(*event),
            EventExpr::Not(inner) => !inner.eval(events),
            EventExpr::And(operands) => operands.iter().all(|op| op.eval(events)),
            EventExpr::Or(operands) => operands.iter().any(|op| op.eval(events)),
        }
    }

    /// Every event this expression reads.
    pub fn events(&self) -> BTreeSet<EventId> {
        let mut out = BTreeSet::new();
        self.collect_events(&mut out);
        out
    }

    fn collect_events(&self, out: &mut BTreeSet<EventId>) {
        match self {
            EventExpr::Event(event) => {
                out.insert(*event);
            }
            EventExpr::Not(inner) => inner.collect_events(out),
            EventExpr::And(operands) | EventExpr::Or(operands) => {
                for op in operands {
                    op.collect_events(out);
                }
            }
        }
    }
}
