//! Declarative hierarchical state machines for turn-based agents.
//!
//! Machines are described by an already-parsed YAML tree:
//!
//! ```yaml
//! patrol:
//!   walk: [ {chase: enemy_seen} ]
//!   chase: [ {walk: {not: enemy_seen}} ]
//! monster:
//!   patrol: [ {flee: {and: [hp_low, enemy_seen]}} ]
//!   flee: [ {patrol: {not: enemy_seen}} ]
//! ```
//!
//! Each machine compiles into transition rules over the agent's [`ai_core::EventSet`]. A state
//! named after an already-compiled machine (`monster.patrol` above) composes that machine: it is
//! active only while its parent is in the composing state.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod expr;
pub mod machine;
pub mod states;
pub mod tracker;

pub use config::{HsmConfig, SubmachineEntry};
pub use error::HsmError;
pub use expr::EventExpr;
pub use machine::{Machine, MachineId, State, StateId, Transition};
pub use states::{MachineMut, MachineState, MachineStates, MachineView};
pub use tracker::StateMachineTracker;
