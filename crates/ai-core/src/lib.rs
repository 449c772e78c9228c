//! Turn-based, engine-agnostic AI kernel primitives.
//!
//! Everything here is shared by the behavior tree runtime (`ai-bt`) and the state machine
//! compiler (`ai-hsm`): agent handles, the component traits a host world implements, per-agent
//! blackboards and event sets, and the phase schedule that hosts use to register their own rules.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod action;
pub mod agent;
pub mod blackboard;
pub mod events;
pub mod math;
pub mod names;
pub mod query;
pub mod rng;
pub mod schedule;
pub mod tick;
pub mod world;

pub use action::GridAction;
pub use agent::AgentId;
pub use blackboard::{BbKey, BbPool, BbValue, Blackboard};
pub use events::{EventId, EventSet};
pub use math::IVec2;
pub use names::{Interner, RelationId, Symbol};
pub use query::AgentQuery;
pub use rng::{DeterministicRng, SplitMix64};
pub use schedule::{Phase, Schedule};
pub use tick::TickContext;
pub use world::{clear_event_sets, GridMut, GridView, MemoryMut, MemoryView, WorldMut, WorldView};
