//! Behavior tree runtime built on `ai-core`.
//!
//! Trees are declared once as immutable [`Node`] templates and instanced per agent with
//! [`BehTree::new`], which lays the template out in an arena. Nodes follow an
//! execute / cancel / signal protocol: `execute` either answers synchronously or suspends, and a
//! suspended node is only ever resumed through [`ActingNodes`] (once per turn) or
//! [`ReactingNodes`] (when an event fires).

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod bt;
pub mod config;
pub mod forest;
mod graph;
pub mod leaf;
pub mod node;
pub mod registry;
pub mod tree;

pub use bt::{BtStatus, Signal, TreeWorld};
pub use config::UtilityConfig;
pub use forest::Forest;
pub use graph::NodeId;
pub use leaf::{
    broadcast, calculate, fail, follow_link, get_closest, get_closest_ally, get_closest_enemy,
    move_to, move_to_position, move_to_visible, succeed, wait_event,
};
pub use node::{
    parallel, predicate, race, repeat, scored, select, sequence, utility_select,
    utility_select_with, Node, Scored,
};
pub use registry::{ActingNodes, ReactingNodes};
pub use tree::BehTree;
