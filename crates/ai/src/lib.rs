//! Umbrella crate: re-exports the `ai-*` building blocks and wires them into one turn.
//!
//! A host owns the agents (through a component store implementing the `ai_core` world traits),
//! a [`TurnDriver`] holding every agent's behavior tree and the compiled state machines, and the
//! rules it registers per [`Phase`]. [`SimWorld`] is a ready-made in-memory store for tests,
//! demos and small games.
//!
//! ```
//! use ai::{SimWorld, TurnDriver, AgentRecord};
//! use ai::bt::wait_event;
//!
//! let mut world = SimWorld::new();
//! let alarm = world.names.event("alarm");
//! let guard = world.spawn(AgentRecord::at((0, 0)).with_team(1));
//!
//! let mut driver: TurnDriver<SimWorld> = TurnDriver::new(7);
//! driver.forest_mut().plant(guard, &wait_event(alarm));
//! driver.run_turn(&mut world);
//! assert!(driver.forest().get(guard).unwrap().is_running());
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod config;
pub mod sim;
pub mod turn;

pub use ai_bt as bt;
pub use ai_core as core;
pub use ai_hsm as hsm;
pub use ai_tools as tools;

pub use ai_core::{Phase, Schedule, TickContext};
pub use config::{AiConfig, ConfigError};
pub use sim::{AgentRecord, SimWorld};
pub use turn::{TurnDriver, TurnReport};
