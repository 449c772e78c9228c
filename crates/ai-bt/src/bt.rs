use ai_core::{GridMut, MemoryMut};

/// Status of a tree as seen by whoever drives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BtStatus {
    Running,
    Success,
    Failure,
}

/// Terminal signal of a node: exactly one is delivered per `execute`, unless the node is
/// cancelled first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Success,
    Failure,
}

impl From<Signal> for BtStatus {
    fn from(signal: Signal) -> Self {
        match signal {
            Signal::Success => BtStatus::Success,
            Signal::Failure => BtStatus::Failure,
        }
    }
}

impl From<Option<Signal>> for BtStatus {
    fn from(signal: Option<Signal>) -> Self {
        signal.map_or(BtStatus::Running, BtStatus::from)
    }
}

/// Everything a tree needs from the host: grid components for the movement and targeting leaves
/// and per-agent memory (blackboard and event set).
pub trait TreeWorld: GridMut + MemoryMut + 'static {}

impl<W> TreeWorld for W where W: GridMut + MemoryMut + 'static {}
