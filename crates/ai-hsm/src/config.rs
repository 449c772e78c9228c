#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What happens to a sub-machine's own state when its parent re-enters the composing state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum SubmachineEntry {
    /// Resume where the sub-machine was when its parent left.
    #[default]
    Preserve,
    /// Restart from the sub-machine's initial state.
    Reset,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct HsmConfig {
    pub submachine_entry: SubmachineEntry,
}
