use core::fmt::Debug;

/// Opaque handle for a simulated agent.
///
/// The host's component store owns agents; this crate only ever copies handles around, compares
/// them, and stores them in blackboards. Turn processing iterates agents in `Ord` order, and
/// `stable_id` seeds per-agent random streams, so both must be stable for the agent's lifetime.
pub trait AgentId: Copy + Ord + Eq + Debug + 'static {
    fn stable_id(self) -> u64;
}

macro_rules! impl_agent_id {
    ($($ty:ty),*) => {
        $(
            impl AgentId for $ty {
                fn stable_id(self) -> u64 {
                    self as u64
                }
            }
        )*
    };
}

impl_agent_id!(u64, u32, usize);
