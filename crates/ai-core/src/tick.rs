use crate::{rng, AgentId, SplitMix64};

/// Per-turn context handed to every phase of the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickContext {
    pub turn: u64,
    pub seed: u64,
}

impl TickContext {
    pub fn new(turn: u64, seed: u64) -> Self {
        Self { turn, seed }
    }

    /// Random stream for one agent in this turn. Distinct `stream`s are independent.
    pub fn rng_for_agent<A: AgentId>(&self, agent: A, stream: u64) -> SplitMix64 {
        let seed = rng::derive_seed(self.seed ^ rng::mix64(self.turn), agent.stable_id(), stream);
        SplitMix64::new(seed)
    }

    pub fn next(self) -> Self {
        Self {
            turn: self.turn.wrapping_add(1),
            seed: self.seed,
        }
    }
}
