//! Deterministic RNG helpers.
//!
//! Small and dependency-free; **not** cryptographic. Used for utility-weighted selection so that
//! a given seed replays the same choices.

pub trait DeterministicRng {
    fn next_u64(&mut self) -> u64;

    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Uniform float in `[0, 1)` built from 24 mantissa bits.
    fn next_f32_unit(&mut self) -> f32 {
        let x = self.next_u32() >> 8;
        (x as f32) / ((1u32 << 24) as f32)
    }

    /// Draw an index with probability proportional to its weight.
    ///
    /// Negative and NaN weights count as zero. Returns `None` if nothing has positive weight.
    fn pick_weighted(&mut self, weights: &[f32]) -> Option<usize> {
        let clean = |w: f32| if w.is_nan() || w < 0.0 { 0.0 } else { w };
        let total: f32 = weights.iter().copied().map(clean).sum();
        if total <= 0.0 {
            return None;
        }

        let mut roll = self.next_f32_unit() * total;
        let mut last = None;
        for (i, w) in weights.iter().copied().map(clean).enumerate() {
            if w <= 0.0 {
                continue;
            }
            if roll < w {
                return Some(i);
            }
            roll -= w;
            last = Some(i);
        }
        // Float rounding can leave a sliver past the final bucket.
        last
    }
}

/// SplitMix64: good seeding RNG and small deterministic generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }
}

impl DeterministicRng for SplitMix64 {
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E3779B97F4A7C15);
        mix64(self.state)
    }
}

pub fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58476D1CE4E5B9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94D049BB133111EB);
    x ^ (x >> 31)
}

pub fn derive_seed(global_seed: u64, agent_id: u64, stream: u64) -> u64 {
    let x = global_seed ^ mix64(agent_id.wrapping_add(0x9E3779B97F4A7C15)) ^ mix64(stream);
    mix64(x)
}
