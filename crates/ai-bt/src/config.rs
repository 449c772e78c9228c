#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tuning for utility-weighted selection.
///
/// A child's draw weight is `max(utility - bias, 0)`. Every attempt adds `bias_increase` to the
/// attempted child's bias (capped at `max_bias`), and every execution of the selector first
/// decays all biases by `bias_decay`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct UtilityConfig {
    pub bias_increase: f32,
    pub bias_decay: f32,
    pub max_bias: f32,
}

impl Default for UtilityConfig {
    fn default() -> Self {
        Self {
            bias_increase: 2.0,
            bias_decay: 1.0,
            max_bias: 2.0,
        }
    }
}

impl UtilityConfig {
    pub(crate) fn decayed(&self, bias: f32) -> f32 {
        (bias - self.bias_decay).max(0.0)
    }

    pub(crate) fn increased(&self, bias: f32) -> f32 {
        (bias + self.bias_increase).min(self.max_bias)
    }
}
