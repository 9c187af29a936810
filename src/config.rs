//!
//! Tunables for the size mutator.

use crate::error::SizeError;

/// Odds and ranges used by `mutate_size_with`. `Default` holds the calibrated values.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    /// One in `random_value_odds` mutations writes a fully random value.
    pub random_value_odds: u64,
    /// Width of the window above the current value used by small perturbations.
    pub perturb_window: u64,
    /// Overflow deltas are drawn from `[0, overflow_delta_range)`.
    pub overflow_delta_range: u64,
    /// How much more likely a delta of 0 is than the largest delta.
    pub overflow_delta_bias: u64,
    /// One in `underflow_odds` overflow mutations land below the boundary even for
    /// multi-byte granularity.
    pub underflow_odds: u64,
}

impl Default for MutationConfig {
    fn default() -> Self {
        MutationConfig {
            random_value_odds: 100,
            perturb_window: 1000,
            overflow_delta_range: 1000,
            overflow_delta_bias: 10,
            underflow_odds: 10,
        }
    }
}

impl MutationConfig {
    pub fn from_json(text: &str) -> Result<Self, SizeError> {
        serde_json::from_str(text).map_err(|e| SizeError::Description(e.to_string()))
    }
}
