//! Twiddle parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::pid_ctrl::NUM_GAINS;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the gain tuner
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Params {
    /// If false the gains are never perturbed and the controller drives continuously.
    pub enabled: bool,

    /// Starting step size for each gain, in the order p, i, d.
    pub initial_step_sizes: [f64; NUM_GAINS],

    /// Tuning stops once the sum of the step sizes is below this value.
    pub tolerance: f64,

    /// Factor applied to a gain's step size after a successful probe.
    pub step_growth: f64,

    /// Factor applied to a gain's step size after a failed two-sided probe.
    pub step_shrink: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_step_sizes: [0.01, 0.0001, 0.1],
            tolerance: 0.001,
            step_growth: 1.1,
            step_shrink: 0.9
        }
    }
}

impl Params {
    /// Returns a description of the first invalid parameter, if any.
    pub fn validate(&self) -> Option<String> {
        if self.initial_step_sizes.iter().any(|s| !s.is_finite() || *s < 0f64) {
            return Some(format!(
                "step sizes must be finite and non-negative, found {:?}",
                self.initial_step_sizes
            ))
        }
        if !(self.tolerance > 0f64) {
            return Some(format!("tolerance must be positive, found {}", self.tolerance))
        }
        if !(self.step_growth >= 1f64) || !self.step_growth.is_finite() {
            return Some(format!("step_growth must be at least 1, found {}", self.step_growth))
        }
        if !(self.step_shrink > 0f64 && self.step_shrink < 1f64) {
            return Some(format!("step_shrink must be within (0, 1), found {}", self.step_shrink))
        }

        None
    }
}
