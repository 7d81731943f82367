//! Drive control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use crate::{pid_ctrl::Gains, twiddle};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for drive control
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Constant throttle demand sent with every steering command
    pub throttle: f64,

    /// Number of ticks in one tuning episode
    pub episode_length: usize,

    /// Steering demand minimum limit (normalised)
    pub min_steer: f64,

    /// Steering demand maximum limit (normalised)
    pub max_steer: f64,

    /// Starting controller gains
    pub gains: Gains,

    /// Gain tuning parameters
    #[serde(default)]
    pub twiddle: twiddle::Params,

    /// If true a report on each tuning episode is appended to the session archive
    #[serde(default)]
    pub archive_episodes: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            throttle: 0.3,
            episode_length: 3200,
            min_steer: -1.0,
            max_steer: 1.0,
            gains: Gains::new(0.133155, 0.0000583929, 1.23517),
            twiddle: twiddle::Params::default(),
            archive_episodes: false
        }
    }
}

impl Params {
    /// Returns a description of the first invalid parameter, if any.
    pub fn validate(&self) -> Option<String> {
        if self.episode_length < 2 {
            return Some(format!(
                "episode_length must be at least 2, found {}", self.episode_length
            ))
        }
        if !(self.min_steer < self.max_steer) {
            return Some(format!(
                "min_steer ({}) must be less than max_steer ({})", self.min_steer, self.max_steer
            ))
        }
        if self.min_steer < -1.0 || self.max_steer > 1.0 {
            return Some(format!(
                "steer limits must lie within [-1, 1], found [{}, {}]",
                self.min_steer, self.max_steer
            ))
        }
        if !self.throttle.is_finite() {
            return Some(format!("throttle must be finite, found {}", self.throttle))
        }
        if !self.gains.is_finite() {
            return Some(format!("gains must be finite, found {:?}", self.gains))
        }

        self.twiddle.validate()
    }
}
