//! Controller gains

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::ops::{Index, IndexMut};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of gains in a PID controller.
pub const NUM_GAINS: usize = 3;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The gains of a PID controller.
///
/// Gains can be indexed in the order proportional (0), integral (1), derivative (2), which is the
/// order in which they are tuned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gains {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Gains {
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self { k_p, k_i, k_d }
    }

    /// Returns true if all gains are finite.
    pub fn is_finite(&self) -> bool {
        self.k_p.is_finite() && self.k_i.is_finite() && self.k_d.is_finite()
    }
}

impl From<[f64; NUM_GAINS]> for Gains {
    fn from(g: [f64; NUM_GAINS]) -> Self {
        Self::new(g[0], g[1], g[2])
    }
}

impl Index<usize> for Gains {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        match index {
            0 => &self.k_p,
            1 => &self.k_i,
            2 => &self.k_d,
            i => panic!("Gain index {} out of range (expected < {})", i, NUM_GAINS)
        }
    }
}

impl IndexMut<usize> for Gains {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        match index {
            0 => &mut self.k_p,
            1 => &mut self.k_i,
            2 => &mut self.k_d,
            i => panic!("Gain index {} out of range (expected < {})", i, NUM_GAINS)
        }
    }
}
