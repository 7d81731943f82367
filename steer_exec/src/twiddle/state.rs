//! Coordinate-ascent search state and transitions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::Params;
use crate::pid_ctrl::{Gains, NUM_GAINS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Which gain is being probed, in which direction, and by how much.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TuneState {
    /// Index of the gain being probed, see [`Gains`] for the ordering.
    pub param_index: usize,

    /// Step size of each gain.
    pub step_sizes: [f64; NUM_GAINS],

    /// Direction of the probe on the current gain.
    pub phase: Phase
}

/// The result of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transition {
    /// The new search state.
    pub state: TuneState,

    /// The gains to evaluate in the next episode.
    pub gains: Gains,

    /// What was decided about the episode just scored.
    pub verdict: Verdict
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Direction of the probe on the current gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// The gain has been increased by its step size.
    Increasing,

    /// The gain has been decreased by its step size (twice the step from the increased value).
    Decreasing,

    /// Both probes failed, the gain is returned to its previous value.
    Restoring
}

/// Outcome of scoring an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    /// The episode improved on the best error, the probed gain is kept.
    Accepted,

    /// The increase failed, the gain will be probed downwards.
    Reversed,

    /// Both directions failed, the gain was restored and its step shrunk.
    Restored
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TuneState {
    /// Start a search on the first gain, increasing.
    pub fn new(step_sizes: [f64; NUM_GAINS]) -> Self {
        Self {
            param_index: 0,
            step_sizes,
            phase: Phase::Increasing
        }
    }

    /// Sum of the step sizes of all gains.
    pub fn step_sum(&self) -> f64 {
        self.step_sizes.iter().sum()
    }

    /// Apply the offset this state's phase makes to the probed gain.
    pub fn perturb(&self, gains: &Gains) -> Gains {
        let i = self.param_index;
        let offset = match self.phase {
            Phase::Increasing => self.step_sizes[i],
            Phase::Decreasing => -2f64 * self.step_sizes[i],
            Phase::Restoring => self.step_sizes[i]
        };

        let mut out = *gains;
        out[i] += offset;
        out
    }

    /// Move on to increasing the next gain, returning the new state and the gains to evaluate.
    fn advance(mut self, gains: &Gains) -> (Self, Gains) {
        self.param_index = (self.param_index + 1) % NUM_GAINS;
        self.phase = Phase::Increasing;
        let gains = self.perturb(gains);

        (self, gains)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Decide the next search state from the error of the episode just run.
///
/// `gains` are the gains that were evaluated during the episode, and `best_error` the lowest error
/// seen so far (`f64::INFINITY` before any episode). The returned gains already include the
/// perturbation for the next episode.
pub fn transition(
    state: &TuneState,
    gains: &Gains,
    mean_error: f64,
    best_error: f64,
    params: &Params
) -> Transition {
    let i = state.param_index;
    let mut next = *state;

    // NaN errors are never an improvement
    if mean_error < best_error {
        next.step_sizes[i] *= params.step_growth;
        let (state, gains) = next.advance(gains);

        return Transition {
            state,
            gains,
            verdict: Verdict::Accepted
        }
    }

    match state.phase {
        Phase::Increasing => {
            next.phase = Phase::Decreasing;

            Transition {
                state: next,
                gains: next.perturb(gains),
                verdict: Verdict::Reversed
            }
        },
        Phase::Decreasing | Phase::Restoring => {
            next.phase = Phase::Restoring;
            let restored = next.perturb(gains);
            next.step_sizes[i] *= params.step_shrink;
            let (state, gains) = next.advance(&restored);

            Transition {
                state,
                gains,
                verdict: Verdict::Restored
            }
        }
    }
}
