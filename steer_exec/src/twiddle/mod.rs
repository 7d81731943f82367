//! # Twiddle module
//!
//! Twiddle is a coordinate-ascent search over the controller gains. Each gain is probed in turn,
//! first by increasing it by its step size and, if that doesn't reduce the episode error, by
//! decreasing it by the same amount. A successful probe is kept and the step grows, a failed
//! two-sided probe restores the gain and shrinks the step. Tuning finishes once the sum of the
//! step sizes falls below a tolerance.
//!
//! The search itself is the pure [`transition`] function operating on a [`TuneState`]. The
//! [`TwiddleTuner`] wraps it with the best error and gains found so far, and hands out the gains
//! to use for the next episode.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;
mod tuner;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::Params;
pub use state::*;
pub use tuner::*;
