//! # PID control module
//!
//! Provides the error-integrating controller used to turn the cross-track error into a steering
//! demand, and the set of gains it is parameterised by.
//!
//! Unlike a time-aware controller the integral and derivative terms here are computed per
//! simulation tick, so the gains implicitly include the (fixed) tick period.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod controller;
mod gains;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use controller::*;
pub use gains::*;
