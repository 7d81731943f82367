//! # Communications interface crate.
//!
//! Provides the communications interfaces shared between the steering executable and the bridge
//! to the vehicle simulator.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Network module
pub mod net;

/// Simulator events, commands and the frame codec used to carry them
pub mod sim;
