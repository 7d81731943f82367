//! # Steering library.
//!
//! Closed-loop steering control of a simulated vehicle, with online tuning of the controller
//! gains. This library allows the executables and benchmarks in the crate to access the modules.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Drive control - turns telemetry into steering commands and runs the tuning episodes
pub mod drive_ctrl;

/// Episode scoring
pub mod episode;

/// PID controller and gains
pub mod pid_ctrl;

/// Twiddle gain tuner
pub mod twiddle;

/// Kinematic vehicle model for running without the simulator
pub mod vehicle_model;
