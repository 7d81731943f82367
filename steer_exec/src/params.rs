//! # Steering Executable Parameters
//!
//! This module provide parameters for the steering executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::net::NetParams;
use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SteerExecParams {
    /// Network parameters for the simulator socket
    pub net: NetParams
}
