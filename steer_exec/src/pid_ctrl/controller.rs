//! The PID controller

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::Gains;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller operating on one error sample per tick.
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Controller gains
    gains: Gains,

    /// The integral accumulation
    integral: f64,

    /// Error passed into the previous update
    prev_error: f64,

    /// Error passed into the latest update
    curr_error: f64,

    /// Difference between the latest and previous errors
    deriv: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {

    /// Create a new controller with the given gains.
    pub fn new(gains: Gains) -> Self {
        Self {
            gains,
            integral: 0f64,
            prev_error: 0f64,
            curr_error: 0f64,
            deriv: 0f64
        }
    }

    /// Set new gains and clear the integral and error history.
    pub fn init(&mut self, gains: Gains) {
        *self = Self::new(gains);
    }

    /// Pass the latest error into the controller.
    pub fn update(&mut self, error: f64) {
        self.curr_error = error;
        self.integral += error;
        self.deriv = error - self.prev_error;
        self.prev_error = error;
    }

    /// The controller output for the latest error.
    ///
    /// The output is not limited, callers must saturate it into their actuator range.
    pub fn output(&self) -> f64 {
        self.gains.k_p * self.curr_error
            + self.gains.k_i * self.integral
            + self.gains.k_d * self.deriv
    }

    /// Update the controller with the given error and return the new output.
    pub fn get(&mut self, error: f64) -> f64 {
        self.update(error);
        self.output()
    }

    /// The gains the controller is currently using.
    pub fn gains(&self) -> &Gains {
        &self.gains
    }

    /// The integral accumulation.
    pub fn integral(&self) -> f64 {
        self.integral
    }
}
