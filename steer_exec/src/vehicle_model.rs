//! # Vehicle model
//!
//! A kinematic bicycle model of a vehicle following a straight reference line, used to exercise
//! drive control without the simulator. The cross-track error is the vehicle's lateral offset from
//! the line, positive to the left, and a positive steering demand turns the vehicle to the right
//! so that positive gains reduce the error.
//!
//! A constant steering bias stands in for a misaligned steering rack, which the integral term of
//! the controller has to remove.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;
use serde_json::json;

use comms_if::sim::{SimCommand, SimEvent};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the vehicle model.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Distance between the axles.
    ///
    /// Units: meters
    pub wheelbase_m: f64,

    /// Steering angle at a normalised demand of 1.
    ///
    /// Units: radians
    pub max_steer_rad: f64,

    /// Speed at a throttle of 1, the speed is proportional to the throttle.
    ///
    /// Units: meters/second
    pub max_speed_ms: f64,

    /// Constant offset added to the steering angle.
    ///
    /// Units: radians
    pub steer_bias_rad: f64,

    /// Lateral offset from the line after a reset.
    ///
    /// Units: meters
    pub initial_offset_m: f64,

    /// Simulation tick period.
    ///
    /// Units: seconds
    pub tick_period_s: f64
}

/// A vehicle following a straight line.
#[derive(Debug, Clone)]
pub struct VehicleModel {
    params: ModelParams,

    /// Lateral offset from the line
    lateral_m: f64,

    /// Heading relative to the line
    heading_rad: f64,

    speed_ms: f64,

    steer: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            wheelbase_m: 2.67,
            max_steer_rad: 25f64.to_radians(),
            max_speed_ms: 30.0,
            steer_bias_rad: 1f64.to_radians(),
            initial_offset_m: 0.8,
            tick_period_s: 0.05
        }
    }
}

impl VehicleModel {
    pub fn new(params: ModelParams) -> Self {
        Self {
            lateral_m: params.initial_offset_m,
            heading_rad: 0f64,
            speed_ms: 0f64,
            steer: 0f64,
            params
        }
    }

    /// Put the vehicle back at the start of the track.
    pub fn reset(&mut self) {
        *self = Self::new(self.params.clone());
    }

    /// The cross-track error.
    pub fn cte(&self) -> f64 {
        self.lateral_m
    }

    /// Apply a command from drive control.
    pub fn apply(&mut self, cmd: &SimCommand) {
        match *cmd {
            SimCommand::Steer { steering_angle, throttle } => {
                self.steer = steering_angle.max(-1f64).min(1f64);
                self.speed_ms = throttle * self.params.max_speed_ms;
            },
            SimCommand::Reset => self.reset(),
            SimCommand::Manual => ()
        }
    }

    /// Advance the model by one tick.
    pub fn tick(&mut self) {
        let dt = self.params.tick_period_s;
        let delta = -self.steer * self.params.max_steer_rad + self.params.steer_bias_rad;

        self.heading_rad += self.speed_ms / self.params.wheelbase_m * delta.tan() * dt;
        self.lateral_m += self.speed_ms * self.heading_rad.sin() * dt;
    }

    /// The telemetry event the simulator would send for the current state.
    pub fn telemetry(&self) -> SimEvent {
        SimEvent::telemetry(json!({
            "cte": format!("{:.4}", self.cte()),
            "speed": format!("{:.4}", self.speed_ms),
            "steering_angle": format!("{:.4}", self.steer * self.params.max_steer_rad.to_degrees())
        }))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_straight_without_steer() {
        let mut model = VehicleModel::new(ModelParams {
            steer_bias_rad: 0.0,
            ..Default::default()
        });
        model.apply(&SimCommand::Steer { steering_angle: 0.0, throttle: 0.3 });

        for _ in 0..100 {
            model.tick();
        }
        assert_eq!(model.cte(), 0.8);
    }

    #[test]
    fn test_positive_steer_reduces_cte() {
        let mut model = VehicleModel::new(ModelParams::default());
        model.apply(&SimCommand::Steer { steering_angle: 0.5, throttle: 0.3 });

        for _ in 0..10 {
            model.tick();
        }
        assert!(model.cte() < 0.8);

        model.apply(&SimCommand::Reset);
        assert_eq!(model.cte(), 0.8);
    }

    #[test]
    fn test_telemetry() {
        let model = VehicleModel::new(ModelParams::default());
        let event = model.telemetry();

        assert!(event.is_telemetry());
        assert_eq!(event.payload.unwrap()["cte"], "0.8000");
    }
}
