//! # Simulator Interface
//!
//! The vehicle simulator exchanges text frames with the steering executable through a bridge. An
//! event frame is the prefix `42` followed by a JSON array of the event name and its payload:
//!
//! ```text
//! 42["telemetry",{"cte":"0.7598","speed":"0.4380","steering_angle":"0.0000"}]
//! ```
//!
//! Commands going back to the simulator use the same framing, see [`SimCommand::encode`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde_json::{json, Map, Value};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Prefix marking a frame as an event message (`4` message, `2` event).
pub const EVENT_FRAME_PREFIX: &str = "42";

/// Name of the event carrying vehicle telemetry.
pub const TELEMETRY_EVENT: &str = "telemetry";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An event received from the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct SimEvent {
    /// Name of the event, for example `"telemetry"`.
    pub name: String,

    /// The key-value payload of the event, or `None` if the simulator sent no data.
    pub payload: Option<Map<String, Value>>
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command sent back to the simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimCommand {
    /// Drive the vehicle with the given normalised steering angle and throttle.
    Steer {
        /// Steering angle in the normalised range [-1, 1].
        steering_angle: f64,

        /// Throttle demand.
        throttle: f64
    },

    /// Reset the simulation to the start of the track.
    Reset,

    /// Acknowledge a frame without data, leaving the vehicle under manual control.
    Manual
}

/// Errors which can occur while decoding a frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("The frame is not an event message")]
    NotAnEvent,

    #[error("The frame does not contain a JSON array")]
    NoArray,

    #[error("Could not parse the event array: {0}")]
    JsonError(serde_json::Error),

    #[error("The event array is malformed: {0}")]
    Malformed(&'static str)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimEvent {
    /// Create a new event.
    pub fn new(name: &str, payload: Option<Map<String, Value>>) -> Self {
        Self {
            name: name.into(),
            payload
        }
    }

    /// Build a telemetry event from a JSON value.
    ///
    /// A payload which isn't an object results in an event without data.
    pub fn telemetry(payload: Value) -> Self {
        match payload {
            Value::Object(m) => Self::new(TELEMETRY_EVENT, Some(m)),
            _ => Self::new(TELEMETRY_EVENT, None)
        }
    }

    /// Returns true if this is a telemetry event carrying data.
    pub fn is_telemetry(&self) -> bool {
        self.name == TELEMETRY_EVENT && self.payload.is_some()
    }
}

impl SimCommand {
    /// The event name the simulator expects for this command.
    pub fn event_name(&self) -> &'static str {
        match self {
            SimCommand::Steer { .. } => "steer",
            SimCommand::Reset => "reset",
            SimCommand::Manual => "manual"
        }
    }

    /// The JSON payload of this command. `Reset` and `Manual` carry an empty object.
    pub fn payload(&self) -> Value {
        match *self {
            SimCommand::Steer { steering_angle, throttle } => json!({
                "steering_angle": steering_angle,
                "throttle": throttle
            }),
            SimCommand::Reset | SimCommand::Manual => json!({})
        }
    }

    /// Encode the command as a frame, for example `42["reset",{}]`.
    pub fn encode(&self) -> String {
        let array = Value::Array(vec![
            Value::String(self.event_name().into()),
            self.payload()
        ]);

        format!("{}{}", EVENT_FRAME_PREFIX, array)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Decode a frame received from the simulator.
///
/// Any frame containing `null` is treated as carrying no data, in which case the event is returned
/// with a `None` payload (and an empty name if the name can't be read either).
pub fn decode_frame(frame: &str) -> Result<SimEvent, FrameError> {
    if frame.len() <= EVENT_FRAME_PREFIX.len() || !frame.starts_with(EVENT_FRAME_PREFIX) {
        return Err(FrameError::NotAnEvent)
    }

    let array = match (frame.find('['), frame.rfind(']')) {
        (Some(b1), Some(b2)) if b1 < b2 => &frame[b1..=b2],
        _ => return Err(FrameError::NoArray)
    };

    if array.contains("null") {
        let name = serde_json::from_str::<Vec<Value>>(array)
            .ok()
            .and_then(|v| v.first().and_then(Value::as_str).map(String::from))
            .unwrap_or_default();

        return Ok(SimEvent { name, payload: None })
    }

    let mut items = match serde_json::from_str(array).map_err(FrameError::JsonError)? {
        Value::Array(items) => items.into_iter(),
        _ => return Err(FrameError::NoArray)
    };

    let name = match items.next() {
        Some(Value::String(s)) => s,
        Some(_) => return Err(FrameError::Malformed("event name is not a string")),
        None => return Err(FrameError::Malformed("empty event array"))
    };

    let payload = match items.next() {
        Some(Value::Object(m)) => Some(m),
        Some(_) => return Err(FrameError::Malformed("event payload is not an object")),
        None => None
    };

    Ok(SimEvent { name, payload })
}
