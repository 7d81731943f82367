//! Telemetry decoding

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Vehicle telemetry for one simulation tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    /// Cross-track error, the signed lateral offset from the reference path.
    pub cte: f64,

    /// Vehicle speed, if reported.
    pub speed: Option<f64>,

    /// Current steering angle, if reported.
    pub steering_angle: Option<f64>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TelemetryError {
    #[error("Field `{0}` is missing")]
    MissingField(&'static str),

    #[error("Field `{0}` is not a number: {1}")]
    InvalidNumber(&'static str, String),

    #[error("Field `{0}` is not finite: {1}")]
    NotFinite(&'static str, f64)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Telemetry {
    /// Read telemetry out of an event payload.
    ///
    /// The simulator encodes numbers as text, plain JSON numbers are also accepted. Only `cte` is
    /// required, the other fields are `None` if they are absent or unreadable.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, TelemetryError> {
        let cte = match payload.get("cte") {
            Some(v) => parse_number("cte", v)?,
            None => return Err(TelemetryError::MissingField("cte"))
        };

        Ok(Self {
            cte,
            speed: payload.get("speed").and_then(|v| parse_number("speed", v).ok()),
            steering_angle: payload
                .get("steering_angle")
                .and_then(|v| parse_number("steering_angle", v).ok())
        })
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn parse_number(field: &'static str, value: &Value) -> Result<f64, TelemetryError> {
    let n = match value {
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| TelemetryError::InvalidNumber(field, s.clone()))?,
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| TelemetryError::InvalidNumber(field, n.to_string()))?,
        v => return Err(TelemetryError::InvalidNumber(field, v.to_string()))
    };

    match n.is_finite() {
        true => Ok(n),
        false => Err(TelemetryError::NotFinite(field, n))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn payload(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!()
        }
    }

    #[test]
    fn test_from_payload() {
        let t = Telemetry::from_payload(&payload(json!({
            "cte": "0.7598",
            "speed": "0.4380",
            "steering_angle": "0.0000"
        }))).unwrap();

        assert_eq!(t.cte, 0.7598);
        assert_eq!(t.speed, Some(0.438));
        assert_eq!(t.steering_angle, Some(0.0));

        // Plain numbers, no optional fields
        let t = Telemetry::from_payload(&payload(json!({ "cte": -1.5 }))).unwrap();
        assert_eq!(t.cte, -1.5);
        assert_eq!(t.speed, None);

        // Unreadable optional fields don't fail the tick
        let t = Telemetry::from_payload(&payload(json!({ "cte": "1", "speed": "fast" }))).unwrap();
        assert_eq!(t.speed, None);
    }

    #[test]
    fn test_invalid_cte() {
        assert_eq!(
            Telemetry::from_payload(&payload(json!({ "speed": "1.0" }))),
            Err(TelemetryError::MissingField("cte"))
        );
        assert_eq!(
            Telemetry::from_payload(&payload(json!({ "cte": "abc" }))),
            Err(TelemetryError::InvalidNumber("cte", "abc".into()))
        );
        assert!(matches!(
            Telemetry::from_payload(&payload(json!({ "cte": "NaN" }))),
            Err(TelemetryError::NotFinite("cte", _))
        ));
        assert!(matches!(
            Telemetry::from_payload(&payload(json!({ "cte": [1.0] }))),
            Err(TelemetryError::InvalidNumber("cte", _))
        ));
    }
}
