//! # Telecommand module
//!
//! Operator-input telecommands. A TC describes one change to the state of the operator's input
//! device (an axis moving, a button being pressed or released). TCs arrive as JSON packets of the
//! form `{"type": "PRESS", "payload": {"button": "BumperLeft"}}`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use serde_json::{self, Value};
use thiserror::Error;

// Internal
use crate::eqpt::hid::{Axis, Button};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An operator-input telecommand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Tc {
    /// No change, can be used to pad a script.
    None,

    /// Move an axis to the given position.
    Axis { axis: Axis, value: f64 },

    /// Push a button down.
    Press { button: Button },

    /// Let a button go.
    Release { button: Button },
}

/// Telecommand types, as they appear in the `type` field of the JSON packet.
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq, Copy, Clone)]
pub enum TcType {
    None,
    Axis,
    Press,
    Release,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("TC has an invalid type ({0})")]
    InvalidType(String),

    #[error("TC of type {0:?} is expected to have a payload but it doesn't")]
    MissingPayload(TcType),

    #[error("TC of type {0:?} has an invalid payload: {1}")]
    InvalidPayload(TcType, serde_json::Error),

    #[error("Axis value must be a finite number between -1.0 and 1.0, got {0}")]
    AxisOutOfRange(f64),
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct AxisPayload {
    axis: Axis,
    value: f64,
}

#[derive(Deserialize)]
struct ButtonPayload {
    button: Button,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        // Parse the JSON string into a value
        let val: Value = match serde_json::from_str(json_str) {
            Ok(v) => v,
            Err(e) => return Err(TcParseError::InvalidJson(e)),
        };

        // Get the type of the TC
        let type_str = match val["type"].as_str() {
            Some(s) => s,
            None => {
                return Err(TcParseError::InvalidType(String::from(
                    "Expected \"type\" to be a string",
                )))
            }
        };
        let tc_type = match TcType::from_str(type_str) {
            Some(t) => t,
            None => {
                return Err(TcParseError::InvalidType(format!(
                    "{} is not a recognised TC type",
                    type_str
                )))
            }
        };

        // Get the payload. If it's null and the type needs one an error is returned
        let payload = &val["payload"];
        if payload.is_null() && tc_type.has_payload() {
            return Err(TcParseError::MissingPayload(tc_type));
        }

        match tc_type {
            TcType::None => Ok(Tc::None),
            TcType::Axis => {
                let p: AxisPayload = serde_json::from_value(payload.clone())
                    .map_err(|e| TcParseError::InvalidPayload(tc_type, e))?;

                if !p.value.is_finite() || p.value.abs() > 1.0 {
                    return Err(TcParseError::AxisOutOfRange(p.value));
                }

                Ok(Tc::Axis {
                    axis: p.axis,
                    value: p.value,
                })
            }
            TcType::Press | TcType::Release => {
                let p: ButtonPayload = serde_json::from_value(payload.clone())
                    .map_err(|e| TcParseError::InvalidPayload(tc_type, e))?;

                Ok(match tc_type {
                    TcType::Press => Tc::Press { button: p.button },
                    _ => Tc::Release { button: p.button },
                })
            }
        }
    }
}

impl TcType {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "NONE" => Some(TcType::None),
            "AXIS" => Some(TcType::Axis),
            "PRESS" => Some(TcType::Press),
            "RELEASE" => Some(TcType::Release),
            _ => None,
        }
    }

    fn has_payload(&self) -> bool {
        !matches!(self, TcType::None)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_press() {
        let tc = Tc::from_json(r#"{"type": "PRESS", "payload": {"button": "BumperLeft"}}"#)
            .unwrap();
        assert_eq!(
            tc,
            Tc::Press {
                button: Button::BumperLeft
            }
        );
    }

    #[test]
    fn test_parse_axis() {
        let tc =
            Tc::from_json(r#"{"type": "AXIS", "payload": {"axis": "LeftY", "value": -0.5}}"#)
                .unwrap();
        assert_eq!(
            tc,
            Tc::Axis {
                axis: Axis::LeftY,
                value: -0.5
            }
        );
    }

    #[test]
    fn test_parse_none_without_payload() {
        assert_eq!(Tc::from_json(r#"{"type": "NONE"}"#).unwrap(), Tc::None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Tc::from_json("not json"),
            Err(TcParseError::InvalidJson(_))
        ));
        assert!(matches!(
            Tc::from_json(r#"{"type": "JUMP"}"#),
            Err(TcParseError::InvalidType(_))
        ));
        assert!(matches!(
            Tc::from_json(r#"{"type": "PRESS"}"#),
            Err(TcParseError::MissingPayload(TcType::Press))
        ));
        assert!(matches!(
            Tc::from_json(r#"{"type": "PRESS", "payload": {"button": "Turbo"}}"#),
            Err(TcParseError::InvalidPayload(TcType::Press, _))
        ));
        assert!(matches!(
            Tc::from_json(r#"{"type": "AXIS", "payload": {"axis": "RightX", "value": 1.5}}"#),
            Err(TcParseError::AxisOutOfRange(_))
        ));
    }
}
