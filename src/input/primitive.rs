use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a hat (d-pad) primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HatDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Half of an axis, a signed axis is mapped as two semiaxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemiAxisDirection {
    Positive,
    Negative,
}

/// Direction of an analog stick that a prompt is currently asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnalogStickDirection {
    #[default]
    Unknown,
    Up,
    Down,
    Right,
    Left,
}

/// One raw hardware input as reported by a driver
///
/// Primitives are plain values: two reports of the same physical input compare
/// equal, which is what the wizard relies on for deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriverPrimitive {
    Button(u32),
    Hat(u32, HatDirection),
    SemiAxis(u32, SemiAxisDirection),
}

impl fmt::Display for DriverPrimitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverPrimitive::Button(index) => write!(f, "button {}", index),
            DriverPrimitive::Hat(index, dir) => write!(f, "hat {} {:?}", index, dir),
            DriverPrimitive::SemiAxis(index, SemiAxisDirection::Positive) => {
                write!(f, "axis +{}", index)
            }
            DriverPrimitive::SemiAxis(index, SemiAxisDirection::Negative) => {
                write!(f, "axis -{}", index)
            }
        }
    }
}
