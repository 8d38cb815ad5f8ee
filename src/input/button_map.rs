use crate::input::primitive::{AnalogStickDirection, DriverPrimitive};
use std::fmt;

/// Identity of a button map, stable for the lifetime of the device it describes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ButtonMapId(pub String);

impl fmt::Display for ButtonMapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ButtonMapId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Per-device table from driver primitives to controller features
///
/// Implementations own their storage. The wizard only records into a map and
/// asks it to persist itself once a run is over.
pub trait ButtonMap: Send + Sync {
    fn id(&self) -> ButtonMapId;

    fn device_name(&self) -> String;

    /// Primitives the device reports that must never be mapped (noisy axes, accelerometers)
    fn is_ignored(&self, primitive: &DriverPrimitive) -> bool;

    fn add_scalar(&self, feature_name: &str, primitive: DriverPrimitive);

    fn add_analog_stick(
        &self,
        feature_name: &str,
        direction: AnalogStickDirection,
        primitive: DriverPrimitive,
    );

    fn save_button_map(&self);
}

/// Translation from primitives to GUI actions, consulted for diagnostics only
pub trait ActionMap: Send + Sync {
    fn action_id(&self, primitive: &DriverPrimitive) -> Option<u32>;
}

/// Action map for devices that drive no GUI actions
#[derive(Debug, Default, Clone, Copy)]
pub struct NoActions;

impl ActionMap for NoActions {
    fn action_id(&self, _primitive: &DriverPrimitive) -> Option<u32> {
        None
    }
}
