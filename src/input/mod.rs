//! Raw input vocabulary and plumbing shared by the wizard and its drivers
//!
//! - [`primitive`] - driver primitives and directions
//! - [`button_map`] - the per-device mapping table contract
//! - [`dispatch`] - handler registration and the in-process router
//! - [`gilrs_adapter`] - gilrs events to primitives

pub mod button_map;
pub mod dispatch;
pub mod gilrs_adapter;
pub mod primitive;

pub use button_map::{ActionMap, ButtonMap, ButtonMapId, NoActions};
pub use dispatch::{
    ButtonMapper, HookCounts, InputDispatcher, InputRouter, KeyboardHandler, MouseHandler,
    PeripheralEvent, PeripheralObserver,
};
pub use primitive::{AnalogStickDirection, DriverPrimitive, HatDirection, SemiAxisDirection};
