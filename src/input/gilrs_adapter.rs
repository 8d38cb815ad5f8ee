//! Translation from gilrs events to driver primitives
//!
//! gilrs reports named buttons and axes together with the native event code.
//! The wizard maps native codes, so everything here keys off [`Code`] and only
//! uses the named variant to tell d-pad axes apart from analog axes.

use crate::config::WizardSettings;
use crate::error::{Result, WizardError};
use crate::input::button_map::{ButtonMap, NoActions};
use crate::input::dispatch::{InputRouter, PeripheralEvent};
use crate::input::primitive::{DriverPrimitive, HatDirection, SemiAxisDirection};
use gilrs::ev::Code;
use gilrs::{Axis, Event, EventType, GamepadId, Gilrs};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Converts a gilrs event into the primitive it activates, if any
///
/// Releases and sub-threshold axis movement produce nothing: only the press
/// that the user was asked for is offered to the wizard.
pub fn primitive_from_event(event: &EventType, activation: f32) -> Option<DriverPrimitive> {
    match *event {
        EventType::ButtonPressed(_, code) => Some(DriverPrimitive::Button(code.into_u32())),
        EventType::AxisChanged(axis, value, code) => {
            if value.abs() < activation {
                return None;
            }
            Some(axis_primitive(axis, value, code))
        }
        _ => None,
    }
}

fn axis_primitive(axis: Axis, value: f32, code: Code) -> DriverPrimitive {
    let index = code.into_u32();
    match axis {
        Axis::DPadX if value > 0.0 => DriverPrimitive::Hat(index, HatDirection::Right),
        Axis::DPadX => DriverPrimitive::Hat(index, HatDirection::Left),
        Axis::DPadY if value > 0.0 => DriverPrimitive::Hat(index, HatDirection::Up),
        Axis::DPadY => DriverPrimitive::Hat(index, HatDirection::Down),
        _ if value > 0.0 => DriverPrimitive::SemiAxis(index, SemiAxisDirection::Positive),
        _ => DriverPrimitive::SemiAxis(index, SemiAxisDirection::Negative),
    }
}

// Rescales the value to the range outside the deadzone
pub fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        sign * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}

/// Last known value of every axis of one device
#[derive(Debug, Default, Clone)]
pub struct AxisFrame {
    values: HashMap<u32, f32>,
}

impl AxisFrame {
    pub fn update(&mut self, code: u32, value: f32) {
        self.values.insert(code, value);
    }

    /// True while any axis rests outside the deadzone
    pub fn is_moving(&self, deadzone: f32) -> bool {
        self.values
            .values()
            .any(|value| apply_deadzone(*value, deadzone) != 0.0)
    }
}

/// Creates the button map used for a newly seen gamepad
pub type ButtonMapFactory = Box<dyn Fn(GamepadId, &str) -> Arc<dyn ButtonMap> + Send>;

/// Polls gilrs on a dedicated thread and feeds the [`InputRouter`]
pub struct GilrsFeeder {
    gilrs: Gilrs,
    router: Arc<InputRouter>,
    settings: WizardSettings,
    factory: ButtonMapFactory,
    button_maps: HashMap<GamepadId, Arc<dyn ButtonMap>>,
    frames: HashMap<GamepadId, AxisFrame>,
}

impl GilrsFeeder {
    pub fn create(
        router: Arc<InputRouter>,
        settings: WizardSettings,
        factory: ButtonMapFactory,
    ) -> Result<Self> {
        info!("Initializing gilrs controller interface");
        let gilrs = Gilrs::new().map_err(|e| {
            error!("Failed to initialize gilrs: {}", e);
            WizardError::BackendError(e.to_string())
        })?;

        for (id, gamepad) in gilrs.gamepads() {
            info!("Found gamepad {}: {}", id, gamepad.name());
        }

        Ok(Self {
            gilrs,
            router,
            settings,
            factory,
            button_maps: HashMap::new(),
            frames: HashMap::new(),
        })
    }

    /// Runs the polling loop until the token is cancelled
    pub fn spawn(mut self, token: CancellationToken) -> Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("gilrs-feeder".to_string())
            .spawn(move || {
                info!("Starting gilrs feeder loop");
                while !token.is_cancelled() {
                    while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
                        self.handle_event(id, event);
                    }
                    std::thread::sleep(Duration::from_millis(1));
                }
                info!("Gilrs feeder stopped");
            })
            .map_err(|e| WizardError::ThreadError(format!("Failed to spawn feeder: {}", e)))
    }

    fn button_map(&mut self, id: GamepadId) -> Arc<dyn ButtonMap> {
        if let Some(map) = self.button_maps.get(&id) {
            return map.clone();
        }
        let name = self.gilrs.gamepad(id).name().to_string();
        let map = (self.factory)(id, &name);
        debug!("Created button map {} for {}", map.id(), name);
        self.button_maps.insert(id, map.clone());
        map
    }

    fn handle_event(&mut self, id: GamepadId, event: EventType) {
        match event {
            EventType::Connected => {
                info!("Gamepad {} connected", id);
                self.router.publish(PeripheralEvent::PeripheralsChanged);
                return;
            }
            EventType::Disconnected => {
                warn!("Gamepad {} disconnected", id);
                self.button_maps.remove(&id);
                self.frames.remove(&id);
                self.router.publish(PeripheralEvent::PeripheralsChanged);
                return;
            }
            _ => {}
        }

        let map = self.button_map(id);

        if let Some(primitive) = primitive_from_event(&event, self.settings.axis_activation) {
            let handled = self.router.route_primitive(&map, &NoActions, primitive);
            debug!("Routed {} from {} (handled: {})", primitive, id, handled);
        }

        if let EventType::AxisChanged(_, value, code) = event {
            let frame = self.frames.entry(id).or_default();
            frame.update(code.into_u32(), value);
            let motion = frame.is_moving(self.settings.axis_deadzone);
            self.router.route_event_frame(&map, motion);
        }
    }
}
