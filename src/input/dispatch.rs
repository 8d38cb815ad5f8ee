//! Input dispatch contract and an in-process router
//!
//! The wizard claims raw input by registering handlers with an
//! [`InputDispatcher`]. [`InputRouter`] is the in-process implementation: it
//! keeps the registered handlers and fans delivered events out to them.
//!
//! ```text
//! driver ──► InputRouter ──► ButtonMapper       (primitives, event frames)
//!                       ├──► PeripheralObserver (topology changes)
//!                       ├──► KeyboardHandler
//!                       └──► MouseHandler
//! ```

use crate::input::button_map::{ActionMap, ButtonMap};
use crate::input::primitive::DriverPrimitive;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Notifications published by the peripheral layer
#[derive(Debug, Clone, PartialEq)]
pub enum PeripheralEvent {
    /// Devices appeared or disappeared
    PeripheralsChanged,
    /// Peripheral settings were edited elsewhere
    SettingsChanged,
    /// A device reported a new battery level in percent
    BatteryLevel { device: String, level: u8 },
}

/// Receives driver primitives from joystick-like devices
pub trait ButtonMapper: Send + Sync {
    /// Returns true when the primitive was consumed and must not reach other handlers
    fn map_primitive(
        &self,
        button_map: &Arc<dyn ButtonMap>,
        action_map: &dyn ActionMap,
        primitive: DriverPrimitive,
    ) -> bool;

    /// Called once per driver frame with whether any axis of the device is off-center
    fn on_event_frame(&self, button_map: &Arc<dyn ButtonMap>, motion: bool);
}

pub trait PeripheralObserver: Send + Sync {
    fn notify(&self, event: &PeripheralEvent);
}

pub trait KeyboardHandler: Send + Sync {
    fn on_key_press(&self, key: egui::Key) -> bool;
}

pub trait MouseHandler: Send + Sync {
    fn on_button_press(&self, button: egui::PointerButton) -> bool;
}

/// Registration surface of the input pipeline
pub trait InputDispatcher: Send + Sync {
    fn register_button_mapper(&self, mapper: Arc<dyn ButtonMapper>);
    fn unregister_button_mapper(&self, mapper: &Arc<dyn ButtonMapper>);

    fn register_observer(&self, observer: Arc<dyn PeripheralObserver>);
    fn unregister_observer(&self, observer: &Arc<dyn PeripheralObserver>);

    fn register_keyboard_handler(&self, handler: Arc<dyn KeyboardHandler>);
    fn unregister_keyboard_handler(&self, handler: &Arc<dyn KeyboardHandler>);

    fn register_mouse_handler(&self, handler: Arc<dyn MouseHandler>);
    fn unregister_mouse_handler(&self, handler: &Arc<dyn MouseHandler>);
}

/// Number of handlers currently registered per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookCounts {
    pub button_mappers: usize,
    pub observers: usize,
    pub keyboard_handlers: usize,
    pub mouse_handlers: usize,
}

impl HookCounts {
    pub fn total(&self) -> usize {
        self.button_mappers + self.observers + self.keyboard_handlers + self.mouse_handlers
    }
}

#[derive(Default)]
struct Handlers {
    button_mappers: Vec<Arc<dyn ButtonMapper>>,
    observers: Vec<Arc<dyn PeripheralObserver>>,
    keyboard_handlers: Vec<Arc<dyn KeyboardHandler>>,
    mouse_handlers: Vec<Arc<dyn MouseHandler>>,
}

/// Compares handlers by the object they point to, ignoring vtables
fn same_handler<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

fn register<T: ?Sized>(list: &mut Vec<Arc<T>>, handler: Arc<T>, kind: &str) {
    if list.iter().any(|h| same_handler(h, &handler)) {
        warn!("{} handler is already registered", kind);
        return;
    }
    list.push(handler);
    debug!("Registered {} handler ({} active)", kind, list.len());
}

fn unregister<T: ?Sized>(list: &mut Vec<Arc<T>>, handler: &Arc<T>, kind: &str) {
    let before = list.len();
    list.retain(|h| !same_handler(h, handler));
    if list.len() < before {
        debug!("Unregistered {} handler ({} active)", kind, list.len());
    }
}

/// In-process [`InputDispatcher`] that routes events to registered handlers
///
/// Handlers are called without the router lock held, so a handler may register
/// or unregister handlers from inside a callback.
#[derive(Default)]
pub struct InputRouter {
    handlers: RwLock<Handlers>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hook_counts(&self) -> HookCounts {
        let handlers = self.handlers.read();
        HookCounts {
            button_mappers: handlers.button_mappers.len(),
            observers: handlers.observers.len(),
            keyboard_handlers: handlers.keyboard_handlers.len(),
            mouse_handlers: handlers.mouse_handlers.len(),
        }
    }

    /// Offers a primitive to the button mappers, newest first, until one consumes it
    pub fn route_primitive(
        &self,
        button_map: &Arc<dyn ButtonMap>,
        action_map: &dyn ActionMap,
        primitive: DriverPrimitive,
    ) -> bool {
        let mappers = self.handlers.read().button_mappers.clone();
        let handled = mappers
            .iter()
            .rev()
            .any(|mapper| mapper.map_primitive(button_map, action_map, primitive));
        if !handled {
            debug!("No button mapper consumed {}", primitive);
        }
        handled
    }

    pub fn route_event_frame(&self, button_map: &Arc<dyn ButtonMap>, motion: bool) {
        let mappers = self.handlers.read().button_mappers.clone();
        for mapper in mappers.iter().rev() {
            mapper.on_event_frame(button_map, motion);
        }
    }

    pub fn route_key(&self, key: egui::Key) -> bool {
        let handlers = self.handlers.read().keyboard_handlers.clone();
        handlers.iter().rev().any(|h| h.on_key_press(key))
    }

    pub fn route_mouse_button(&self, button: egui::PointerButton) -> bool {
        let handlers = self.handlers.read().mouse_handlers.clone();
        handlers.iter().rev().any(|h| h.on_button_press(button))
    }

    pub fn publish(&self, event: PeripheralEvent) {
        let observers = self.handlers.read().observers.clone();
        debug!("Publishing {:?} to {} observers", event, observers.len());
        for observer in observers {
            observer.notify(&event);
        }
    }
}

impl InputDispatcher for InputRouter {
    fn register_button_mapper(&self, mapper: Arc<dyn ButtonMapper>) {
        register(&mut self.handlers.write().button_mappers, mapper, "button mapper");
    }

    fn unregister_button_mapper(&self, mapper: &Arc<dyn ButtonMapper>) {
        unregister(&mut self.handlers.write().button_mappers, mapper, "button mapper");
    }

    fn register_observer(&self, observer: Arc<dyn PeripheralObserver>) {
        register(&mut self.handlers.write().observers, observer, "peripheral");
    }

    fn unregister_observer(&self, observer: &Arc<dyn PeripheralObserver>) {
        unregister(&mut self.handlers.write().observers, observer, "peripheral");
    }

    fn register_keyboard_handler(&self, handler: Arc<dyn KeyboardHandler>) {
        register(&mut self.handlers.write().keyboard_handlers, handler, "keyboard");
    }

    fn unregister_keyboard_handler(&self, handler: &Arc<dyn KeyboardHandler>) {
        unregister(&mut self.handlers.write().keyboard_handlers, handler, "keyboard");
    }

    fn register_mouse_handler(&self, handler: Arc<dyn MouseHandler>) {
        register(&mut self.handlers.write().mouse_handlers, handler, "mouse");
    }

    fn unregister_mouse_handler(&self, handler: &Arc<dyn MouseHandler>) {
        unregister(&mut self.handlers.write().mouse_handlers, handler, "mouse");
    }
}
