//! Claiming the input pipeline for the duration of a run
//!
//! While a run is active the wizard is the joystick button mapper, watches
//! peripheral changes and intercepts mouse input. Keyboard input is only
//! intercepted outside emulation, where the keyboard is not a controller.

use crate::input::button_map::{ActionMap, ButtonMap};
use crate::input::dispatch::{
    ButtonMapper, KeyboardHandler, MouseHandler, PeripheralEvent, PeripheralObserver,
};
use crate::input::primitive::DriverPrimitive;
use crate::wizard::WizardShared;
use std::sync::Arc;
use tracing::{debug, info};

impl WizardShared {
    fn install_hooks(self: &Arc<Self>) {
        let dispatcher = &self.dispatcher;

        dispatcher.register_button_mapper(self.clone());
        dispatcher.register_observer(self.clone());

        if !self.settings.emulation {
            dispatcher.register_keyboard_handler(self.clone());
        }

        dispatcher.register_mouse_handler(self.clone());
        debug!("Configuration wizard hooks installed");
    }

    fn remove_hooks(self: &Arc<Self>) {
        let dispatcher = &self.dispatcher;

        let mouse: Arc<dyn MouseHandler> = self.clone();
        dispatcher.unregister_mouse_handler(&mouse);

        if !self.settings.emulation {
            let keyboard: Arc<dyn KeyboardHandler> = self.clone();
            dispatcher.unregister_keyboard_handler(&keyboard);
        }

        let observer: Arc<dyn PeripheralObserver> = self.clone();
        dispatcher.unregister_observer(&observer);

        let mapper: Arc<dyn ButtonMapper> = self.clone();
        dispatcher.unregister_button_mapper(&mapper);
        debug!("Configuration wizard hooks removed");
    }
}

/// Keeps the wizard's hooks installed until dropped
///
/// Dropping the guard removes the hooks, also when the worker unwinds.
pub(crate) struct HookGuard {
    shared: Arc<WizardShared>,
}

impl HookGuard {
    pub(crate) fn install(shared: &Arc<WizardShared>) -> Self {
        shared.install_hooks();
        Self {
            shared: shared.clone(),
        }
    }
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        self.shared.remove_hooks();
    }
}

impl ButtonMapper for WizardShared {
    fn map_primitive(
        &self,
        button_map: &Arc<dyn ButtonMap>,
        action_map: &dyn ActionMap,
        primitive: DriverPrimitive,
    ) -> bool {
        self.classify_primitive(button_map, action_map, primitive)
    }

    fn on_event_frame(&self, button_map: &Arc<dyn ButtonMap>, motion: bool) {
        self.motion.on_event_frame(&button_map.id(), motion);
    }
}

impl PeripheralObserver for WizardShared {
    fn notify(&self, event: &PeripheralEvent) {
        match event {
            PeripheralEvent::PeripheralsChanged => {
                let Some(me) = self.me.upgrade() else {
                    return;
                };
                info!("Peripherals changed, re-registering configuration wizard");
                let mapper: Arc<dyn ButtonMapper> = me;
                self.dispatcher.unregister_button_mapper(&mapper);
                self.dispatcher.register_button_mapper(mapper);
            }
            _ => {}
        }
    }
}

impl KeyboardHandler for WizardShared {
    fn on_key_press(&self, key: egui::Key) -> bool {
        debug!("Key {:?} aborts configuration", key);
        self.signal_abort()
    }
}

impl MouseHandler for WizardShared {
    fn on_button_press(&self, button: egui::PointerButton) -> bool {
        debug!("Mouse button {:?} aborts configuration", button);
        self.signal_abort()
    }
}
