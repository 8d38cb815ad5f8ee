//! Primitive classification, called from the input thread
//!
//! Decision order, first match wins:
//!
//! 1. the cancel button aborts the run
//! 2. primitives already claimed this run are swallowed
//! 3. primitives the button map ignores are swallowed
//! 4. without a current feature the primitive is not handled
//! 5. scalars record the primitive, analog sticks record it for the current direction
//!
//! Step 2 reserves the primitive under the session lock before the button map is
//! called. Steps 3 to 5 give the reservation back unless the primitive is
//! recorded, so only a successful record keeps the claim, marks the device as
//! moving and wakes the worker.

use crate::input::button_map::{ActionMap, ButtonMap};
use crate::input::primitive::DriverPrimitive;
use crate::wizard::feature::FeatureType;
use crate::wizard::WizardShared;
use std::sync::Arc;
use tracing::{debug, info};

impl WizardShared {
    fn is_cancel(&self, primitive: &DriverPrimitive) -> bool {
        *primitive == DriverPrimitive::Button(self.settings.cancel_key_code)
    }

    pub(crate) fn classify_primitive(
        &self,
        button_map: &Arc<dyn ButtonMap>,
        action_map: &dyn ActionMap,
        primitive: DriverPrimitive,
    ) -> bool {
        if self.is_cancel(&primitive) {
            info!("Cancel input received from {}", button_map.device_name());
            self.signal_abort();
            return true;
        }

        let Some(claim) = self.session.try_claim(primitive, button_map) else {
            debug!(
                "{} was already mapped this round (action {:?}), ignoring it",
                primitive,
                action_map.action_id(&primitive)
            );
            return true;
        };

        if button_map.is_ignored(&primitive) {
            debug!("{} is ignored for {}", primitive, button_map.device_name());
            self.session.release(claim);
            return true;
        }

        let Some(snapshot) = self.session.snapshot() else {
            self.session.release(claim);
            return false;
        };

        let feature = snapshot.feature.feature();
        debug!(
            "{}: mapping feature \"{}\" for device {}",
            snapshot.controller_id,
            feature.name,
            button_map.device_name()
        );

        let handled = match feature.feature_type {
            FeatureType::Scalar => {
                button_map.add_scalar(&feature.name, primitive);
                true
            }
            FeatureType::AnalogStick => {
                button_map.add_analog_stick(&feature.name, snapshot.direction, primitive);
                true
            }
            other => {
                debug!("Cannot map {} to {} feature \"{}\"", primitive, other, feature.name);
                false
            }
        };

        if handled {
            self.motion.on_motion(button_map.id());
            snapshot.input.set();
        } else {
            self.session.release(claim);
        }

        handled
    }
}
