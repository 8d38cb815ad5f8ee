//! Controller configuration wizard
//!
//! Walks the user through every feature of a controller and records the first
//! unclaimed primitive for each into the device's button map.
//!
//! # Architecture
//!
//! ```text
//!                    ┌──────────── InputDispatcher ◄──── driver thread
//!                    │ (hooks)          │
//!                    ▼                  ▼ map_primitive / on_event_frame
//!  start_run ──► WizardRun ◄─wake── classifier ──► ButtonMap
//!                (worker task)          │
//!                    │                  ▼
//!                    └── settle ◄── MotionTracker
//! ```
//!
//! The worker and the input thread share two independent locks: the session
//! lock (current feature, direction, claimed primitives) and the motion lock.
//! Neither is ever held while the other is taken, and neither is held while
//! waiting.
//!
//! - [`feature`] - feature prompt contract and the standard prompt
//! - `sequencer` - the worker state machine
//! - `classifier` - primitive classification on the input thread
//! - `hooks` - claiming and releasing the input pipeline

pub(crate) mod classifier;
pub mod feature;
pub(crate) mod hooks;
pub(crate) mod motion;
pub(crate) mod sequencer;
pub(crate) mod session;
pub mod status;

pub use feature::{
    FeatureButton, FeatureDescriptor, FeaturePrompt, FeatureType, InputSignal, STICK_DIRECTIONS,
};
pub use status::{RunSummary, WizardStatus};

use crate::config::WizardSettings;
use crate::input::button_map::{ActionMap, ButtonMap};
use crate::input::dispatch::InputDispatcher;
use crate::input::primitive::DriverPrimitive;
use motion::MotionTracker;
use parking_lot::Mutex;
use sequencer::WizardRun;
use session::SessionState;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Marks the run as done when the worker future completes or is dropped
struct DoneGuard(watch::Sender<bool>);

impl Drop for DoneGuard {
    fn drop(&mut self) {
        self.0.send_replace(true);
    }
}

struct RunHandle {
    token: CancellationToken,
    done: watch::Receiver<bool>,
}

impl RunHandle {
    fn is_running(&self) -> bool {
        !*self.done.borrow()
    }
}

/// State shared by the wizard handle, its worker and its input hooks
pub(crate) struct WizardShared {
    me: Weak<WizardShared>,
    settings: WizardSettings,
    dispatcher: Arc<dyn InputDispatcher>,
    session: SessionState,
    motion: MotionTracker,
    worker: Mutex<Option<RunHandle>>,
    status: watch::Sender<WizardStatus>,
    start_lock: tokio::sync::Mutex<()>,
}

impl WizardShared {
    pub(crate) fn publish_status(&self, status: WizardStatus) {
        self.status.send_replace(status);
    }

    fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(RunHandle::is_running)
    }

    /// Asks the worker to stop and wakes it from any wait
    ///
    /// Never blocks. Returns false if no run was active.
    pub(crate) fn signal_abort(&self) -> bool {
        let token = match self.worker.lock().as_ref() {
            Some(handle) if handle.is_running() => handle.token.clone(),
            _ => return false,
        };

        if !token.is_cancelled() {
            info!("Aborting configuration wizard");
        }
        token.cancel();
        self.session.input_signal().set();
        true
    }

    async fn wait_for_worker(&self) {
        let done = self.worker.lock().as_ref().map(|handle| handle.done.clone());
        if let Some(mut done) = done {
            let _ = done.wait_for(|done| *done).await;
        }
    }
}

/// Handle to a configuration wizard
///
/// Cloning the handle shares the wizard. At most one run is active at a time.
#[derive(Clone)]
pub struct ConfigurationWizard {
    shared: Arc<WizardShared>,
}

impl ConfigurationWizard {
    pub fn new(settings: WizardSettings, dispatcher: Arc<dyn InputDispatcher>) -> Self {
        info!(
            "Creating configuration wizard for controller {} (emulation: {})",
            settings.controller_number, settings.emulation
        );
        let shared = Arc::new_cyclic(|me| WizardShared {
            me: me.clone(),
            settings,
            dispatcher,
            session: SessionState::default(),
            motion: MotionTracker::default(),
            worker: Mutex::new(None),
            status: watch::channel(WizardStatus::Idle).0,
            start_lock: tokio::sync::Mutex::new(()),
        });
        Self { shared }
    }

    pub fn settings(&self) -> &WizardSettings {
        &self.shared.settings
    }

    /// Starts mapping `features` in order for `controller_id`
    ///
    /// A run that is still active is aborted and fully torn down first. Returns
    /// as soon as the new worker is scheduled.
    pub async fn start_run(
        &self,
        controller_id: impl Into<String>,
        features: Vec<Arc<dyn FeaturePrompt>>,
    ) {
        let _starting = self.shared.start_lock.lock().await;
        let controller_id = controller_id.into();

        if self.request_abort(true).await {
            debug!("Previous run aborted before starting {}", controller_id);
        }

        self.shared.session.begin(controller_id, features);
        self.shared.motion.reset();

        let token = CancellationToken::new();
        let (done_tx, done_rx) = watch::channel(false);
        *self.shared.worker.lock() = Some(RunHandle {
            token: token.clone(),
            done: done_rx,
        });

        let run = WizardRun::create(self.shared.clone(), token);
        tokio::spawn(async move {
            let _done = DoneGuard(done_tx);
            sequencer::execute(run).await;
        });
    }

    /// Aborts the run if `feature` is the one currently prompting
    pub fn on_unfocus(&self, feature: &Arc<dyn FeaturePrompt>) {
        if self.shared.session.is_current(feature) {
            debug!("Current feature \"{}\" lost focus", feature.feature().name);
            self.shared.signal_abort();
        }
    }

    /// Stops the active run, optionally waiting until it has fully exited
    ///
    /// Returns whether a run was active. Aborting an idle wizard is a no-op.
    pub async fn request_abort(&self, wait: bool) -> bool {
        let was_running = self.shared.signal_abort();
        if wait {
            self.shared.wait_for_worker().await;
        }
        was_running
    }

    /// Non-blocking abort for use from input callbacks
    pub fn abort(&self) -> bool {
        self.shared.signal_abort()
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Waits for the active run to end on its own
    pub async fn wait_idle(&self) {
        self.shared.wait_for_worker().await;
    }

    pub fn subscribe(&self) -> watch::Receiver<WizardStatus> {
        self.shared.status.subscribe()
    }

    /// Classifies a primitive delivered by a driver
    ///
    /// Returns true when the primitive was consumed: recorded, swallowed as a
    /// duplicate or ignored input, or the cancel button.
    pub fn map_primitive(
        &self,
        button_map: &Arc<dyn ButtonMap>,
        action_map: &dyn ActionMap,
        primitive: DriverPrimitive,
    ) -> bool {
        self.shared.classify_primitive(button_map, action_map, primitive)
    }

    pub fn on_event_frame(&self, button_map: &Arc<dyn ButtonMap>, motion: bool) {
        self.shared.motion.on_event_frame(&button_map.id(), motion);
    }

    /// Any key press aborts the wizard; returns whether a run was active
    pub fn on_key_press(&self, key: egui::Key) -> bool {
        debug!("Key {:?} pressed during configuration", key);
        self.shared.signal_abort()
    }

    pub fn on_mouse_button(&self, button: egui::PointerButton) -> bool {
        debug!("Mouse button {:?} pressed during configuration", button);
        self.shared.signal_abort()
    }
}
