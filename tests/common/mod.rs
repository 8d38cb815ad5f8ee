#![allow(dead_code)]

use async_trait::async_trait;
use opencontroller_wizard::input::{
    AnalogStickDirection, ButtonMap, ButtonMapId, ButtonMapper, DriverPrimitive, InputDispatcher,
    InputRouter, KeyboardHandler, MouseHandler, PeripheralObserver,
};
use opencontroller_wizard::wizard::{FeatureDescriptor, FeaturePrompt, InputSignal};
use opencontroller_wizard::{ConfigurationWizard, WizardSettings, WizardStatus};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;

pub const TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Scalar(String, DriverPrimitive),
    Stick(String, AnalogStickDirection, DriverPrimitive),
}

/// Button map that remembers everything recorded into it
pub struct RecordingMap {
    name: String,
    ignored: HashSet<DriverPrimitive>,
    records: Mutex<Vec<Record>>,
    saves: AtomicUsize,
    record_delay: Duration,
}

impl RecordingMap {
    pub fn new(name: &str) -> Arc<Self> {
        Self::with_ignored(name, &[])
    }

    pub fn with_ignored(name: &str, ignored: &[DriverPrimitive]) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            ignored: ignored.iter().copied().collect(),
            records: Mutex::new(Vec::new()),
            saves: AtomicUsize::new(0),
            record_delay: Duration::ZERO,
        })
    }

    /// Map whose `add_scalar` blocks the delivering thread for `delay`
    pub fn slow(name: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            ignored: HashSet::new(),
            records: Mutex::new(Vec::new()),
            saves: AtomicUsize::new(0),
            record_delay: delay,
        })
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl ButtonMap for RecordingMap {
    fn id(&self) -> ButtonMapId {
        ButtonMapId(self.name.clone())
    }

    fn device_name(&self) -> String {
        self.name.clone()
    }

    fn is_ignored(&self, primitive: &DriverPrimitive) -> bool {
        self.ignored.contains(primitive)
    }

    fn add_scalar(&self, feature_name: &str, primitive: DriverPrimitive) {
        if !self.record_delay.is_zero() {
            std::thread::sleep(self.record_delay);
        }
        self.records
            .lock()
            .push(Record::Scalar(feature_name.to_string(), primitive));
    }

    fn add_analog_stick(
        &self,
        feature_name: &str,
        direction: AnalogStickDirection,
        primitive: DriverPrimitive,
    ) {
        self.records
            .lock()
            .push(Record::Stick(feature_name.to_string(), direction, primitive));
    }

    fn save_button_map(&self) {
        self.saves.fetch_add(1, Ordering::SeqCst);
    }
}

/// Prompt whose device is gone: every prompt fails immediately
pub struct BrokenPrompt {
    feature: FeatureDescriptor,
    pub prompts: AtomicUsize,
}

impl BrokenPrompt {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            feature: FeatureDescriptor::scalar(name),
            prompts: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl FeaturePrompt for BrokenPrompt {
    fn feature(&self) -> &FeatureDescriptor {
        &self.feature
    }

    fn is_finished(&self) -> bool {
        false
    }

    fn direction(&self) -> AnalogStickDirection {
        AnalogStickDirection::Unknown
    }

    async fn prompt_for_input(&self, _input: &InputSignal) -> bool {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        false
    }

    fn reset(&self) {}
}

/// Dispatcher that forwards to a router and tracks how many mappers were ever registered at once
#[derive(Default)]
pub struct CountingDispatcher {
    pub router: InputRouter,
    active_mappers: AtomicUsize,
    pub max_active_mappers: AtomicUsize,
}

impl InputDispatcher for CountingDispatcher {
    fn register_button_mapper(&self, mapper: Arc<dyn ButtonMapper>) {
        let active = self.active_mappers.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_mappers.fetch_max(active, Ordering::SeqCst);
        self.router.register_button_mapper(mapper);
    }

    fn unregister_button_mapper(&self, mapper: &Arc<dyn ButtonMapper>) {
        self.active_mappers.fetch_sub(1, Ordering::SeqCst);
        self.router.unregister_button_mapper(mapper);
    }

    fn register_observer(&self, observer: Arc<dyn PeripheralObserver>) {
        self.router.register_observer(observer);
    }

    fn unregister_observer(&self, observer: &Arc<dyn PeripheralObserver>) {
        self.router.unregister_observer(observer);
    }

    fn register_keyboard_handler(&self, handler: Arc<dyn KeyboardHandler>) {
        self.router.register_keyboard_handler(handler);
    }

    fn unregister_keyboard_handler(&self, handler: &Arc<dyn KeyboardHandler>) {
        self.router.unregister_keyboard_handler(handler);
    }

    fn register_mouse_handler(&self, handler: Arc<dyn MouseHandler>) {
        self.router.register_mouse_handler(handler);
    }

    fn unregister_mouse_handler(&self, handler: &Arc<dyn MouseHandler>) {
        self.router.unregister_mouse_handler(handler);
    }
}

pub fn test_settings() -> WizardSettings {
    WizardSettings {
        settle_timeout_ms: 150,
        ..WizardSettings::default()
    }
}

pub fn wizard_with_router(settings: WizardSettings) -> (Arc<InputRouter>, ConfigurationWizard) {
    let router = Arc::new(InputRouter::new());
    let wizard = ConfigurationWizard::new(settings, router.clone());
    (router, wizard)
}

pub async fn wait_status<F>(status: &mut watch::Receiver<WizardStatus>, predicate: F) -> WizardStatus
where
    F: FnMut(&WizardStatus) -> bool,
{
    timeout(TIMEOUT, status.wait_for(predicate))
        .await
        .expect("wizard status timed out")
        .expect("wizard status channel closed")
        .clone()
}

pub async fn wait_prompting(
    status: &mut watch::Receiver<WizardStatus>,
    name: &str,
    expected: AnalogStickDirection,
) {
    wait_status(status, |s| {
        matches!(s, WizardStatus::Prompting { feature, direction, .. }
            if feature == name && *direction == expected)
    })
    .await;
}

pub async fn wait_finished(
    status: &mut watch::Receiver<WizardStatus>,
) -> opencontroller_wizard::wizard::RunSummary {
    match wait_status(status, WizardStatus::is_finished).await {
        WizardStatus::Finished(summary) => summary,
        other => panic!("unexpected status: {other:?}"),
    }
}
