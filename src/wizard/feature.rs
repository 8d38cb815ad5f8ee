//! Feature prompts: the wizard's view of one mappable controller feature

use crate::input::primitive::AnalogStickDirection;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureType {
    Unknown,
    Scalar,
    AnalogStick,
    Throttle,
    Accelerometer,
    Motor,
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureType::Unknown => write!(f, "unknown"),
            FeatureType::Scalar => write!(f, "scalar"),
            FeatureType::AnalogStick => write!(f, "analog stick"),
            FeatureType::Throttle => write!(f, "throttle"),
            FeatureType::Accelerometer => write!(f, "accelerometer"),
            FeatureType::Motor => write!(f, "motor"),
        }
    }
}

/// Name and type of a controller feature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureDescriptor {
    pub name: String,
    pub feature_type: FeatureType,
}

impl FeatureDescriptor {
    pub fn new(name: impl Into<String>, feature_type: FeatureType) -> Self {
        Self {
            name: name.into(),
            feature_type,
        }
    }

    pub fn scalar(name: impl Into<String>) -> Self {
        Self::new(name, FeatureType::Scalar)
    }

    pub fn analog_stick(name: impl Into<String>) -> Self {
        Self::new(name, FeatureType::AnalogStick)
    }
}

/// Latched wake-up for a prompt waiting on input
///
/// A `set` that happens before anyone waits is kept and consumed by the next
/// `wait`, so a prompt never misses input that arrived while it was getting
/// ready to wait.
///
/// At most one wake is latched, and it is not tied to a feature. When two
/// distinct primitives are recorded for the same feature, the first releases
/// the waiting prompt and the second stays latched, so the next prompt returns
/// without new input.
#[derive(Debug, Default)]
pub struct InputSignal {
    notify: Notify,
}

impl InputSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.notify.notify_one();
    }

    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// One mappable feature as presented to the user
///
/// Prompts are owned by the caller; the wizard only holds shared references
/// while a run is active.
#[async_trait]
pub trait FeaturePrompt: Send + Sync {
    fn feature(&self) -> &FeatureDescriptor;

    /// True once every input this feature needs has been captured
    fn is_finished(&self) -> bool;

    /// The analog stick direction currently asked for, `Unknown` for non-stick features
    fn direction(&self) -> AnalogStickDirection;

    /// Waits until `input` fires and advances the prompt
    ///
    /// Returns false when prompting cannot proceed at all, for example because
    /// the device behind the prompt went away.
    async fn prompt_for_input(&self, input: &InputSignal) -> bool;

    /// Clears transient prompt state
    fn reset(&self);
}

/// Compares prompts by identity
pub fn same_prompt(a: &Arc<dyn FeaturePrompt>, b: &Arc<dyn FeaturePrompt>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Order in which analog stick directions are requested
pub const STICK_DIRECTIONS: [AnalogStickDirection; 4] = [
    AnalogStickDirection::Up,
    AnalogStickDirection::Right,
    AnalogStickDirection::Down,
    AnalogStickDirection::Left,
];

#[derive(Debug, Default)]
struct ButtonProgress {
    step: usize,
    finished: bool,
    prompts: usize,
}

/// Standard prompt for scalar and analog stick features
///
/// Scalars need one input, analog sticks one per direction. With a timeout set,
/// a step that receives no input in time is skipped.
#[derive(Debug)]
pub struct FeatureButton {
    feature: FeatureDescriptor,
    timeout: Option<Duration>,
    progress: Mutex<ButtonProgress>,
}

impl FeatureButton {
    pub fn new(feature: FeatureDescriptor) -> Self {
        Self {
            feature,
            timeout: None,
            progress: Mutex::new(ButtonProgress::default()),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn steps(&self) -> usize {
        match self.feature.feature_type {
            FeatureType::AnalogStick => STICK_DIRECTIONS.len(),
            _ => 1,
        }
    }

    /// Number of times this button has prompted since it was created
    pub fn prompt_count(&self) -> usize {
        self.progress.lock().prompts
    }
}

#[async_trait]
impl FeaturePrompt for FeatureButton {
    fn feature(&self) -> &FeatureDescriptor {
        &self.feature
    }

    fn is_finished(&self) -> bool {
        self.progress.lock().finished
    }

    fn direction(&self) -> AnalogStickDirection {
        if self.feature.feature_type != FeatureType::AnalogStick {
            return AnalogStickDirection::Unknown;
        }
        let progress = self.progress.lock();
        STICK_DIRECTIONS
            .get(progress.step)
            .copied()
            .unwrap_or_default()
    }

    async fn prompt_for_input(&self, input: &InputSignal) -> bool {
        let direction = self.direction();
        self.progress.lock().prompts += 1;

        match direction {
            AnalogStickDirection::Unknown => info!("Press {}", self.feature.name),
            direction => info!("Move {} {:?}", self.feature.name, direction),
        }

        match self.timeout {
            Some(timeout) => {
                if tokio::time::timeout(timeout, input.wait()).await.is_err() {
                    debug!("No input for \"{}\", skipping", self.feature.name);
                }
            }
            None => input.wait().await,
        }

        let mut progress = self.progress.lock();
        progress.step += 1;
        progress.finished = progress.step >= self.steps();
        true
    }

    fn reset(&self) {
        let mut progress = self.progress.lock();
        progress.step = 0;
        progress.finished = false;
    }
}
