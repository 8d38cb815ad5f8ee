//! State of one wizard run, shared between the worker and the input thread
//!
//! Every accessor takes the session lock for exactly its own critical section.
//! No accessor calls into a prompt or a button map while the lock is held.

use crate::input::button_map::{ButtonMap, ButtonMapId};
use crate::input::primitive::{AnalogStickDirection, DriverPrimitive};
use crate::wizard::feature::{same_prompt, FeaturePrompt, InputSignal};
use parking_lot::Mutex;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// What the input thread needs to know to record a primitive
pub(crate) struct RunSnapshot {
    pub controller_id: String,
    pub feature: Arc<dyn FeaturePrompt>,
    pub direction: AnalogStickDirection,
    pub input: Arc<InputSignal>,
}

/// A primitive reserved by [`SessionState::try_claim`]
///
/// Only valid for the run it was taken in; releasing it after the run ended is
/// a no-op.
pub(crate) struct Claim {
    primitive: DriverPrimitive,
    map_id: ButtonMapId,
    generation: u64,
}

struct TouchedMap {
    map: Arc<dyn ButtonMap>,
    claims: usize,
}

/// Leftovers of a finished run that must be handled outside the lock
pub(crate) struct FinishedSession {
    pub touched: Vec<Arc<dyn ButtonMap>>,
    pub claimed: usize,
}

#[derive(Default)]
struct Session {
    controller_id: String,
    features: Vec<Arc<dyn FeaturePrompt>>,
    current: Option<Arc<dyn FeaturePrompt>>,
    direction: AnalogStickDirection,
    history: HashSet<DriverPrimitive>,
    touched: BTreeMap<ButtonMapId, TouchedMap>,
    input: Arc<InputSignal>,
    generation: u64,
}

impl Session {
    fn clear_progress(&mut self) {
        self.current = None;
        self.direction = AnalogStickDirection::Unknown;
        self.history.clear();
        self.touched.clear();
        self.generation = self.generation.wrapping_add(1);
    }
}

#[derive(Default)]
pub(crate) struct SessionState {
    inner: Mutex<Session>,
}

impl SessionState {
    /// Resets the session and stores the parameters of a new run
    pub fn begin(&self, controller_id: String, features: Vec<Arc<dyn FeaturePrompt>>) {
        let mut session = self.inner.lock();
        session.clear_progress();
        session.controller_id = controller_id;
        session.features = features;
        session.input = Arc::new(InputSignal::new());
    }

    pub fn run_parameters(&self) -> (String, Vec<Arc<dyn FeaturePrompt>>) {
        let session = self.inner.lock();
        (session.controller_id.clone(), session.features.clone())
    }

    pub fn input_signal(&self) -> Arc<InputSignal> {
        self.inner.lock().input.clone()
    }

    /// Makes `feature` the current one with no direction selected yet
    pub fn set_current(&self, feature: Arc<dyn FeaturePrompt>) {
        let mut session = self.inner.lock();
        session.current = Some(feature);
        session.direction = AnalogStickDirection::Unknown;
    }

    pub fn set_direction(&self, direction: AnalogStickDirection) {
        self.inner.lock().direction = direction;
    }

    pub fn is_current(&self, feature: &Arc<dyn FeaturePrompt>) -> bool {
        self.inner
            .lock()
            .current
            .as_ref()
            .is_some_and(|current| same_prompt(current, feature))
    }

    pub fn snapshot(&self) -> Option<RunSnapshot> {
        let session = self.inner.lock();
        let feature = session.current.clone()?;
        Some(RunSnapshot {
            controller_id: session.controller_id.clone(),
            feature,
            direction: session.direction,
            input: session.input.clone(),
        })
    }

    /// Reserves `primitive` for this run and marks `button_map` as touched
    ///
    /// Returns `None` if the primitive is already claimed. Check and insert
    /// happen under one lock, so concurrent deliveries of the same primitive
    /// yield exactly one claim.
    pub fn try_claim(
        &self,
        primitive: DriverPrimitive,
        button_map: &Arc<dyn ButtonMap>,
    ) -> Option<Claim> {
        let mut session = self.inner.lock();
        if !session.history.insert(primitive) {
            return None;
        }

        let map_id = button_map.id();
        session
            .touched
            .entry(map_id.clone())
            .or_insert_with(|| TouchedMap {
                map: button_map.clone(),
                claims: 0,
            })
            .claims += 1;

        Some(Claim {
            primitive,
            map_id,
            generation: session.generation,
        })
    }

    /// Gives back a claim whose primitive was not recorded
    pub fn release(&self, claim: Claim) {
        let mut session = self.inner.lock();
        if session.generation != claim.generation {
            return;
        }

        session.history.remove(&claim.primitive);
        if let Entry::Occupied(mut entry) = session.touched.entry(claim.map_id) {
            entry.get_mut().claims -= 1;
            if entry.get().claims == 0 {
                entry.remove();
            }
        }
    }

    /// Returns the session to idle and hands back what still needs saving
    pub fn finish(&self) -> FinishedSession {
        let mut session = self.inner.lock();
        let touched = std::mem::take(&mut session.touched)
            .into_values()
            .map(|touched| touched.map)
            .collect();
        let claimed = session.history.len();
        session.clear_progress();
        session.features.clear();
        FinishedSession { touched, claimed }
    }
}
