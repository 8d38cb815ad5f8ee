//! Tracks which button maps report analog motion
//!
//! The motion set has its own lock so that frame callbacks, which arrive at
//! driver rate, never wait behind the session lock. The settle flag is only
//! written while the motion lock is held and is true exactly when the set is
//! empty.

use crate::input::button_map::ButtonMapId;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub(crate) struct MotionTracker {
    moving: Mutex<HashSet<ButtonMapId>>,
    settled: watch::Sender<bool>,
}

impl Default for MotionTracker {
    fn default() -> Self {
        Self {
            moving: Mutex::new(HashSet::new()),
            settled: watch::channel(true).0,
        }
    }
}

impl MotionTracker {
    pub fn reset(&self) {
        let mut moving = self.moving.lock();
        moving.clear();
        self.settled.send_replace(true);
    }

    pub fn on_event_frame(&self, button_map: &ButtonMapId, motion: bool) {
        let mut moving = self.moving.lock();
        if !motion && moving.contains(button_map) {
            self.mark_motionless(&mut moving, button_map);
        }
    }

    pub fn on_motion(&self, button_map: ButtonMapId) {
        let mut moving = self.moving.lock();
        self.settled.send_replace(false);
        moving.insert(button_map);
    }

    pub fn on_motionless(&self, button_map: &ButtonMapId) {
        let mut moving = self.moving.lock();
        self.mark_motionless(&mut moving, button_map);
    }

    fn mark_motionless(&self, moving: &mut HashSet<ButtonMapId>, button_map: &ButtonMapId) {
        moving.remove(button_map);
        debug!("{} is motionless ({} still moving)", button_map, moving.len());
        if moving.is_empty() {
            self.settled.send_replace(true);
        }
    }

    pub fn is_in_motion(&self) -> bool {
        !self.moving.lock().is_empty()
    }

    /// Waits until every tracked map is motionless, the timeout passes or the token fires
    ///
    /// Returns true only if the axes actually settled.
    pub async fn wait_settled(&self, timeout: Duration, token: &CancellationToken) -> bool {
        let mut settled = self.settled.subscribe();
        let wait = async { settled.wait_for(|settled| *settled).await.is_ok() };

        tokio::select! {
            result = tokio::time::timeout(timeout, wait) => result.unwrap_or(false),
            _ = token.cancelled() => false,
        }
    }
}
