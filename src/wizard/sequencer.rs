//! Wizard worker with statum state machine
//!
//! ```text
//! Armed ──► Prompting ──► Finalizing ──► (summary)
//!              │  ▲
//!              └──┘ one feature at a time, until done or cancelled
//! ```
//!
//! Cancellation is checked before each feature and after every wake-up. The
//! prompt wait races the cancellation token, so an abort never has to wait for
//! a prompt to notice its wake-up.

use crate::input::primitive::AnalogStickDirection;
use crate::wizard::feature::FeaturePrompt;
use crate::wizard::hooks::HookGuard;
use crate::wizard::status::{RunSummary, WizardStatus};
use crate::wizard::WizardShared;
use chrono::{DateTime, Local};
use statum::{machine, state};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[state]
#[derive(Debug, Clone)]
pub(crate) enum RunPhase {
    Armed,      // Parameters loaded, hooks not yet installed
    Prompting,  // Hooks installed, walking the feature list
    Finalizing, // Saving maps, letting axes settle, releasing hooks
}

/// How prompting for a single feature ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeatureOutcome {
    Finished,
    /// The prompt could not proceed; only this feature is given up
    Failed,
    Stopped,
}

#[machine]
pub(crate) struct WizardRun<S: RunPhase> {
    shared: Arc<WizardShared>,
    token: CancellationToken,
    controller_id: String,
    features: Vec<Arc<dyn FeaturePrompt>>,
    hooks: Option<HookGuard>,
    started_at: DateTime<Local>,
    features_completed: usize,
}

impl WizardRun<Armed> {
    pub(crate) fn create(shared: Arc<WizardShared>, token: CancellationToken) -> Self {
        let (controller_id, features) = shared.session.run_parameters();
        debug!(
            "Preparing wizard run for {} with {} features",
            controller_id,
            features.len()
        );

        Self::new(
            shared,
            token,
            controller_id,
            features,
            None,         // hooks
            Local::now(), // started_at
            0,            // features_completed
        )
    }

    pub(crate) fn install_hooks(mut self) -> WizardRun<Prompting> {
        info!("Starting configuration wizard for {}", self.controller_id);
        self.hooks = Some(HookGuard::install(&self.shared));
        self.transition()
    }
}

impl WizardRun<Prompting> {
    pub(crate) async fn prompt_features(mut self) -> WizardRun<Finalizing> {
        let features = self.features.clone();

        for feature in features {
            if self.token.is_cancelled() {
                break;
            }

            // Allow the input thread to see which feature is being mapped
            self.shared.session.set_current(feature.clone());

            let outcome = self.prompt_feature(&feature).await;
            feature.reset();

            match outcome {
                FeatureOutcome::Finished => self.features_completed += 1,
                FeatureOutcome::Failed => {}
                FeatureOutcome::Stopped => break,
            }
        }

        self.transition()
    }

    async fn prompt_feature(&self, feature: &Arc<dyn FeaturePrompt>) -> FeatureOutcome {
        let input = self.shared.session.input_signal();
        let name = feature.feature().name.clone();

        while !feature.is_finished() {
            let direction = feature.direction();
            self.shared.session.set_direction(direction);
            self.publish_prompt(&name, direction);

            debug!(
                "{}: Waiting for input for feature \"{}\"",
                self.controller_id, name
            );

            let prompted = tokio::select! {
                biased;
                _ = self.token.cancelled() => true,
                prompted = feature.prompt_for_input(&input) => prompted,
            };

            if self.token.is_cancelled() {
                return FeatureOutcome::Stopped;
            }

            if !prompted {
                warn!(
                    "{}: prompting for \"{}\" failed, skipping feature",
                    self.controller_id, name
                );
                return FeatureOutcome::Failed;
            }
        }

        FeatureOutcome::Finished
    }

    fn publish_prompt(&self, feature: &str, direction: AnalogStickDirection) {
        self.shared.publish_status(WizardStatus::Prompting {
            controller_id: self.controller_id.clone(),
            feature: feature.to_string(),
            direction,
        });
    }
}

impl WizardRun<Finalizing> {
    /// Persists touched maps, waits for axes to settle and releases the hooks
    pub(crate) async fn finish(mut self) -> RunSummary {
        let finished = self.shared.session.finish();

        for button_map in &finished.touched {
            info!("Saving button map for {}", button_map.device_name());
            button_map.save_button_map();
        }

        if self.shared.motion.is_in_motion() {
            let timeout = self.shared.settings.settle_timeout();
            debug!(
                "Configuration wizard: waiting {}ms for axes to neutralize",
                timeout.as_millis()
            );
            self.shared.publish_status(WizardStatus::Settling);

            if !self.shared.motion.wait_settled(timeout, &self.token).await {
                debug!("Axes did not settle before the wizard ended");
            }
        }

        drop(self.hooks.take());

        let summary = RunSummary {
            controller_id: self.controller_id.clone(),
            started_at: self.started_at,
            finished_at: Local::now(),
            features_completed: self.features_completed,
            primitives_claimed: finished.claimed,
            button_maps_saved: finished.touched.len(),
            aborted: self.token.is_cancelled(),
        };

        info!(
            "Configuration wizard ended for {} ({} of {} features, aborted: {})",
            summary.controller_id,
            summary.features_completed,
            self.features.len(),
            summary.aborted
        );
        self.shared
            .publish_status(WizardStatus::Finished(summary.clone()));
        summary
    }
}

/// Drives a run from start to finish
pub(crate) async fn execute(run: WizardRun<Armed>) -> RunSummary {
    run.install_hooks().prompt_features().await.finish().await
}
