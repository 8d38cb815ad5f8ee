use crate::input::primitive::AnalogStickDirection;
use chrono::{DateTime, Local};

/// Outcome of a finished wizard run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub controller_id: String,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    /// Features that reported themselves finished
    pub features_completed: usize,
    /// Distinct primitives recorded during the run
    pub primitives_claimed: usize,
    /// Button maps asked to persist themselves
    pub button_maps_saved: usize,
    pub aborted: bool,
}

impl RunSummary {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Progress of the wizard, published through a watch channel
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WizardStatus {
    #[default]
    Idle,
    Prompting {
        controller_id: String,
        feature: String,
        direction: AnalogStickDirection,
    },
    Settling,
    Finished(RunSummary),
}

impl WizardStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, WizardStatus::Finished(_))
    }
}
