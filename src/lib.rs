//! Controller configuration wizard
//!
//! Learns how a game controller's raw inputs map onto logical controller
//! features by prompting the user for one feature at a time.
//!
//! - [`wizard`] - the wizard, its worker and its input hooks
//! - [`input`] - driver primitives, button maps and input dispatch
//! - [`config`] - wizard settings

pub mod config;
pub mod error;
pub mod input;
pub mod wizard;

pub use config::WizardSettings;
pub use error::WizardError;
pub use wizard::{ConfigurationWizard, WizardStatus};
