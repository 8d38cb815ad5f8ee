//! Error types for the configuration wizard
//!
//! Wizard runs never fail towards the caller: a broken prompt, a vanished device
//! or a cancel request all end in the same teardown. The errors below cover the
//! surface around a run: loading settings, creating the gilrs context and
//! spawning its feeder thread.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WizardError {
    /// Settings could not be read, parsed or validated
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The gilrs feeder thread could not be started
    #[error("Thread error: {0}")]
    ThreadError(String),

    /// The gilrs context could not be created
    #[error("Gamepad backend error: {0}")]
    BackendError(String),
}

pub type Result<T> = std::result::Result<T, WizardError>;
