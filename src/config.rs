use crate::error::{Result, WizardError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Button index of the escape key as reported by keyboard-backed drivers
pub const DEFAULT_CANCEL_KEY_CODE: u32 = 27;

/// Time to wait for axes to neutralize after mapping is finished
pub const DEFAULT_SETTLE_TIMEOUT_MS: u64 = 5_000;

/// Settings for the configuration wizard and its gilrs adapter
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct WizardSettings {
    /// When set, the keyboard drives an emulated controller and must not abort a run
    pub emulation: bool,

    /// Button index that cancels the running wizard
    pub cancel_key_code: u32,

    /// Upper bound for the post-mapping settle wait
    pub settle_timeout_ms: u64,

    /// Controller slot, only used for logging
    pub controller_number: u32,

    /// Axis values below this magnitude count as resting
    pub axis_deadzone: f32,

    /// Axis magnitude needed before a semiaxis is offered to the wizard
    pub axis_activation: f32,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            emulation: false,
            cancel_key_code: DEFAULT_CANCEL_KEY_CODE,
            settle_timeout_ms: DEFAULT_SETTLE_TIMEOUT_MS,
            controller_number: 0,
            axis_deadzone: 0.05,
            axis_activation: 0.5,
        }
    }
}

impl WizardSettings {
    /// Default settings file: `<config_dir>/opencontroller/wizard.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("opencontroller").join("wizard.toml"))
    }

    /// Loads settings from a TOML file, falling back to defaults when the file is absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(
                "No wizard settings at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            WizardError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        debug!("Loaded wizard settings from {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)
            .map_err(|e| WizardError::ConfigError(format!("Failed to parse settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| WizardError::ConfigError(format!("Failed to serialize settings: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.settle_timeout_ms == 0 {
            return Err(WizardError::ConfigError(
                "settle_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.axis_deadzone) {
            return Err(WizardError::ConfigError(format!(
                "axis_deadzone {} is outside 0.0..1.0",
                self.axis_deadzone
            )));
        }
        if !(0.0..1.0).contains(&self.axis_activation) || self.axis_activation <= self.axis_deadzone
        {
            return Err(WizardError::ConfigError(format!(
                "axis_activation {} must be inside 0.0..1.0 and above the deadzone {}",
                self.axis_activation, self.axis_deadzone
            )));
        }
        Ok(())
    }

    pub fn settle_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.settle_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults_for_missing_keys() {
        let settings = WizardSettings::from_toml_str("emulation = true\nsettle_timeout_ms = 250\n")
            .unwrap();

        assert!(settings.emulation);
        assert_eq!(settings.settle_timeout_ms, 250);
        assert_eq!(settings.cancel_key_code, DEFAULT_CANCEL_KEY_CODE);
        assert_eq!(settings.axis_activation, 0.5);
    }

    #[test]
    fn zero_settle_timeout_is_rejected() {
        let err = WizardSettings::from_toml_str("settle_timeout_ms = 0").unwrap_err();
        assert!(matches!(err, WizardError::ConfigError(_)));
    }

    #[test]
    fn activation_must_exceed_deadzone() {
        let err = WizardSettings::from_toml_str("axis_deadzone = 0.4\naxis_activation = 0.3")
            .unwrap_err();
        assert!(matches!(err, WizardError::ConfigError(_)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = WizardSettings::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, WizardSettings::default());
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wizard.toml");
        let settings = WizardSettings {
            emulation: true,
            cancel_key_code: 9,
            ..WizardSettings::default()
        };
        fs::write(&path, settings.to_toml_string().unwrap()).unwrap();

        assert_eq!(WizardSettings::load(&path).unwrap(), settings);
    }
}
