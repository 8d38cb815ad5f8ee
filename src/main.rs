use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use gilrs::GamepadId;
use opencontroller_wizard::input::gilrs_adapter::{ButtonMapFactory, GilrsFeeder};
use opencontroller_wizard::input::{
    AnalogStickDirection, ButtonMap, ButtonMapId, DriverPrimitive, InputRouter,
};
use opencontroller_wizard::wizard::{FeatureButton, FeatureDescriptor, FeaturePrompt};
use opencontroller_wizard::{ConfigurationWizard, WizardSettings, WizardStatus};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "opencontroller-wizard", about = "Map a gamepad's inputs to controller features")]
struct Args {
    /// Settings file, defaults to <config_dir>/opencontroller/wizard.toml
    config: Option<PathBuf>,

    /// Controller profile being mapped
    #[arg(long, default_value = "game.controller.default")]
    controller: String,

    /// Seconds to wait for each input before skipping it, 0 waits forever
    #[arg(long, default_value_t = 10)]
    prompt_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;
    let args = Args::parse();

    let settings = match args.config.clone().or_else(WizardSettings::default_path) {
        Some(path) => WizardSettings::load(&path)?,
        None => {
            warn!("No configuration directory available, using default settings");
            WizardSettings::default()
        }
    };
    info!("Wizard settings: {:?}", settings);

    let router = Arc::new(InputRouter::new());
    let feeder_token = CancellationToken::new();
    let feeder = GilrsFeeder::create(router.clone(), settings.clone(), memory_map_factory())
        .map_err(|e| eyre!("Failed to start gamepad backend: {}", e))?;
    let feeder_thread = feeder.spawn(feeder_token.clone())?;

    let wizard = ConfigurationWizard::new(settings, router.clone());
    let _status_handle = tokio::spawn(log_status(wizard.clone()));

    let timeout = (args.prompt_timeout > 0).then(|| Duration::from_secs(args.prompt_timeout));
    wizard
        .start_run(args.controller.clone(), standard_features(timeout))
        .await;

    tokio::select! {
        _ = wizard.wait_idle() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, aborting configuration");
            wizard.request_abort(true).await;
        }
    }

    feeder_token.cancel();
    tokio::task::spawn_blocking(move || feeder_thread.join())
        .await?
        .map_err(|_| eyre!("Gamepad feeder thread panicked"))?;

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

/// Features of a standard gamepad, in prompting order
fn standard_features(timeout: Option<Duration>) -> Vec<Arc<dyn FeaturePrompt>> {
    let scalars = [
        "a", "b", "x", "y", "start", "back", "leftbumper", "rightbumper", "lefttrigger",
        "righttrigger", "up", "down", "left", "right",
    ];
    let sticks = ["leftstick", "rightstick"];

    let descriptors = scalars
        .iter()
        .map(|name| FeatureDescriptor::scalar(*name))
        .chain(sticks.iter().map(|name| FeatureDescriptor::analog_stick(*name)));

    descriptors
        .map(|descriptor| {
            let button = FeatureButton::new(descriptor);
            let button = match timeout {
                Some(timeout) => button.with_timeout(timeout),
                None => button,
            };
            Arc::new(button) as Arc<dyn FeaturePrompt>
        })
        .collect()
}

async fn log_status(wizard: ConfigurationWizard) {
    let mut status = wizard.subscribe();
    while status.changed().await.is_ok() {
        let current = status.borrow_and_update().clone();
        match current {
            WizardStatus::Settling => info!("Release all sticks and triggers"),
            WizardStatus::Finished(summary) => info!(
                "Mapped {} features with {} inputs in {}s",
                summary.features_completed,
                summary.primitives_claimed,
                summary.duration().num_seconds()
            ),
            _ => {}
        }
    }
    error!("Wizard status channel closed");
}

/// Button map that keeps its entries in memory and prints them when saved
struct MemoryButtonMap {
    id: ButtonMapId,
    device_name: String,
    entries: Mutex<BTreeMap<String, Vec<String>>>,
}

impl ButtonMap for MemoryButtonMap {
    fn id(&self) -> ButtonMapId {
        self.id.clone()
    }

    fn device_name(&self) -> String {
        self.device_name.clone()
    }

    fn is_ignored(&self, _primitive: &DriverPrimitive) -> bool {
        false
    }

    fn add_scalar(&self, feature_name: &str, primitive: DriverPrimitive) {
        self.entries
            .lock()
            .insert(feature_name.to_string(), vec![primitive.to_string()]);
    }

    fn add_analog_stick(
        &self,
        feature_name: &str,
        direction: AnalogStickDirection,
        primitive: DriverPrimitive,
    ) {
        self.entries
            .lock()
            .entry(feature_name.to_string())
            .or_default()
            .push(format!("{:?}: {}", direction, primitive));
    }

    fn save_button_map(&self) {
        for (feature, primitives) in self.entries.lock().iter() {
            info!("{}: {} -> {}", self.device_name, feature, primitives.join(", "));
        }
    }
}

fn memory_map_factory() -> ButtonMapFactory {
    Box::new(|id: GamepadId, name: &str| {
        Arc::new(MemoryButtonMap {
            id: ButtonMapId(format!("{}-{}", name, id)),
            device_name: name.to_string(),
            entries: Mutex::new(BTreeMap::new()),
        }) as Arc<dyn ButtonMap>
    })
}
