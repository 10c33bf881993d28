/// Simulator configuration
use crate::error::{Result, SimError};
use crate::script::{self, Step};
use feed_audio::CoordinatorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "feed-sim.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimConfig {
    #[serde(default)]
    pub coordinator: CoordinatorConfig,

    #[serde(default = "default_simulation")]
    pub simulation: SimulationSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationSettings {
    /// Feed items mounted before the script runs (`item-0` .. `item-N`)
    #[serde(default = "default_items")]
    pub items: usize,

    /// Scroll script, one step per entry
    #[serde(default = "default_script")]
    pub script: Vec<String>,

    /// Random focus/toggle steps appended after the script
    #[serde(default)]
    pub random_steps: usize,

    /// How long each simulated mute/pause takes to resolve
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,

    /// Probability in `[0, 1]` that a simulated control call rejects
    #[serde(default)]
    pub failure_rate: f64,

    /// Seed for failure injection and random steps
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// JSON settings file; in-memory settings when unset
    #[serde(default)]
    pub settings_path: Option<PathBuf>,
}

impl SimConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `feed-sim.toml` in the
    /// working directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (FEEDSIM_SIMULATION__ITEMS=12)
        settings = settings.add_source(
            config::Environment::with_prefix("FEEDSIM")
                .prefix_separator("_")
                .separator("__")
                .list_separator(";")
                .with_list_parse_key("simulation.script")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| SimError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| SimError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.coordinator.validate()?;

        let rate = self.simulation.failure_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(SimError::Config(format!(
                "failure_rate must be within [0, 1], got {rate}"
            )));
        }

        self.steps().map(|_| ())
    }

    /// Parse the configured script
    pub fn steps(&self) -> Result<Vec<Step>> {
        script::parse_script(self.simulation.script.as_slice())
    }
}

// Default values
fn default_simulation() -> SimulationSettings {
    SimulationSettings {
        items: default_items(),
        script: default_script(),
        random_steps: 0,
        latency_ms: default_latency_ms(),
        failure_rate: 0.0,
        seed: default_seed(),
        settings_path: None,
    }
}

fn default_items() -> usize {
    5
}

fn default_script() -> Vec<String> {
    [
        "focus 0",
        "audio on",
        "focus 1",
        "focus 2",
        "fullscreen enter",
        "mount viewer overlay",
        "focus viewer",
        "fullscreen exit",
        "unmount viewer",
        "focus 2",
        "audio toggle",
        "settle",
    ]
    .iter()
    .map(|step| (*step).to_string())
    .collect()
}

fn default_latency_ms() -> u64 {
    20
}

fn default_seed() -> u64 {
    7
}

impl Default for SimulationSettings {
    fn default() -> Self {
        default_simulation()
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            coordinator: CoordinatorConfig::default(),
            simulation: default_simulation(),
        }
    }
}
