use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::{error, info};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const ENV_PREFIX: &str = "GRIDSIM";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Settings for the headless runner.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimConfig {
    pub grid: GridConfig,
    #[serde(default)]
    pub sim: SimSettings,
    #[serde(default)]
    pub map: MapConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// Wall-clock time between ticks.
    pub tick_ms: u64,
    /// Stop after this many ticks; run until the player dies if unset.
    pub max_ticks: Option<u64>,
    /// Seed for the runner's RNG; drawn from the OS if unset.
    pub seed: Option<u64>,
}

impl Default for SimSettings {
    fn default() -> Self {
        SimSettings {
            tick_ms: 100,
            max_ticks: None,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Obstacle bitmap to load walls from.
    pub layout: Option<PathBuf>,
    /// Give each wall a random quarter-turn orientation.
    pub random_rotation: bool,
}

impl SimConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.width == 0 || self.grid.height == 0 {
            return Err(ConfigError::Invalid("grid width and height must be non-zero"));
        }
        if self.sim.tick_ms == 0 {
            return Err(ConfigError::Invalid("sim.tick_ms must be non-zero"));
        }
        if self.sim.max_ticks == Some(0) {
            return Err(ConfigError::Invalid("sim.max_ticks must be non-zero when set"));
        }
        Ok(())
    }
}

fn finish(settings: Result<Config, config::ConfigError>) -> Result<SimConfig, ConfigError> {
    let settings = settings.inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    let config: SimConfig = settings.try_deserialize()?;
    config.validate()?;
    info!("Successfully loaded configuration: {:?}", config);
    Ok(config)
}

/// Loads the TOML file at `path` (or [`DEFAULT_CONFIG_PATH`]), then applies
/// `GRIDSIM_<SECTION>__<KEY>` environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<SimConfig, ConfigError> {
    let path = path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH));
    info!("Attempting to load configuration from {}", path.display());

    let settings = Config::builder()
        .add_source(File::new(&path.to_string_lossy(), FileFormat::Toml).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build();
    finish(settings)
}

/// Parses configuration from TOML text, without environment overrides.
pub fn parse_config(text: &str) -> Result<SimConfig, ConfigError> {
    let settings = Config::builder()
        .add_source(File::from_str(text, FileFormat::Toml))
        .build();
    finish(settings)
}
