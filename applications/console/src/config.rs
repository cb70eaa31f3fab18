/// Console player configuration
use crate::error::{ConsoleError, Result};
use podplay_playback::PlayerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "podplay.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub player: PlayerConfig,

    #[serde(default = "default_engine")]
    pub engine: EngineSettings,
}

/// Behaviour of the simulated media engine
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineSettings {
    #[serde(default = "default_episode_duration_seconds")]
    pub episode_duration_seconds: f64,

    #[serde(default = "default_load_latency_ms")]
    pub load_latency_ms: u64,
}

impl EngineSettings {
    pub fn load_latency(&self) -> Duration {
        Duration::from_millis(self.load_latency_ms)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        default_engine()
    }
}

impl ConsoleConfig {
    /// Load configuration from file and environment
    ///
    /// With no explicit path, `podplay.toml` in the working directory is used
    /// if it exists. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        // Override with environment variables (e.g. PODPLAY_PLAYER__POLL_INTERVAL_MS)
        settings = settings.add_source(
            config::Environment::with_prefix("PODPLAY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ConsoleError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ConsoleError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.player
            .validate()
            .map_err(|e| ConsoleError::Config(e.to_string()))?;

        let duration = self.engine.episode_duration_seconds;
        if !(duration.is_finite() && duration > 0.0) {
            return Err(ConsoleError::Config(format!(
                "engine.episode_duration_seconds must be positive, got {duration}"
            )));
        }

        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConsoleError::Config(e.to_string()))
    }
}

// Default values
fn default_engine() -> EngineSettings {
    EngineSettings {
        episode_duration_seconds: default_episode_duration_seconds(),
        load_latency_ms: default_load_latency_ms(),
    }
}

fn default_episode_duration_seconds() -> f64 {
    1800.0
}

fn default_load_latency_ms() -> u64 {
    250
}
