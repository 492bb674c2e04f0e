//! Configuration loading and parsing

use anyhow::{ensure, Context, Result};
use dtn_log_player::{PlayerConfig, StepDelay};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    pub log: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackConfig {
    #[serde(default)]
    pub step_delay: StepDelay,
    #[serde(default)]
    pub snapshot_interval: usize,
    /// Real-time speed factor, 2.0 plays twice as fast
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Fire every tick immediately instead of sleeping
    #[serde(default)]
    pub instant: bool,
}

fn default_speed() -> f64 {
    1.0
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            step_delay: StepDelay::default(),
            snapshot_interval: 0,
            speed: default_speed(),
            instant: false,
        }
    }
}

impl PlaybackConfig {
    pub fn player_config(&self) -> PlayerConfig {
        PlayerConfig::new()
            .with_step_delay(self.step_delay)
            .with_snapshot_interval(self.snapshot_interval)
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        let speed = self.playback.speed;
        ensure!(
            speed.is_finite() && speed > 0.0,
            "playback speed must be a positive number, got {}",
            speed
        );
        Ok(())
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .validate()
        .with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}
