//! Engine configuration.
//!
//! Groups the generator, agent and simulation settings into one TOML file.
//! Missing fields fall back to their defaults, so a partial file is valid.

use std::fs;
use std::path::Path;

use delve_common::{DelveError, DelveResult};
use delve_gameplay::AgentConfig;
use delve_world::GeneratorConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "delve.toml";

/// Headless simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Level difficulty to generate
    pub difficulty: u32,
    /// Frames to simulate
    pub frames: u32,
    /// Simulated frames per second
    pub fps: u32,
    /// Speed of the scripted target in world units per second
    pub target_speed: f32,
    /// Seconds between target heading changes
    pub target_turn_interval: f32,
    /// Half edge of agent and target bodies
    pub body_half_extent: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            difficulty: 0,
            frames: 1800,
            fps: 60,
            target_speed: 90.0,
            target_turn_interval: 2.0,
            body_half_extent: 4.0,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Level generation
    pub generator: GeneratorConfig,
    /// Agent behaviour
    pub agent: AgentConfig,
    /// Headless run
    pub sim: SimConfig,
}

impl EngineConfig {
    /// Load configuration from a path.
    /// Returns the default config if the file is missing or invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };
        match toml::from_str(&contents) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a path, creating parent directories.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> DelveResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents =
            toml::to_string_pretty(self).map_err(|e| DelveError::Config(e.to_string()))?;
        fs::write(path, contents)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp every section.
    pub fn validate(&mut self) {
        self.generator.validate();
        self.agent.validate();

        let defaults = SimConfig::default();
        let sim = &mut self.sim;
        sim.fps = sim.fps.clamp(1, 240);
        sim.difficulty = sim.difficulty.min(64);
        if !(sim.target_speed.is_finite() && sim.target_speed >= 0.0) {
            sim.target_speed = defaults.target_speed;
        }
        if !(sim.target_turn_interval.is_finite() && sim.target_turn_interval > 0.0) {
            sim.target_turn_interval = defaults.target_turn_interval;
        }
        if !sim.body_half_extent.is_finite() {
            sim.body_half_extent = defaults.body_half_extent;
        }
        // Bodies must fit through a one-tile corridor.
        let max_half = self.generator.tile_size / 2.0 - 0.5;
        sim.body_half_extent = sim.body_half_extent.clamp(0.5, max_half.max(0.5));
    }
}
