//! Simulation configuration.
//!
//! All values have sensible defaults; a JSON file can override any subset of
//! them:
//!
//! ```json
//! {
//!   "world": { "max_timestep": 0.004166667 },
//!   "parameters": { "friction": 0.35, "spawn_cap": 200 },
//!   "seed": 42
//! }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use bevy::log::{info, warn};
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::params::SimulationParameters;

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "COIN_PUSHER_CONFIG";

/// Config file used when the environment variable is not set.
pub const DEFAULT_CONFIG_PATH: &str = "config/pusher.json";

/// Physics world settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Gravity vector (m/s^2)
    pub gravity: [f32; 3],
    /// Longest single physics substep (s)
    pub max_timestep: f32,
    /// Frame time is clamped to this before being subdivided (s)
    pub max_frame_time: f32,
    /// Linear velocity below which coins may fall asleep
    pub linear_sleep_threshold: f32,
    /// Angular velocity below which coins may fall asleep
    pub angular_sleep_threshold: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.81, 0.0],
            // 240Hz keeps thin coins from tunnelling
            max_timestep: 1.0 / 240.0,
            max_frame_time: 0.25,
            linear_sleep_threshold: 0.001,
            angular_sleep_threshold: 0.001,
        }
    }
}

/// Tray and wall geometry (m).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrayConfig {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    pub wall_height: f32,
    pub wall_thickness: f32,
    /// Contact skin of the tray and wall colliders
    pub contact_skin: f32,
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            width: 0.2,
            height: 0.03,
            depth: 0.2,
            wall_height: 0.05,
            wall_thickness: 0.01,
            contact_skin: 0.001,
        }
    }
}

/// Coin spawn and lifetime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinConfig {
    /// Spawn height above the origin (m)
    pub drop_height: f32,
    /// Fraction of the tray footprint coins may spawn over
    pub spawn_area_fraction: f32,
    /// Coins below this height are removed (m)
    pub exit_height: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Contact skin of coin colliders
    pub contact_skin: f32,
    /// Largest random tilt of a new coin's axis (degrees)
    pub max_spawn_tilt_degrees: f32,
}

impl Default for CoinConfig {
    fn default() -> Self {
        Self {
            drop_height: 0.15,
            spawn_area_fraction: 0.8,
            exit_height: -1.0,
            linear_damping: 0.95,
            angular_damping: 0.99,
            contact_skin: 0.002,
            max_spawn_tilt_degrees: 10.0,
        }
    }
}

/// Top-level configuration for the coin pusher.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PusherConfig {
    pub world: WorldConfig,
    pub tray: TrayConfig,
    pub coins: CoinConfig,
    /// Initial parameter values, also restored by "reset parameters"
    pub parameters: SimulationParameters,
    /// Seed for spawn randomness; entropy when absent
    pub seed: Option<u64>,
}

impl PusherConfig {
    /// Load a configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Load a configuration, falling back to defaults when the file is
    /// missing or malformed.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load(path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Path named by [`CONFIG_ENV_VAR`], or [`DEFAULT_CONFIG_PATH`].
    pub fn path_from_env() -> String {
        std::env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        let config = PusherConfig::default();
        assert_eq!(config.world.gravity, [0.0, -9.81, 0.0]);
        assert_eq!(config.world.max_timestep, 1.0 / 240.0);
        assert_eq!(config.tray.width, 0.2);
        assert_eq!(config.tray.wall_height, 0.05);
        assert_eq!(config.coins.drop_height, 0.15);
        assert_eq!(config.coins.exit_height, -1.0);
        assert_eq!(config.parameters.spawn_interval_ms, 50);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "parameters": {{ "friction": 0.35, "spawn_cap": 12 }}, "seed": 9 }}"#
        )
        .unwrap();

        let config = PusherConfig::load(file.path()).unwrap();
        assert_eq!(config.parameters.friction, 0.35);
        assert_eq!(config.parameters.spawn_cap, 12);
        assert_eq!(config.parameters.mass, 4.0, "unset fields keep defaults");
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.tray, TrayConfig::default());
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        assert!(matches!(
            PusherConfig::load(file.path()),
            Err(ConfigError::Json(_))
        ));
        assert_eq!(
            PusherConfig::load_or_default(file.path()),
            PusherConfig::default()
        );
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(PusherConfig::load(&path), Err(ConfigError::Io(_))));
        assert_eq!(PusherConfig::load_or_default(&path), PusherConfig::default());
    }
}
