/// TOML configuration with sensible defaults.
/// No config file is required to run; defaults work out of the box.

use serde::Deserialize;
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `<name>.json` profiles
    pub profiles_dir: PathBuf,
    /// Plain-text file naming the profile loaded at startup
    pub default_profile_file: PathBuf,
    /// Effect scheduler cadence
    pub tick_ms: u64,
    pub sensor_interval_ms: u64,
    /// Start with temperature linking on
    pub temperature_linking: bool,
    /// Reject unknown effect names instead of falling back to Static
    pub strict_effect_names: bool,
    pub devices: DeviceConfig,
    pub sensors: SensorConfig,
}

/// Which simulated backends to load.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub demo: bool,
    pub aura: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Skip host sensors and use the random walk only
    pub simulate_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profiles_dir: PathBuf::from("profiles"),
            default_profile_file: PathBuf::from("config").join("default_profile.txt"),
            tick_ms: 10,
            sensor_interval_ms: 1000,
            temperature_linking: false,
            strict_effect_names: false,
            devices: DeviceConfig::default(),
            sensors: SensorConfig::default(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self { demo: true, aura: true }
    }
}

impl Config {
    /// Load config from the default config file path, or return defaults if not found.
    pub fn load() -> Self {
        let config_path = config_file_path(|key| std::env::var(key).ok());
        let shown = config_path.display();
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {shown}");
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse config file {shown}: {e}. Using defaults.");
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No config file found at {shown}. Using defaults.");
                Self::default()
            }
        }
    }
}

/// `$LUMINCTL_CONFIG`, then the XDG config dir, then `%APPDATA%`, then the
/// working directory.
fn config_file_path(env: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(path) = env("LUMINCTL_CONFIG") {
        PathBuf::from(path)
    } else if let Some(xdg) = env("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("luminctl").join("config.toml")
    } else if let Some(appdata) = env("APPDATA") {
        PathBuf::from(format!("{appdata}\\luminctl\\config.toml"))
    } else {
        PathBuf::from("luminctl.toml")
    }
}
