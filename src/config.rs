//! Construction-time knobs shared by the scenario loader and the orchestrators.

use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

fn default_intergroup_rate() -> f64 {
    0.0005
}

fn default_intercity_rate() -> f64 {
    0.0001
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Within-city migration switch and per-tick probability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntergroupSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_intergroup_rate")]
    pub intergroup_rate: f64,
}

impl Default for IntergroupSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            intergroup_rate: default_intergroup_rate(),
        }
    }
}

/// Between-city migration switch and per-tick probability scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntercitySettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_intercity_rate")]
    pub intercity_rate: f64,
}

impl Default for IntercitySettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            intercity_rate: default_intercity_rate(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CityConfig {
    #[serde(default)]
    pub migration: IntergroupSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvinceConfig {
    #[serde(default)]
    pub migration: IntercitySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
